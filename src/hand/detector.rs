use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::Deserialize;

use super::{HandError, LandmarkSet, Point, Result};
use crate::host::FrameFeedback;

/// One captured frame as seen by the host loop
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Landmarks of the first detected hand, `None` when no hand was found
    pub hand: Option<LandmarkSet>,
    /// Key pressed in the display window during this frame
    pub key: Option<char>,
}

/// Source of landmark frames (camera + landmark model + display window)
pub trait HandDetector {
    /// Block until the next frame is available. `Ok(None)` ends the stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Hand the rendered state back to the display
    fn present(&mut self, _feedback: &FrameFeedback) -> Result<()> {
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: Option<String>,
    #[serde(default = "full_score")]
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

fn full_score() -> f32 {
    1.0
}

#[derive(Deserialize, Debug)]
struct FrameJson {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Reads one JSON object per frame from any line-oriented source.
///
/// Expected line format:
/// `{"hands":[{"landmarks":[{"x":0.5,"y":0.4}, ...21],"handedness":"Right","score":0.9}],"key":"q"}`
pub struct JsonLineDetector<R: BufRead, W: Write> {
    reader: R,
    feedback: Option<W>,
    min_confidence: f32,
    line: String,
}

impl<R: BufRead> JsonLineDetector<R, std::io::Sink> {
    /// Detector without a feedback channel (file replay, stdin)
    pub fn read_only(reader: R) -> Self {
        JsonLineDetector::new(reader, None)
    }
}

impl<R: BufRead, W: Write> JsonLineDetector<R, W> {
    pub fn new(reader: R, feedback: Option<W>) -> Self {
        Self {
            reader,
            feedback,
            min_confidence: 0.7,
            line: String::new(),
        }
    }

    pub fn with_min_confidence(mut self, threshold: f32) -> Self {
        self.min_confidence = threshold.clamp(0.0, 1.0);
        self
    }

    fn parse_frame(&self, raw: &str) -> Result<Frame> {
        let parsed: FrameJson = serde_json::from_str(raw)
            .map_err(|e| HandError::Malformed(format!("{}: {}", e, raw)))?;

        if let Some(error) = parsed.error {
            log::warn!("Detector reported error: {}", error);
        }

        let mut hand = None;
        for candidate in parsed.hands {
            if candidate.score < self.min_confidence {
                continue;
            }
            let points: Vec<Point> = candidate.landmarks.iter().map(|lm| Point::new(lm.x, lm.y)).collect();
            match LandmarkSet::from_points(&points) {
                Ok(set) => {
                    log::debug!(
                        "Hand detected: {} (confidence={:.2})",
                        candidate.handedness.as_deref().unwrap_or("unknown"),
                        candidate.score
                    );
                    hand = Some(set);
                    break;
                }
                Err(e) => log::warn!("Skipping hand: {}", e),
            }
        }

        let key = parsed.key.and_then(|k| k.chars().next());
        Ok(Frame { hand, key })
    }
}

impl<R: BufRead, W: Write> HandDetector for JsonLineDetector<R, W> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let raw = self.line.trim();
            if raw.is_empty() {
                continue;
            }
            return self.parse_frame(raw).map(Some);
        }
    }

    fn present(&mut self, feedback: &FrameFeedback) -> Result<()> {
        if let Some(out) = self.feedback.as_mut() {
            let line = serde_json::to_string(feedback)?;
            writeln!(out, "{}", line)?;
            out.flush()?;
        }
        Ok(())
    }
}

/// Runs an external landmark program and talks JSON lines over its stdio.
///
/// The program writes one frame object per line on stdout and receives one feedback
/// object per frame on stdin.
pub struct SubprocessDetector {
    process: Child,
    inner: JsonLineDetector<BufReader<ChildStdout>, ChildStdin>,
}

impl SubprocessDetector {
    /// Spawn `command` through the platform shell
    pub fn spawn(command: &str, min_confidence: f32) -> Result<Self> {
        log::info!("Starting hand detector: {}", command);

        let mut process = shell(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| HandError::StartFailed(format!("{}: {}", command, e)))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| HandError::StartFailed("detector stdout unavailable".to_string()))?;
        let stdin = process.stdin.take();

        let inner = JsonLineDetector::new(BufReader::new(stdout), stdin).with_min_confidence(min_confidence);
        Ok(Self { process, inner })
    }
}

impl HandDetector for SubprocessDetector {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        self.inner.next_frame()
    }

    fn present(&mut self, feedback: &FrameFeedback) -> Result<()> {
        // A detector that already exited closes the pipe; frames stop on the read side.
        match self.inner.present(feedback) {
            Err(HandError::IoError(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    }
}

impl Drop for SubprocessDetector {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::FingerState;
    use crate::hand::LANDMARK_COUNT;
    use std::io::Cursor;

    fn hand_json(points: usize, score: f32) -> String {
        let pts: Vec<String> = (0..points).map(|i| format!("{{\"x\":0.5,\"y\":{}}}", i as f32 / 100.0)).collect();
        format!("{{\"landmarks\":[{}],\"handedness\":\"Right\",\"score\":{}}}", pts.join(","), score)
    }

    #[test]
    fn test_reads_frames_until_eof() {
        let input = format!(
            "{{\"hands\":[{}]}}\n\n{{\"hands\":[],\"key\":\"q\"}}\n",
            hand_json(LANDMARK_COUNT, 0.9)
        );
        let mut detector = JsonLineDetector::read_only(Cursor::new(input));

        let first = detector.next_frame().unwrap().unwrap();
        assert!(first.hand.is_some());
        assert_eq!(first.key, None);

        let second = detector.next_frame().unwrap().unwrap();
        assert!(second.hand.is_none());
        assert_eq!(second.key, Some('q'));

        assert!(detector.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_partial_and_low_confidence_hands_are_skipped() {
        let input = format!(
            "{{\"hands\":[{},{},{}]}}\n",
            hand_json(20, 0.95),
            hand_json(LANDMARK_COUNT, 0.2),
            hand_json(LANDMARK_COUNT, 0.8)
        );
        let mut detector = JsonLineDetector::read_only(Cursor::new(input));
        let frame = detector.next_frame().unwrap().unwrap();
        let hand = frame.hand.expect("third hand should be accepted");
        assert_eq!(hand.points().len(), LANDMARK_COUNT);

        let input = format!("{{\"hands\":[{}]}}\n", hand_json(LANDMARK_COUNT, 0.2));
        let mut detector = JsonLineDetector::read_only(Cursor::new(input)).with_min_confidence(0.1);
        assert!(detector.next_frame().unwrap().unwrap().hand.is_some());
    }

    #[test]
    fn test_present_writes_one_json_line() {
        let mut detector = JsonLineDetector::new(Cursor::new(""), Some(Vec::new()));
        let feedback = FrameFeedback::new(3, None, FingerState::ALL_OPEN, true);
        detector.present(&feedback).unwrap();
        detector.present(&feedback).unwrap();

        let written = String::from_utf8(detector.feedback.take().unwrap()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["state"], "11111");
        assert_eq!(parsed["link_status"], "ESP32: Connected");
    }

    #[test]
    fn test_encoding_failures_are_not_reported_as_bad_input() {
        let err: HandError = serde_json::from_str::<u8>("[").unwrap_err().into();
        assert!(matches!(err, HandError::Serialize(_)));
        assert!(err.to_string().starts_with("Cannot encode feedback"));
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let mut detector = JsonLineDetector::read_only(Cursor::new("not json\n"));
        assert!(matches!(detector.next_frame(), Err(HandError::Malformed(_))));
    }
}
