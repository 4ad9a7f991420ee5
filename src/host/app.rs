use std::time::Duration;

use chrono::{DateTime, Utc};

use super::FrameFeedback;
use crate::config::{HostConfig, SendPolicy};
use crate::hand::{self, FingerState, Frame, HandDetector, HandError};
use crate::link;
use crate::serial::{parse_device_line, DeviceLine, SerialError, SerialInterface};

/// Keys understood by the host loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    Quit,
    Reconnect,
    ToggleDebug,
    TestPattern,
}

impl OperatorCommand {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'q' => Some(OperatorCommand::Quit),
            'r' => Some(OperatorCommand::Reconnect),
            'd' => Some(OperatorCommand::ToggleDebug),
            't' => Some(OperatorCommand::TestPattern),
            _ => None,
        }
    }
}

/// Result of processing a single frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub state: FingerState,
    /// State written to the link this frame, if any
    pub sent: Option<FingerState>,
    pub command: Option<OperatorCommand>,
    pub feedback: FrameFeedback,
}

impl FrameOutcome {
    pub fn quit_requested(&self) -> bool {
        self.command == Some(OperatorCommand::Quit)
    }
}

/// Frame loop: detector in, finger states out to the LED controller
pub struct HostApp<D: HandDetector> {
    detector: D,
    link: SerialInterface,
    config: HostConfig,
    show_debug: bool,
    last_sent: Option<FingerState>,
    last_ack: Option<(FingerState, DateTime<Utc>)>,
    frame_count: u64,
}

impl<D: HandDetector> HostApp<D> {
    pub fn new(detector: D, link: SerialInterface, config: HostConfig) -> Self {
        Self {
            detector,
            link,
            config,
            show_debug: false,
            last_sent: None,
            last_ack: None,
            frame_count: 0,
        }
    }

    /// Open the configured port, retrying a few times.
    ///
    /// Returns `false` when every attempt failed; the loop then runs without a link.
    pub fn connect(&mut self) -> bool {
        match SerialInterface::list_ports() {
            Ok(ports) => {
                for port in ports {
                    log::info!("Found {}: {}", port.port_name, port.description);
                }
            }
            Err(e) => log::warn!("Cannot enumerate serial ports: {}", e),
        }

        let options = self.config.connect_options();
        let attempts = self.config.retry_count.max(1);
        log::info!("Attempting to connect to LED controller on {}...", options.port);

        for attempt in 1..=attempts {
            log::info!("Connection attempt {}/{}", attempt, attempts);
            match self.link.connect(&options) {
                Ok(_) => {
                    log::info!("Connected successfully");
                    self.last_sent = Some(FingerState::ALL_CLOSED);
                    return true;
                }
                Err(e) => {
                    log::warn!("Connection attempt failed: {}", e);
                    if e.is_access_denied() {
                        log::warn!("The port is held by another program. Close any serial monitor using it, check the port name, or replug the board.");
                    }
                    if attempt < attempts {
                        std::thread::sleep(Duration::from_millis(self.config.retry_delay_ms));
                    }
                }
            }
        }

        log::error!("Failed to connect to LED controller; running in camera-only mode (press 'r' to retry)");
        false
    }

    /// Process frames until the detector ends or the operator quits.
    /// Returns the number of frames processed.
    pub fn run(&mut self) -> hand::Result<u64> {
        log::info!("Controls: q = quit, r = reconnect, d = toggle debug info, t = test LEDs");

        loop {
            let frame = match self.detector.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    log::info!("Frame stream ended");
                    break;
                }
                Err(HandError::Malformed(e)) => {
                    log::warn!("Skipping frame: {}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let outcome = self.step(frame);
            self.detector.present(&outcome.feedback)?;
            if outcome.quit_requested() {
                log::info!("Quit requested");
                break;
            }
        }
        Ok(self.frame_count)
    }

    /// Handle one frame: derive the state, send it, collect device output, apply the key
    pub fn step(&mut self, frame: Frame) -> FrameOutcome {
        let state = frame.hand.as_ref().map(FingerState::from_landmarks);

        let sent = match state {
            Some(state) if self.should_send(&state) => self.send(&state).then_some(state),
            _ => None,
        };

        self.drain_device_lines();

        let mut feedback = FrameFeedback::new(
            self.frame_count,
            frame.hand.as_ref(),
            state.unwrap_or_default(),
            self.link.is_connected(),
        );
        feedback.last_ack = self.last_ack.map(|(ack, _)| link::encode(&ack));
        if self.show_debug {
            feedback.debug = self.debug_lines(state);
        }

        let command = frame.key.and_then(OperatorCommand::from_key);
        if let Some(command) = command {
            self.apply_command(command);
        }

        self.frame_count += 1;
        FrameOutcome {
            state: state.unwrap_or_default(),
            sent,
            command,
            feedback,
        }
    }

    fn should_send(&self, state: &FingerState) -> bool {
        if !self.link.is_connected() {
            return false;
        }
        match self.config.send_policy {
            SendPolicy::EveryFrame => true,
            SendPolicy::OnChange => self.last_sent.as_ref() != Some(state),
        }
    }

    /// Write one state; a failure is reported and leaves the app disconnected
    fn send(&mut self, state: &FingerState) -> bool {
        match self.link.send_state(state) {
            Ok(n) => {
                log::info!("Sent: {} ({} bytes)", link::encode(state), n);
                self.last_sent = Some(*state);
                true
            }
            Err(SerialError::NotConnected) => false,
            Err(e) => {
                log::error!("Serial communication error: {} (press 'r' to reconnect)", e);
                false
            }
        }
    }

    fn drain_device_lines(&mut self) {
        if !self.link.is_connected() {
            return;
        }
        match self.link.poll_lines() {
            Ok(lines) => {
                for line in lines {
                    let parsed = parse_device_line(&line);
                    parsed.log();
                    if let DeviceLine::Ack(state) = parsed {
                        self.last_ack = Some((state, Utc::now()));
                    }
                }
            }
            Err(e) => log::warn!("Reading device output failed: {}", e),
        }
    }

    fn apply_command(&mut self, command: OperatorCommand) {
        match command {
            OperatorCommand::Quit => {}
            OperatorCommand::Reconnect => {
                self.connect();
            }
            OperatorCommand::ToggleDebug => {
                self.show_debug = !self.show_debug;
                log::info!("Debug info {}", if self.show_debug { "on" } else { "off" });
            }
            OperatorCommand::TestPattern => self.test_pattern(),
        }
    }

    /// All LEDs on, short pause, all off
    pub fn test_pattern(&mut self) {
        if !self.link.is_connected() {
            log::warn!("Cannot test LEDs: not connected");
            return;
        }
        log::info!("Testing LED controller communication...");
        if self.send(&FingerState::ALL_OPEN) {
            std::thread::sleep(Duration::from_millis(self.config.test_pattern_gap_ms));
            self.send(&FingerState::ALL_CLOSED);
        }
    }

    fn debug_lines(&self, current: Option<FingerState>) -> Vec<String> {
        let mut lines = vec![
            format!("Frame: {}", self.frame_count),
            format!("Last State: {}", self.last_sent.map(|s| link::encode(&s)).unwrap_or_default()),
            format!("Current State: {}", current.map(|s| link::encode(&s)).unwrap_or_else(|| "no hand".to_string())),
            format!("Serial Port: {}", self.link.port_name().unwrap_or(&self.config.port)),
            format!("Serial Connected: {}", self.link.is_connected()),
        ];
        if let Some((ack, at)) = &self.last_ack {
            lines.push(format!("Last Ack: {} at {}", link::encode(ack), at.format("%H:%M:%S%.3f")));
        }
        lines
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    pub fn show_debug(&self) -> bool {
        self.show_debug
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn link_mut(&mut self) -> &mut SerialInterface {
        &mut self.link
    }
}
