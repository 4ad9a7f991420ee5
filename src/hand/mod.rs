pub mod detector;
pub mod finger;
pub mod metrics;

pub use detector::{Frame, HandDetector, JsonLineDetector, SubprocessDetector};
pub use finger::{Finger, FingerState};

use serde::{Deserialize, Serialize};

/// Number of keypoints the landmark detector reports per hand
pub const LANDMARK_COUNT: usize = 21;

/// Hand landmark indices used by the finger rules (MediaPipe hand landmark convention)
pub mod landmarks {
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

#[derive(Debug, thiserror::Error)]
pub enum HandError {
    #[error("Expected 21 landmarks, got {0}")]
    WrongPointCount(usize),

    #[error("Detector I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed detector output: {0}")]
    Malformed(String),

    #[error("Detector failed to start: {0}")]
    StartFailed(String),

    #[error("Cannot encode feedback: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HandError>;

/// A single keypoint in normalized image coordinates (0.0..=1.0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The 21 keypoints of one detected hand
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Point; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Point; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build a set from detector output, rejecting partial hands
    pub fn from_points(points: &[Point]) -> Result<Self> {
        let points: [Point; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| HandError::WrongPointCount(points.len()))?;
        Ok(Self { points })
    }

    pub fn point(&self, index: usize) -> Point {
        self.points[index]
    }

    pub fn points(&self) -> &[Point; LANDMARK_COUNT] {
        &self.points
    }
}
