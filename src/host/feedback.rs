use serde::Serialize;

use crate::hand::{metrics, Finger, FingerState, LandmarkSet, Point};
use crate::link;

/// Per-finger indicator for the display
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FingerIndicator {
    pub name: &'static str,
    pub open: bool,
}

/// Everything the display needs to draw one frame's overlay
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FrameFeedback {
    pub frame: u64,
    pub hand_detected: bool,
    pub fingers: Vec<FingerIndicator>,
    /// Finger states as sent on the wire, e.g. `"10110"`
    pub state: String,
    /// Bend angle per finger in degrees, thumb first
    pub angles: [f32; 5],
    /// Hand center in normalized coordinates
    pub position: Point,
    pub link_connected: bool,
    pub link_status: String,
    /// Last state the device acknowledged, read back from its pins
    pub last_ack: Option<String>,
    /// Extra lines shown when debug info is toggled on
    pub debug: Vec<String>,
}

impl FrameFeedback {
    /// Build the overlay for a frame; a missing hand shows all fingers closed at the origin
    pub fn new(frame: u64, hand: Option<&LandmarkSet>, state: FingerState, link_connected: bool) -> Self {
        let (angles, position) = match hand {
            Some(hand) => (metrics::finger_angles(hand), metrics::hand_center(hand)),
            None => ([0.0; 5], Point::default()),
        };
        Self {
            frame,
            hand_detected: hand.is_some(),
            fingers: Finger::ALL
                .iter()
                .map(|finger| FingerIndicator { name: finger.name(), open: state.get(*finger) })
                .collect(),
            state: link::encode(&state),
            angles,
            position,
            link_connected,
            link_status: if link_connected { "ESP32: Connected" } else { "ESP32: Disconnected" }.to_string(),
            last_ack: None,
            debug: Vec::new(),
        }
    }
}
