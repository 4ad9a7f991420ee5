use serde::{Deserialize, Serialize};

use super::landmarks::*;
use super::LandmarkSet;

/// Finger positions in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [Finger::Thumb, Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    pub fn name(&self) -> &'static str {
        match self {
            Finger::Thumb => "Thumb",
            Finger::Index => "Index",
            Finger::Middle => "Middle",
            Finger::Ring => "Ring",
            Finger::Pinky => "Pinky",
        }
    }

    /// (tip, reference joint) landmark indices compared for this finger
    fn comparison_points(&self) -> (usize, usize) {
        match self {
            Finger::Thumb => (THUMB_TIP, THUMB_IP),
            Finger::Index => (INDEX_FINGER_TIP, INDEX_FINGER_PIP),
            Finger::Middle => (MIDDLE_FINGER_TIP, MIDDLE_FINGER_PIP),
            Finger::Ring => (RING_FINGER_TIP, RING_FINGER_PIP),
            Finger::Pinky => (PINKY_TIP, PINKY_PIP),
        }
    }
}

/// Open/closed state of all five fingers, `true` = open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FingerState {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerState {
    pub const ALL_CLOSED: FingerState = FingerState::from_array([false; 5]);
    pub const ALL_OPEN: FingerState = FingerState::from_array([true; 5]);

    pub const fn from_array(bits: [bool; 5]) -> Self {
        Self {
            thumb: bits[0],
            index: bits[1],
            middle: bits[2],
            ring: bits[3],
            pinky: bits[4],
        }
    }

    /// States in wire order: thumb, index, middle, ring, pinky
    pub fn to_array(&self) -> [bool; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }

    pub fn get(&self, finger: Finger) -> bool {
        match finger {
            Finger::Thumb => self.thumb,
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }

    /// Derive finger states from one hand's landmarks.
    ///
    /// The thumb is open when its tip sits left of the IP joint in image space. Hand
    /// orientation and handedness are not taken into account, so a mirrored left hand
    /// reads inverted. The other fingers are open when the tip is above (smaller y) the
    /// PIP joint two landmarks below it.
    pub fn from_landmarks(hand: &LandmarkSet) -> Self {
        let mut bits = [false; 5];
        for (slot, finger) in bits.iter_mut().zip(Finger::ALL) {
            let (tip, joint) = finger.comparison_points();
            let (tip, joint) = (hand.point(tip), hand.point(joint));
            *slot = match finger {
                Finger::Thumb => tip.x < joint.x,
                _ => tip.y < joint.y,
            };
        }
        Self::from_array(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::{Point, LANDMARK_COUNT};

    /// Upright right hand in image space with every finger extended
    fn open_hand() -> [Point; LANDMARK_COUNT] {
        let mut points = [Point::new(0.5, 0.8); LANDMARK_COUNT];
        points[THUMB_IP] = Point::new(0.40, 0.60);
        points[THUMB_TIP] = Point::new(0.32, 0.55);
        for (column, (pip, tip)) in [(6, 8), (10, 12), (14, 16), (18, 20)].into_iter().enumerate() {
            let x = 0.45 + column as f32 * 0.05;
            points[pip] = Point::new(x, 0.50);
            points[pip + 1] = Point::new(x, 0.40);
            points[tip] = Point::new(x, 0.30);
        }
        points
    }

    #[test]
    fn test_open_hand_is_all_open() {
        let state = FingerState::from_landmarks(&LandmarkSet::new(open_hand()));
        assert_eq!(state, FingerState::ALL_OPEN);
    }

    #[test]
    fn test_fist_is_all_closed() {
        let mut points = open_hand();
        points[THUMB_TIP].x = 0.45;
        for tip in [8, 12, 16, 20] {
            points[tip].y = 0.60;
        }
        let state = FingerState::from_landmarks(&LandmarkSet::new(points));
        assert_eq!(state, FingerState::ALL_CLOSED);
    }

    #[test]
    fn test_each_finger_uses_its_own_joint() {
        let mut points = open_hand();
        points[MIDDLE_FINGER_TIP].y = 0.55;
        points[PINKY_TIP].y = 0.51;
        let state = FingerState::from_landmarks(&LandmarkSet::new(points));
        assert_eq!(state.to_array(), [true, true, false, true, false]);
    }

    #[test]
    fn test_tip_level_with_joint_is_closed() {
        let mut points = open_hand();
        points[INDEX_FINGER_TIP].y = points[INDEX_FINGER_PIP].y;
        points[THUMB_TIP].x = points[THUMB_IP].x;
        let state = FingerState::from_landmarks(&LandmarkSet::new(points));
        assert!(!state.thumb);
        assert!(!state.index);
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let hand = LandmarkSet::new(open_hand());
        let first = FingerState::from_landmarks(&hand);
        for _ in 0..3 {
            assert_eq!(FingerState::from_landmarks(&hand), first);
        }
    }
}
