//! Secondary hand measurements shown alongside the finger states.

use super::landmarks::*;
use super::{LandmarkSet, Point};

/// Three joints per finger whose two segments form the bend angle, thumb first
const ANGLE_TRIPLETS: [(usize, usize, usize); 5] = [
    (THUMB_MCP, THUMB_IP, THUMB_TIP),
    (INDEX_FINGER_PIP, INDEX_FINGER_DIP, INDEX_FINGER_TIP),
    (MIDDLE_FINGER_PIP, MIDDLE_FINGER_DIP, MIDDLE_FINGER_TIP),
    (RING_FINGER_PIP, RING_FINGER_DIP, RING_FINGER_TIP),
    (PINKY_PIP, PINKY_DIP, PINKY_TIP),
];

/// Mean position of all 21 landmarks
pub fn hand_center(hand: &LandmarkSet) -> Point {
    let points = hand.points();
    let n = points.len() as f32;
    let (sx, sy) = points.iter().fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

/// Bend angle of each finger in degrees, thumb first.
///
/// Measured between the base segment and the tip segment; a straight finger reads 0.
/// A degenerate (zero-length) segment yields 0.
pub fn finger_angles(hand: &LandmarkSet) -> [f32; 5] {
    let mut angles = [0.0f32; 5];
    for (angle, (base, mid, tip)) in angles.iter_mut().zip(ANGLE_TRIPLETS) {
        let (base, mid, tip) = (hand.point(base), hand.point(mid), hand.point(tip));
        let v1 = (mid.x - base.x, mid.y - base.y);
        let v2 = (tip.x - mid.x, tip.y - mid.y);
        let norms = (v1.0.hypot(v1.1)) * (v2.0.hypot(v2.1));
        if norms <= f32::EPSILON {
            continue;
        }
        let cos = ((v1.0 * v2.0 + v1.1 * v2.1) / norms).clamp(-1.0, 1.0);
        *angle = cos.acos().to_degrees();
    }
    angles
}
