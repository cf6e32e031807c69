//! Hand landmark model.
//!
//! A hand is 21 normalized image-space points in the MediaPipe hand
//! topology.  `x` grows to the right and `y` grows downward, both in
//! `[0, 1]` relative to the frame.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of landmarks in one hand.
pub const LANDMARK_COUNT: usize = 21;

// ════════════════════════════════════════════════════════════════════════════
// Anatomical indices
// ════════════════════════════════════════════════════════════════════════════

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

/// Bone segments between landmarks, for drawing a hand skeleton.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (MIDDLE_MCP, RING_MCP), (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (RING_MCP, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
    (WRIST, PINKY_MCP),
];

// ════════════════════════════════════════════════════════════════════════════
// Point
// ════════════════════════════════════════════════════════════════════════════

/// A single normalized landmark position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Point { x, y }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSet
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LandmarkError {
    #[error("expected {LANDMARK_COUNT} landmarks, got {got}")]
    TooFew { got: usize },
}

/// A validated hand: exactly [`LANDMARK_COUNT`] points.
///
/// Built from any slice of at least 21 points; extra trailing points are
/// ignored, matching how trackers that append auxiliary points are consumed.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet([Point; LANDMARK_COUNT]);

impl LandmarkSet {
    /// The point at an anatomical index.  Indices are the constants in this
    /// module; anything else panics like slice indexing.
    pub fn get(&self, index: usize) -> Point {
        self.0[index]
    }

    pub fn points(&self) -> &[Point; LANDMARK_COUNT] {
        &self.0
    }
}

impl TryFrom<&[Point]> for LandmarkSet {
    type Error = LandmarkError;

    fn try_from(points: &[Point]) -> Result<Self, Self::Error> {
        let head: &[Point; LANDMARK_COUNT] = points
            .get(..LANDMARK_COUNT)
            .and_then(|s| s.try_into().ok())
            .ok_or(LandmarkError::TooFew { got: points.len() })?;
        Ok(LandmarkSet(*head))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_points_rejected() {
        let pts = vec![Point::default(); 20];
        let err = LandmarkSet::try_from(pts.as_slice()).unwrap_err();
        assert_eq!(err, LandmarkError::TooFew { got: 20 });
        assert_eq!(err.to_string(), "expected 21 landmarks, got 20");
    }

    #[test]
    fn extra_points_are_ignored() {
        let mut pts: Vec<Point> = (0..23).map(|i| Point::new(i as f32, 0.0)).collect();
        pts[22].y = 9.0;
        let set = LandmarkSet::try_from(pts.as_slice()).unwrap();
        assert_eq!(set.get(PINKY_TIP), Point::new(20.0, 0.0));
        assert_eq!(set.points().len(), LANDMARK_COUNT);
    }

    #[test]
    fn connections_stay_in_range() {
        for &(a, b) in HAND_CONNECTIONS.iter() {
            assert!(a < LANDMARK_COUNT && b < LANDMARK_COUNT);
        }
    }

    #[test]
    fn point_from_tuple() {
        assert_eq!(Point::from((0.25, 0.75)), Point::new(0.25, 0.75));
    }
}
