//! Gesture classification from landmark geometry.
//!
//! Only coarse ordering comparisons are used, no angles or distances.  A
//! configuration the rules cannot name is reported as `None` rather than
//! guessed, so a misread hand never triggers the wrong action.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::landmarks::*;

// ════════════════════════════════════════════════════════════════════════════
// Gesture
// ════════════════════════════════════════════════════════════════════════════

/// The closed set of recognizable static gestures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    OpenPalm,
    Fist,
    ThumbsUp,
    Victory,
    PointingIndex,
    ThreeFingers,
}

impl Gesture {
    /// All gestures, in gesture-guide order.
    pub const ALL: [Gesture; 6] = [
        Gesture::OpenPalm,
        Gesture::ThumbsUp,
        Gesture::Victory,
        Gesture::PointingIndex,
        Gesture::Fist,
        Gesture::ThreeFingers,
    ];

    /// Stable snake_case name, also used as the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            Gesture::OpenPalm      => "open_palm",
            Gesture::Fist          => "fist",
            Gesture::ThumbsUp      => "thumbs_up",
            Gesture::Victory       => "victory",
            Gesture::PointingIndex => "pointing_index",
            Gesture::ThreeFingers  => "three_fingers",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown gesture {0:?}")]
pub struct ParseGestureError(pub String);

impl FromStr for Gesture {
    type Err = ParseGestureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gesture::ALL
            .into_iter()
            .find(|g| g.name() == s)
            .ok_or_else(|| ParseGestureError(s.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FingerStates
// ════════════════════════════════════════════════════════════════════════════

/// Which digits read as extended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FingerStates {
    pub thumb:  bool,
    pub index:  bool,
    pub middle: bool,
    pub ring:   bool,
    pub pinky:  bool,
}

impl FingerStates {
    pub fn as_array(&self) -> [bool; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }

    /// Always in `0..=5`.
    pub fn num_extended(&self) -> usize {
        self.as_array().iter().filter(|&&e| e).count()
    }
}

/// Evaluate the per-finger extension rules.
///
/// * Thumb: the tip lies to the right of both the IP and the MCP joint.
///   This assumes an upright hand facing the camera.
/// * Other fingers: the tip is above (smaller `y` than) its PIP joint.
///
/// NaN coordinates compare false and so read as "not extended".
pub fn finger_states(hand: &LandmarkSet) -> FingerStates {
    let above_pip = |tip: usize, pip: usize| hand.get(tip).y < hand.get(pip).y;

    let thumb_tip = hand.get(THUMB_TIP).x;
    FingerStates {
        thumb:  thumb_tip > hand.get(THUMB_MCP).x && thumb_tip > hand.get(THUMB_IP).x,
        index:  above_pip(INDEX_TIP,  INDEX_PIP),
        middle: above_pip(MIDDLE_TIP, MIDDLE_PIP),
        ring:   above_pip(RING_TIP,   RING_PIP),
        pinky:  above_pip(PINKY_TIP,  PINKY_PIP),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// classify
// ════════════════════════════════════════════════════════════════════════════

/// Classify a raw landmark slice.  Fewer than 21 points yields `None`.
pub fn classify(points: &[Point]) -> Option<Gesture> {
    let hand = LandmarkSet::try_from(points).ok()?;
    classify_set(&hand)
}

/// Classify a validated hand.  First matching rule wins.
pub fn classify_set(hand: &LandmarkSet) -> Option<Gesture> {
    let f = finger_states(hand);

    match f.num_extended() {
        5 => return Some(Gesture::OpenPalm),
        0 => return Some(Gesture::Fist),
        3 => return Some(Gesture::ThreeFingers),
        _ => {}
    }

    if f.index && !(f.middle || f.ring || f.pinky) {
        Some(Gesture::PointingIndex)
    } else if f.index && f.middle && !(f.ring || f.pinky) {
        Some(Gesture::Victory)
    } else if f.thumb && !(f.index || f.middle || f.ring || f.pinky) {
        Some(Gesture::ThumbsUp)
    } else {
        None
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
