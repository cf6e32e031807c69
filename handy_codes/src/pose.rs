//! Synthetic hand poses for simulation mode.
//!
//! A [`HandPose`] is just five "extended" flags; [`HandPose::landmarks`]
//! lays out a plausible upright, camera-facing hand with those digits
//! straight and the rest curled.  Joint spacing leaves a margin of at least
//! 0.04 on every comparison the classifier makes, so the small wobble
//! added per frame never changes the result.

use hand_gesture::landmarks::*;
use hand_gesture::{Gesture, Point};

/// Extended flags, thumb first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandPose {
    pub extended: [bool; 5],
}

/// Largest offset [`HandPose::landmarks`] adds to any coordinate.
pub const MAX_WOBBLE: f32 = 0.006;

impl HandPose {
    pub const fn new(extended: [bool; 5]) -> Self {
        HandPose { extended }
    }

    /// A pose that classifies as `gesture`.
    pub fn for_gesture(gesture: Gesture) -> Self {
        let ext = match gesture {
            Gesture::OpenPalm      => [true,  true,  true,  true,  true ],
            Gesture::Fist          => [false, false, false, false, false],
            Gesture::ThumbsUp      => [true,  false, false, false, false],
            Gesture::Victory       => [false, true,  true,  false, false],
            Gesture::PointingIndex => [false, true,  false, false, false],
            Gesture::ThreeFingers  => [false, true,  true,  true,  false],
        };
        HandPose::new(ext)
    }

    /// Thumb and index out: the rules name no gesture for this.
    pub fn ambiguous() -> Self {
        HandPose::new([true, true, false, false, false])
    }

    /// Lay the pose out as 21 landmarks.  `phase` drives a gentle wobble so
    /// consecutive frames are not identical.
    pub fn landmarks(&self, phase: f32) -> Vec<Point> {
        let dx = MAX_WOBBLE * phase.sin();
        let dy = MAX_WOBBLE * (phase * 0.7).cos();
        let at = |x: f32, y: f32| Point::new(x + dx, y + dy);

        let mut p = vec![Point::default(); LANDMARK_COUNT];
        p[WRIST] = at(0.50, 0.85);

        // Thumb on the +x side; extended means the tip clears IP and MCP.
        p[THUMB_CMC] = at(0.57, 0.78);
        p[THUMB_MCP] = at(0.62, 0.72);
        p[THUMB_IP]  = at(0.66, 0.67);
        p[THUMB_TIP] = if self.extended[0] { at(0.72, 0.62) } else { at(0.56, 0.64) };

        let fingers = [
            (INDEX_MCP,  0.56),
            (MIDDLE_MCP, 0.50),
            (RING_MCP,   0.44),
            (PINKY_MCP,  0.38),
        ];
        for (i, &(mcp, x)) in fingers.iter().enumerate() {
            let (pip, dip, tip) = (mcp + 1, mcp + 2, mcp + 3);
            p[mcp] = at(x, 0.62);
            if self.extended[i + 1] {
                p[pip] = at(x, 0.52);
                p[dip] = at(x, 0.45);
                p[tip] = at(x, 0.38);
            } else {
                p[pip] = at(x, 0.54);
                p[dip] = at(x + 0.01, 0.60);
                p[tip] = at(x + 0.01, 0.64);
            }
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hand_gesture::classify;

    #[test]
    fn every_gesture_pose_classifies_back() {
        for g in Gesture::ALL {
            for step in 0..40 {
                let pts = HandPose::for_gesture(g).landmarks(step as f32 * 0.37);
                assert_eq!(classify(&pts), Some(g), "{} at step {}", g, step);
            }
        }
    }

    #[test]
    fn ambiguous_pose_is_none() {
        assert_eq!(classify(&HandPose::ambiguous().landmarks(0.0)), None);
    }

    #[test]
    fn landmarks_stay_normalized() {
        for g in Gesture::ALL {
            for pt in HandPose::for_gesture(g).landmarks(1.3) {
                assert!((0.0..=1.0).contains(&pt.x) && (0.0..=1.0).contains(&pt.y));
            }
        }
    }
}
