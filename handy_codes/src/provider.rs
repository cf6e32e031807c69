//! Landmark providers: frame in, hands out.

use hand_gesture::Point;

use crate::camera::{Frame, FramePayload};

/// Anything that can find hands in a [`Frame`].
pub trait LandmarkProvider {
    /// Zero or more hands, each an ordered landmark list.
    fn detect(&mut self, frame: &Frame) -> Vec<Vec<Point>>;
}

/// Lays out simulated poses as landmarks.
#[derive(Debug, Default)]
pub struct SyntheticHands;

impl LandmarkProvider for SyntheticHands {
    fn detect(&mut self, frame: &Frame) -> Vec<Vec<Point>> {
        match &frame.payload {
            FramePayload::Pose(Some(pose)) => vec![pose.landmarks(frame.seq as f32 * 0.15)],
            _ => Vec::new(),
        }
    }
}

/// Hands the detector already found, passed through untouched.
#[derive(Debug, Default)]
pub struct DetectedHands;

impl LandmarkProvider for DetectedHands {
    fn detect(&mut self, frame: &Frame) -> Vec<Vec<Point>> {
        match &frame.payload {
            FramePayload::Landmarks(hands) => hands.clone(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::HandPose;
    use hand_gesture::{classify, Gesture};

    fn frame(payload: FramePayload) -> Frame {
        Frame { seq: 3, width: 640, height: 480, payload }
    }

    #[test]
    fn synthetic_renders_pose() {
        let f = frame(FramePayload::Pose(Some(HandPose::for_gesture(Gesture::Fist))));
        let hands = SyntheticHands.detect(&f);
        assert_eq!(hands.len(), 1);
        assert_eq!(classify(&hands[0]), Some(Gesture::Fist));
    }

    #[test]
    fn synthetic_empty_without_pose() {
        assert!(SyntheticHands.detect(&frame(FramePayload::Pose(None))).is_empty());
        assert!(SyntheticHands.detect(&frame(FramePayload::Landmarks(vec![vec![]]))).is_empty());
    }

    #[test]
    fn detected_passes_through() {
        let hands = vec![vec![Point::new(0.1, 0.1)], vec![]];
        let f = frame(FramePayload::Landmarks(hands.clone()));
        assert_eq!(DetectedHands.detect(&f), hands);
        assert!(DetectedHands.detect(&frame(FramePayload::Pose(None))).is_empty());
    }
}
