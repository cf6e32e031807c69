//! Camera sources.
//!
//! The public interface is a [`CameraBackend`] that lists and opens
//! devices, and the [`CameraStream`] it returns.  Consumers don't need to
//! know whether frames come from a real device (through the landmark
//! sidecar) or from the keyboard-driven simulator.

use std::cell::Cell;
use std::io;
use std::rc::Rc;

use hand_gesture::Point;
use thiserror::Error;
use tracing::{info, warn};

use crate::pose::HandPose;

// ════════════════════════════════════════════════════════════════════════════
// Frame
// ════════════════════════════════════════════════════════════════════════════

/// One captured frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub seq:     u64,
    pub width:   u32,
    pub height:  u32,
    pub payload: FramePayload,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FramePayload {
    /// Simulated hand; `None` means no hand in view.
    Pose(Option<HandPose>),
    /// Landmarks detected upstream, one `Vec` per hand.
    Landmarks(Vec<Vec<Point>>),
}

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera {0} is not available")]
    Unavailable(usize),

    #[error("failed to grab frame")]
    ReadFailed,

    #[error("detector error: {0}")]
    Detector(String),

    #[error("malformed detector output: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// Traits
// ════════════════════════════════════════════════════════════════════════════

pub trait CameraStream {
    fn index(&self) -> usize;
    fn read(&mut self) -> Result<Frame, CameraError>;
    /// Give the device back.  Reads after this fail.
    fn release(&mut self);
}

pub trait CameraBackend {
    fn open(&self, index: usize) -> Result<Box<dyn CameraStream>, CameraError>;

    /// Device indices in `0..max_probe` that open.  Never empty: `[0]` is
    /// returned when nothing answers.
    fn enumerate(&self, max_probe: usize) -> Vec<usize> {
        let found: Vec<usize> = (0..max_probe)
            .filter(|&i| match self.open(i) {
                Ok(mut s) => { s.release(); true }
                Err(_)    => false,
            })
            .collect();
        if found.is_empty() { vec![0] } else { found }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// open_with_fallback
// ════════════════════════════════════════════════════════════════════════════

/// Result of trying to start a camera.
pub struct Opened {
    /// `None` is the persistent "no camera" state; the UI keeps running.
    pub stream: Option<Box<dyn CameraStream>>,
    pub index:  usize,
    pub status: String,
}

/// Open `selected`, falling back to device 0.
pub fn open_with_fallback(backend: &dyn CameraBackend, selected: usize) -> Opened {
    let first_err = match backend.open(selected) {
        Ok(stream) => {
            info!(camera = selected, "camera initialized");
            return Opened {
                stream: Some(stream),
                index:  selected,
                status: format!("Camera {} initialized", selected),
            };
        }
        Err(e) => e,
    };
    warn!(camera = selected, error = %first_err, "failed to open camera, trying default camera");

    if selected != 0 {
        if let Ok(stream) = backend.open(0) {
            info!(camera = 0, "default camera initialized");
            return Opened {
                stream: Some(stream),
                index:  0,
                status: format!("Failed to open camera {}, using default camera 0", selected),
            };
        }
    }

    warn!("no camera could be opened");
    Opened {
        stream: None,
        index:  selected,
        status: "ERROR: Could not open any camera".to_string(),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Simulated camera: keyboard-driven hand
// ════════════════════════════════════════════════════════════════════════════

/// Shared slot the window writes the currently held pose into.
pub type PoseHandle = Rc<Cell<Option<HandPose>>>;

/// Simulated camera backend.
///
/// Every device yields frames whose payload is whatever pose is in the
/// shared [`PoseHandle`] at read time.
pub struct SimBackend {
    pose:    PoseHandle,
    devices: Vec<usize>,
}

impl SimBackend {
    /// One virtual device, index 0.
    pub fn new(pose: PoseHandle) -> Self {
        SimBackend { pose, devices: vec![0] }
    }

    pub fn with_devices(pose: PoseHandle, devices: Vec<usize>) -> Self {
        SimBackend { pose, devices }
    }
}

impl CameraBackend for SimBackend {
    fn open(&self, index: usize) -> Result<Box<dyn CameraStream>, CameraError> {
        if !self.devices.contains(&index) {
            return Err(CameraError::Unavailable(index));
        }
        Ok(Box::new(SimCamera {
            index,
            pose:     Rc::clone(&self.pose),
            seq:      0,
            released: false,
        }))
    }
}

pub struct SimCamera {
    index:    usize,
    pose:     PoseHandle,
    seq:      u64,
    released: bool,
}

impl CameraStream for SimCamera {
    fn index(&self) -> usize { self.index }

    fn read(&mut self) -> Result<Frame, CameraError> {
        if self.released {
            return Err(CameraError::ReadFailed);
        }
        self.seq += 1;
        Ok(Frame {
            seq:     self.seq,
            width:   640,
            height:  480,
            payload: FramePayload::Pose(self.pose.get()),
        })
    }

    fn release(&mut self) {
        self.released = true;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
