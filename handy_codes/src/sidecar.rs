//! Real cameras through an external hand-landmark detector process.
//!
//! The detector owns the device and the model; we only read its output.
//!
//! # Protocol
//!
//! * `<python> <script> --list --max-probe N` prints one JSON array of
//!   usable device indices, e.g. `[0, 2]`.
//! * `<python> <script> --camera N` prints `READY` once the device is open,
//!   then one JSON object per frame:
//!
//! ```text
//! {"width":640,"height":480,"hands":[{"landmarks":[{"x":0.51,"y":0.82}, …]}],"error":null}
//! ```
//!
//! Landmarks may carry extra fields (`z`, `visibility`); they are ignored.
//! A non-null `error` reports a per-frame failure without ending the stream.

use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use hand_gesture::Point;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::camera::{CameraBackend, CameraError, CameraStream, Frame, FramePayload};

#[derive(Deserialize, Debug)]
struct HandJson {
    landmarks: Vec<Point>,
}

#[derive(Deserialize, Debug)]
struct FrameJson {
    #[serde(default)]
    width:  u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    hands:  Vec<HandJson>,
    #[serde(default)]
    error:  Option<String>,
}

/// Parse one frame line from the detector.
pub fn parse_frame(line: &str, seq: u64) -> Result<Frame, CameraError> {
    let parsed: FrameJson = serde_json::from_str(line.trim())?;
    if let Some(error) = parsed.error {
        return Err(CameraError::Detector(error));
    }
    Ok(Frame {
        seq,
        width:   parsed.width,
        height:  parsed.height,
        payload: FramePayload::Landmarks(
            parsed.hands.into_iter().map(|h| h.landmarks).collect(),
        ),
    })
}

// ════════════════════════════════════════════════════════════════════════════
// SidecarBackend
// ════════════════════════════════════════════════════════════════════════════

/// How long a detector may take to print `READY` (model loading included).
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(15);

pub struct SidecarBackend {
    pub python:          PathBuf,
    pub script:          PathBuf,
    pub startup_timeout: Duration,
}

impl SidecarBackend {
    pub fn new(python: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        SidecarBackend {
            python:          python.into(),
            script:          script.into(),
            startup_timeout: STARTUP_TIMEOUT,
        }
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.arg(&self.script);
        cmd
    }
}

impl CameraBackend for SidecarBackend {
    fn open(&self, index: usize) -> Result<Box<dyn CameraStream>, CameraError> {
        info!(camera = index, script = %self.script.display(), "starting landmark sidecar");
        let mut child = self
            .command()
            .arg("--camera")
            .arg(index.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let Some(stdout) = child.stdout.take() else {
            stop(&mut child);
            return Err(CameraError::Unavailable(index));
        };

        // The handshake line is read on a helper thread so a detector that
        // hangs while starting cannot block the caller past the timeout.
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();
            let read = reader.read_line(&mut line).map(|_| line);
            let _ = tx.send((reader, read));
        });

        let (reader, ready) = match rx.recv_timeout(self.startup_timeout) {
            Ok((reader, Ok(line))) => (reader, line),
            Ok((_, Err(e))) => {
                stop(&mut child);
                return Err(e.into());
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(camera = index, timeout = ?self.startup_timeout, "sidecar did not start in time");
                stop(&mut child);
                return Err(CameraError::Unavailable(index));
            }
            Err(RecvTimeoutError::Disconnected) => {
                stop(&mut child);
                return Err(io::Error::other("sidecar handshake thread ended").into());
            }
        };

        if ready.trim() != "READY" {
            warn!(camera = index, got = ready.trim(), "sidecar did not signal ready");
            stop(&mut child);
            return Err(CameraError::Unavailable(index));
        }

        Ok(Box::new(SidecarCamera { index, child: Some(child), reader, seq: 0 }))
    }

    fn enumerate(&self, max_probe: usize) -> Vec<usize> {
        let listed = self
            .command()
            .arg("--list")
            .arg("--max-probe")
            .arg(max_probe.to_string())
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(CameraError::from)
            .and_then(|out| Ok(serde_json::from_slice::<Vec<usize>>(&out.stdout)?));

        match listed {
            Ok(found) if !found.is_empty() => found,
            Ok(_) => vec![0],
            Err(e) => {
                warn!(error = %e, "could not list cameras, assuming camera 0");
                vec![0]
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SidecarCamera
// ════════════════════════════════════════════════════════════════════════════

pub struct SidecarCamera {
    index:  usize,
    child:  Option<Child>,
    reader: BufReader<ChildStdout>,
    seq:    u64,
}

impl CameraStream for SidecarCamera {
    fn index(&self) -> usize { self.index }

    fn read(&mut self) -> Result<Frame, CameraError> {
        if self.child.is_none() {
            return Err(CameraError::ReadFailed);
        }
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(CameraError::ReadFailed);
        }
        self.seq += 1;
        parse_frame(&line, self.seq)
    }

    fn release(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(camera = self.index, "stopping landmark sidecar");
            stop(&mut child);
        }
    }
}

fn stop(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl Drop for SidecarCamera {
    fn drop(&mut self) {
        self.release();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hands_and_ignores_extra_fields() {
        let line = r#"{"width":640,"height":480,"hands":[{"landmarks":[{"x":0.1,"y":0.2,"z":-0.01}]}],"error":null}"#;
        let f = parse_frame(line, 7).unwrap();
        assert_eq!(f.seq, 7);
        assert_eq!((f.width, f.height), (640, 480));
        assert_eq!(f.payload, FramePayload::Landmarks(vec![vec![Point::new(0.1, 0.2)]]));
    }

    #[test]
    fn empty_frame_has_no_hands() {
        let f = parse_frame(r#"{"hands":[]}"#, 1).unwrap();
        assert_eq!(f.payload, FramePayload::Landmarks(vec![]));
    }

    #[test]
    fn detector_error_is_reported() {
        let err = parse_frame(r#"{"error":"model not loaded"}"#, 1).unwrap_err();
        assert_eq!(err.to_string(), "detector error: model not loaded");
    }

    #[test]
    fn garbage_is_protocol_error() {
        assert!(matches!(parse_frame("READY", 1), Err(CameraError::Protocol(_))));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::io::Write;

        /// A shell script stands in for the detector.
        fn fake_detector(body: &str) -> (tempfile::TempDir, SidecarBackend) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("detector.sh");
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(f, "{}", body).unwrap();
            (dir, SidecarBackend::new("sh", path))
        }

        #[test]
        fn streams_frames_after_ready() {
            let (_dir, backend) = fake_detector(
                "echo READY\necho '{\"width\":2,\"height\":2,\"hands\":[]}'",
            );
            let mut cam = backend.open(0).unwrap();
            let f = cam.read().unwrap();
            assert_eq!(f.seq, 1);
            assert_eq!(f.payload, FramePayload::Landmarks(vec![]));
            // the script exits: end of stream reads as a grab failure
            assert!(matches!(cam.read(), Err(CameraError::ReadFailed)));
            cam.release();
        }

        #[test]
        fn missing_ready_is_unavailable() {
            let (_dir, backend) = fake_detector("echo 'no camera here'");
            assert!(matches!(backend.open(3), Err(CameraError::Unavailable(3))));
        }

        #[test]
        fn hung_startup_times_out() {
            let (_dir, backend) = fake_detector("sleep 3");
            let backend = backend.with_startup_timeout(Duration::from_millis(200));
            let started = std::time::Instant::now();
            assert!(matches!(backend.open(1), Err(CameraError::Unavailable(1))));
            assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
        }

        #[test]
        fn list_parses_indices() {
            let (_dir, backend) = fake_detector("echo '[0, 2]'");
            assert_eq!(backend.enumerate(5), vec![0, 2]);
        }

        #[test]
        fn list_failure_defaults_to_zero() {
            let (_dir, backend) = fake_detector("echo nonsense");
            assert_eq!(backend.enumerate(5), vec![0]);
        }
    }
}
