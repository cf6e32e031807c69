//! Top-level application loop.
//!
//! `App` owns the `Session`, the editor, and the camera plumbing.  Each
//! iteration it applies the UI commands, reads one frame, turns it into
//! hands, lets the session debounce and dispatch, and hands a `View` to the
//! visualizer.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use hand_gesture::Gesture;
use snippet_runner::Evaluator;
use tracing::{error, info, warn};

use crate::camera::{open_with_fallback, CameraBackend, CameraError, CameraStream, PoseHandle, SimBackend};
use crate::editor::Editor;
use crate::provider::{DetectedHands, LandmarkProvider, SyntheticHands};
use crate::session::Session;
use crate::settings::{Backend, Settings};
use crate::sidecar::SidecarBackend;
use crate::visualizer::{EditKey, UiCommand, View, Visualizer};

/// Idle wait while the camera is paused or absent.
pub const PAUSED_DELAY:     Duration = Duration::from_millis(10);
/// Wait after a frame could not be grabbed.
pub const READ_RETRY_DELAY: Duration = Duration::from_millis(100);
/// Wait after any other loop error.
pub const LOOP_ERROR_DELAY: Duration = Duration::from_millis(500);

// ════════════════════════════════════════════════════════════════════════════
// App
// ════════════════════════════════════════════════════════════════════════════

pub struct App<E> {
    session:      Session<E>,
    editor:       Editor,

    // ── camera ────────────────────────────────────────────────────────────
    backend:      Box<dyn CameraBackend>,
    provider:     Box<dyn LandmarkProvider>,
    stream:       Option<Box<dyn CameraStream>>,
    /// Devices found at startup, never empty.
    cameras:      Vec<usize>,
    camera:       usize,
    camera_label: String,
    /// Size of the last frame read, shown under the preview.
    frame_size:   Option<(u32, u32)>,

    save_dir:     PathBuf,
    /// Gestures listed in the on-screen guide.
    guide:        Vec<Gesture>,
}

impl<E: Evaluator> App<E> {
    /// Probe the backend's devices and open `selected` (or the fallback).
    pub fn new(
        session:   Session<E>,
        backend:   Box<dyn CameraBackend>,
        provider:  Box<dyn LandmarkProvider>,
        max_probe: usize,
        selected:  usize,
        save_dir:  PathBuf,
    ) -> Self {
        let cameras = backend.enumerate(max_probe);
        info!(?cameras, "cameras found");

        let guide = session.snippets().gestures().collect();
        let mut app = App {
            session,
            editor: Editor::default(),
            backend,
            provider,
            stream: None,
            cameras,
            camera: selected,
            camera_label: String::new(),
            frame_size: None,
            save_dir,
            guide,
        };
        app.open_camera(selected);
        app
    }

    // ── UI commands ───────────────────────────────────────────────────────

    /// Apply one command.  Returns false when the app should quit.
    pub fn handle(&mut self, cmd: UiCommand) -> bool {
        match cmd {
            UiCommand::Run   => self.session.run_code(self.editor.text()),
            UiCommand::Clear => {
                self.editor.clear();
                self.session.clear_code();
            }
            UiCommand::Save => {
                if let Err(e) = self.session.save_code(self.editor.text(), &self.save_dir) {
                    warn!(error = %format!("{:#}", e), "save failed");
                }
            }
            UiCommand::ToggleCamera => {
                let active = self.session.toggle_camera();
                info!(active, "camera toggled");
            }
            UiCommand::PrevCamera => self.cycle_camera(false),
            UiCommand::NextCamera => self.cycle_camera(true),
            UiCommand::Edit(key)  => self.edit(key),
            UiCommand::Quit       => return false,
        }
        true
    }

    fn edit(&mut self, key: EditKey) {
        let e = &mut self.editor;
        match key {
            EditKey::Char(c)   => e.insert_char(c),
            EditKey::Newline   => e.newline(),
            EditKey::Tab       => e.tab(),
            EditKey::Backspace => e.backspace(),
            EditKey::Delete    => e.delete(),
            EditKey::Left      => e.left(),
            EditKey::Right     => e.right(),
            EditKey::Home      => e.home(),
            EditKey::End       => e.end(),
        }
    }

    // ── camera selection ──────────────────────────────────────────────────

    fn cycle_camera(&mut self, forward: bool) {
        let n = self.cameras.len();
        let pos = self.cameras.iter().position(|&c| c == self.camera).unwrap_or(0);
        let next = if forward { (pos + 1) % n } else { (pos + n - 1) % n };
        let index = self.cameras[next];
        if index == self.camera && self.stream.is_some() {
            return;
        }
        self.open_camera(index);
    }

    /// Release the current stream and open `index`, falling back to 0.
    pub fn open_camera(&mut self, index: usize) {
        self.release_camera();
        let opened = open_with_fallback(self.backend.as_ref(), index);
        self.camera = opened.index;
        self.camera_label = if opened.stream.is_some() { opened.index.to_string() } else { String::new() };
        self.stream = opened.stream;
        self.frame_size = None;
        self.session.set_status(opened.status);
    }

    pub fn release_camera(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            info!(camera = stream.index(), "releasing camera");
            stream.release();
        }
    }

    // ── per-iteration ─────────────────────────────────────────────────────

    /// Read and process one frame.  Returns how long the caller should
    /// wait before the next iteration.
    pub fn step(&mut self, now: Duration) -> anyhow::Result<Duration> {
        if !self.session.camera_active() {
            return Ok(PAUSED_DELAY);
        }
        let Some(stream) = self.stream.as_mut() else {
            return Ok(PAUSED_DELAY);
        };

        let frame = match stream.read() {
            Ok(frame) => frame,
            Err(e @ (CameraError::ReadFailed | CameraError::Io(_))) => {
                warn!(error = %e, "frame grab failed");
                self.session.set_status("Camera error: Failed to grab frame");
                return Ok(READ_RETRY_DELAY);
            }
            Err(e) => return Err(anyhow::Error::new(e).context("camera read")),
        };

        self.frame_size = Some((frame.width, frame.height));
        let hands = self.provider.detect(&frame);
        let fired = self.session.observe(hands, now);
        if !fired.is_empty() && self.editor.sync_from(self.session.program()) {
            info!(fired = fired.len(), lines = self.editor.line_count(), "editor updated");
        }
        Ok(Duration::ZERO)
    }

    /// Record a failed iteration in the log and the status bar.
    pub fn report_error(&mut self, err: &anyhow::Error) -> Duration {
        error!(error = %format!("{:#}", err), "main loop error");
        self.session.set_status(format!("Main loop error: {:#}", err));
        LOOP_ERROR_DELAY
    }

    // ── accessors for the render loop ─────────────────────────────────────

    pub fn session(&self) -> &Session<E> { &self.session }
    pub fn editor(&self)  -> &Editor     { &self.editor }
    pub fn camera(&self)  -> Option<usize> {
        self.stream.as_ref().map(|s| s.index())
    }
    pub fn cameras(&self) -> &[usize]    { &self.cameras }

    pub fn view(&self) -> View<'_> {
        View {
            editor:        &self.editor,
            console:       self.session.console(),
            status:        self.session.status(),
            camera_label:  &self.camera_label,
            frame_size:    self.frame_size,
            camera_active: self.session.camera_active(),
            hands:         self.session.hands(),
            displayed:     self.session.displayed(),
            live:          self.session.live(),
            guide:         &self.guide,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It opens the window,
/// picks the camera backend from `settings` (keyboard simulation unless
/// the sidecar is selected) and drives the poll/step/render loop until the
/// window closes.
pub fn run(settings: &Settings) -> anyhow::Result<()> {
    let mut vis = Visualizer::new()?;

    // ── Camera backend + landmark provider ────────────────────────────────
    let pose: PoseHandle = Rc::new(Cell::new(None));
    let (backend, provider): (Box<dyn CameraBackend>, Box<dyn LandmarkProvider>) = match settings.backend {
        Backend::Sim => (
            Box::new(SimBackend::new(Rc::clone(&pose))),
            Box::new(SyntheticHands),
        ),
        Backend::Sidecar => (
            Box::new(SidecarBackend::new(&settings.sidecar_python, &settings.sidecar_script)),
            Box::new(DetectedHands),
        ),
    };
    info!(backend = ?settings.backend, "starting");

    // ── App state ─────────────────────────────────────────────────────────
    let session = Session::new(settings.hold_config(), settings.snippet_map(), settings.evaluator());
    let mut app = App::new(
        session,
        backend,
        provider,
        settings.max_probe,
        settings.camera,
        settings.save_dir.clone(),
    );

    // ── Main loop ─────────────────────────────────────────────────────────
    let start = Instant::now();
    'main: while vis.is_open() {
        // 1. Poll window input
        let input = vis.poll_input();
        pose.set(input.pose);
        for cmd in input.commands {
            if !app.handle(cmd) { break 'main; }
        }

        // 2. Camera → hands → session
        let delay = match app.step(start.elapsed()) {
            Ok(delay) => delay,
            Err(e)    => app.report_error(&e),
        };

        // 3. Render
        vis.render(&app.view());

        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    app.release_camera();
    info!("window closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Frame;
    use crate::pose::HandPose;
    use hand_gesture::HoldConfig;
    use snippet_runner::{EvalError, SnippetMap};

    struct Quiet;

    impl Evaluator for Quiet {
        fn evaluate(&mut self, _code: &str) -> Result<String, EvalError> {
            Ok(String::new())
        }
    }

    /// Backend whose streams fail every read with a fixed error.
    struct Broken(fn() -> CameraError);

    struct BrokenStream(fn() -> CameraError);

    impl CameraStream for BrokenStream {
        fn index(&self) -> usize { 0 }
        fn read(&mut self) -> Result<Frame, CameraError> { Err((self.0)()) }
        fn release(&mut self) {}
    }

    impl CameraBackend for Broken {
        fn open(&self, _index: usize) -> Result<Box<dyn CameraStream>, CameraError> {
            Ok(Box::new(BrokenStream(self.0)))
        }
    }

    fn session() -> Session<Quiet> {
        Session::new(HoldConfig::default(), SnippetMap::default(), Quiet)
    }

    fn sim_app(devices: Vec<usize>, selected: usize) -> (App<Quiet>, PoseHandle, tempfile::TempDir) {
        let pose: PoseHandle = Rc::new(Cell::new(None));
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(
            session(),
            Box::new(SimBackend::with_devices(Rc::clone(&pose), devices)),
            Box::new(SyntheticHands),
            5,
            selected,
            dir.path().to_path_buf(),
        );
        (app, pose, dir)
    }

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    #[test]
    fn opens_selected_camera() {
        let (app, _, _dir) = sim_app(vec![0, 2], 2);
        assert_eq!(app.cameras(), &[0, 2]);
        assert_eq!(app.camera(), Some(2));
        assert_eq!(app.session().status(), "Camera 2 initialized");
        assert_eq!(app.view().camera_label, "2");
    }

    #[test]
    fn falls_back_to_default_camera() {
        let (app, _, _dir) = sim_app(vec![0], 3);
        assert_eq!(app.camera(), Some(0));
        assert_eq!(app.session().status(), "Failed to open camera 3, using default camera 0");
    }

    #[test]
    fn no_camera_keeps_running() {
        let (mut app, _, _dir) = sim_app(vec![], 0);
        assert_eq!(app.cameras(), &[0]);
        assert_eq!(app.camera(), None);
        assert_eq!(app.session().status(), "ERROR: Could not open any camera");
        assert_eq!(app.step(ms(0)).unwrap(), PAUSED_DELAY);
        assert_eq!(app.view().camera_label, "");
        assert_eq!(app.view().frame_size, None);
    }

    #[test]
    fn held_pose_fires_and_syncs_editor() {
        let (mut app, pose, _dir) = sim_app(vec![0], 0);
        pose.set(Some(HandPose::for_gesture(Gesture::ThumbsUp)));
        for t in [0, 100, 200] {
            assert_eq!(app.step(ms(t)).unwrap(), Duration::ZERO);
            assert_eq!(app.editor().text(), "");
        }
        app.step(ms(300)).unwrap();
        assert_eq!(app.view().frame_size, Some((640, 480)));
        assert_eq!(app.session().status(), "Recognized gesture: thumbs_up");
        assert_eq!(app.editor().text(), "x = 10\nprint(\"Variable x set to\", x)\n");
        assert_eq!(app.view().displayed, Some(Gesture::ThumbsUp));
    }

    #[test]
    fn paused_camera_skips_frames() {
        let (mut app, pose, _dir) = sim_app(vec![0], 0);
        pose.set(Some(HandPose::for_gesture(Gesture::Fist)));
        assert!(app.handle(UiCommand::ToggleCamera));
        assert_eq!(app.session().status(), "Camera paused");
        for t in (0..1000).step_by(100) {
            assert_eq!(app.step(ms(t)).unwrap(), PAUSED_DELAY);
        }
        assert_eq!(app.session().program(), "");
        app.handle(UiCommand::ToggleCamera);
        assert_eq!(app.step(ms(1000)).unwrap(), Duration::ZERO);
    }

    #[test]
    fn typing_then_clear() {
        let (mut app, _, _dir) = sim_app(vec![0], 0);
        for c in "x=1".chars() {
            app.handle(UiCommand::Edit(EditKey::Char(c)));
        }
        app.handle(UiCommand::Edit(EditKey::Home));
        app.handle(UiCommand::Edit(EditKey::Delete));
        assert_eq!(app.editor().text(), "=1");
        app.handle(UiCommand::Clear);
        assert_eq!(app.editor().text(), "");
        assert_eq!(app.session().status(), "Code cleared");
    }

    #[test]
    fn save_uses_editor_text() {
        let (mut app, _, dir) = sim_app(vec![0], 0);
        for c in "print(1)".chars() {
            app.handle(UiCommand::Edit(EditKey::Char(c)));
        }
        app.handle(UiCommand::Save);
        let saved: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(saved.len(), 1);
        let path = saved[0].as_ref().unwrap().path();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "print(1)");
        assert!(app.session().status().starts_with("Code saved to "));
    }

    #[test]
    fn cameras_cycle_both_ways() {
        let (mut app, _, _dir) = sim_app(vec![0, 1, 3], 0);
        app.handle(UiCommand::NextCamera);
        assert_eq!(app.camera(), Some(1));
        app.handle(UiCommand::NextCamera);
        assert_eq!(app.camera(), Some(3));
        app.handle(UiCommand::NextCamera);
        assert_eq!(app.camera(), Some(0));
        app.handle(UiCommand::PrevCamera);
        assert_eq!(app.camera(), Some(3));
        assert_eq!(app.session().status(), "Camera 3 initialized");
    }

    #[test]
    fn grab_failure_sets_status() {
        let mut app = App::new(
            session(),
            Box::new(Broken(|| CameraError::ReadFailed)),
            Box::new(SyntheticHands),
            1,
            0,
            PathBuf::from("."),
        );
        assert_eq!(app.step(ms(0)).unwrap(), READ_RETRY_DELAY);
        assert_eq!(app.session().status(), "Camera error: Failed to grab frame");
    }

    #[test]
    fn detector_error_is_a_loop_error() {
        let mut app = App::new(
            session(),
            Box::new(Broken(|| CameraError::Detector("no model".into()))),
            Box::new(DetectedHands),
            1,
            0,
            PathBuf::from("."),
        );
        let err = app.step(ms(0)).unwrap_err();
        assert_eq!(app.report_error(&err), LOOP_ERROR_DELAY);
        assert_eq!(app.session().status(), "Main loop error: camera read: detector error: no model");
    }

    #[test]
    fn quit_command_stops() {
        let (mut app, _, _dir) = sim_app(vec![0], 0);
        assert!(app.handle(UiCommand::Run));
        assert!(!app.handle(UiCommand::Quit));
    }

    #[test]
    fn released_camera_reports_grab_failure() {
        let (mut app, _, _dir) = sim_app(vec![0], 0);
        // stream still held, but the device was given back underneath it
        if let Some(stream) = app.stream.as_mut() {
            stream.release();
        }
        assert_eq!(app.step(ms(0)).unwrap(), READ_RETRY_DELAY);
    }
}
