//! Per-run application state.
//!
//! `Session` is the single owner of everything that changes while the app
//! runs: debounce timers, the accumulated program, the transcript and the
//! status line.  The main loop passes it observations and UI actions; it
//! never touches the window or the camera itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use hand_gesture::{classify, Debouncer, Gesture, HoldConfig, Point, LANDMARK_COUNT};
use snippet_runner::{Dispatched, Dispatcher, Evaluator, SnippetMap};
use tracing::{debug, info, warn};

pub struct Session<E> {
    debouncer:     Debouncer,
    dispatcher:    Dispatcher<E>,
    status:        String,
    /// Last gesture that fired, shown over the camera preview.
    displayed:     Option<Gesture>,
    /// Label of the most recent hand, fired or not.
    live:          Option<Gesture>,
    hands:         Vec<Vec<Point>>,
    /// One-off console message that hides the transcript until the next run.
    console_note:  Option<String>,
    camera_active: bool,
}

impl<E: Evaluator> Session<E> {
    pub fn new(hold: HoldConfig, snippets: SnippetMap, evaluator: E) -> Self {
        Session {
            debouncer:     Debouncer::new(hold),
            dispatcher:    Dispatcher::new(snippets, evaluator),
            status:        "Camera Ready".to_string(),
            displayed:     None,
            live:          None,
            hands:         Vec::new(),
            console_note:  None,
            camera_active: true,
        }
    }

    // ── per-frame ─────────────────────────────────────────────────────────

    /// Feed the hands found in one frame.  Each hand is classified and
    /// debounced in order; a frame without hands counts as one "no gesture"
    /// observation.  Returns the snippets that were dispatched.
    pub fn observe(&mut self, hands: Vec<Vec<Point>>, now: Duration) -> Vec<Dispatched> {
        let mut fired = Vec::new();

        if hands.is_empty() {
            self.live = None;
            self.debouncer.update(None, now);
        }

        for hand in &hands {
            if hand.len() < LANDMARK_COUNT {
                warn!(got = hand.len(), "incomplete hand landmarks");
                self.status = "Warning: Incomplete hand landmarks detected".to_string();
            }
            let label = classify(hand);
            self.live = label;

            if !self.debouncer.update(label, now) {
                continue;
            }
            let Some(gesture) = label else { continue };

            self.displayed = Some(gesture);
            self.status = format!("Recognized gesture: {}", gesture);
            debug!(%gesture, at = ?now, "gesture fired");

            if let Some(d) = self.dispatcher.dispatch(gesture) {
                self.console_note = None;
                fired.push(d);
            }
        }

        self.hands = hands;
        fired
    }

    // ── UI actions ────────────────────────────────────────────────────────

    /// Run the editor contents; the console shows only this run's output.
    pub fn run_code(&mut self, text: &str) {
        self.console_note = None;
        if self.dispatcher.run_program(text) {
            self.status = "Code executed successfully".to_string();
        } else {
            let err = self.dispatcher.transcript().text();
            self.status = format!("Error executing code: {}", err.trim_start_matches("Error: "));
        }
        info!(status = %self.status, "manual run");
    }

    pub fn clear_code(&mut self) {
        self.dispatcher.clear();
        self.status = "Code cleared".to_string();
    }

    /// Write `text` verbatim to `dir/handycodes_YYYYmmdd_HHMMSS.py`.
    pub fn save_code(&mut self, text: &str, dir: &Path) -> anyhow::Result<PathBuf> {
        let name = Local::now().format("handycodes_%Y%m%d_%H%M%S.py").to_string();
        let path = dir.join(name);

        let written = std::fs::write(&path, text)
            .with_context(|| format!("writing {}", path.display()));
        match written {
            Ok(()) => {
                let msg = format!("Code saved to {}", path.display());
                info!(path = %path.display(), bytes = text.len(), "program saved");
                self.status = msg.clone();
                self.console_note = Some(msg);
                Ok(path)
            }
            Err(e) => {
                self.status = format!("Error saving code: {:#}", e);
                Err(e)
            }
        }
    }

    /// Pause or resume frame processing.  Returns the new state.
    pub fn toggle_camera(&mut self) -> bool {
        self.camera_active = !self.camera_active;
        self.status = if self.camera_active { "Camera active" } else { "Camera paused" }.to_string();
        self.camera_active
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    // ── accessors for the render loop ─────────────────────────────────────

    pub fn status(&self)        -> &str              { &self.status }
    pub fn displayed(&self)     -> Option<Gesture>   { self.displayed }
    pub fn live(&self)          -> Option<Gesture>   { self.live }
    pub fn hands(&self)         -> &[Vec<Point>]     { &self.hands }
    pub fn camera_active(&self) -> bool              { self.camera_active }
    pub fn program(&self)       -> &str              { self.dispatcher.program().text() }
    pub fn snippets(&self)      -> &SnippetMap       { self.dispatcher.snippets() }

    /// What the console pane shows.
    pub fn console(&self) -> &str {
        self.console_note
            .as_deref()
            .unwrap_or_else(|| self.dispatcher.transcript().text())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::HandPose;
    use snippet_runner::EvalError;

    struct Echo;

    impl Evaluator for Echo {
        fn evaluate(&mut self, code: &str) -> Result<String, EvalError> {
            if code.contains("boom") {
                Err(EvalError::Failed("ZeroDivisionError: division by zero".into()))
            } else {
                Ok(format!("{} line(s)\n", code.lines().count()))
            }
        }
    }

    fn session() -> Session<Echo> {
        Session::new(HoldConfig::default(), SnippetMap::default(), Echo)
    }

    fn hand(g: Gesture) -> Vec<Vec<Point>> {
        vec![HandPose::for_gesture(g).landmarks(0.0)]
    }

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    #[test]
    fn held_fist_fires_then_cools_down() {
        let mut s = session();
        assert!(s.observe(hand(Gesture::Fist), ms(0)).is_empty());
        assert!(s.observe(hand(Gesture::Fist), ms(100)).is_empty());
        let fired = s.observe(hand(Gesture::Fist), ms(350));
        assert_eq!(fired.len(), 1);
        assert_eq!(s.status(), "Recognized gesture: fist");
        assert_eq!(s.displayed(), Some(Gesture::Fist));
        assert!(s.observe(hand(Gesture::Fist), ms(900)).is_empty());
        assert_eq!(s.observe(hand(Gesture::Fist), ms(1400)).len(), 1);
        assert_eq!(
            s.program(),
            "print(\"Fist detected - Stopping execution\")\nprint(\"Fist detected - Stopping execution\")\n",
        );
    }

    #[test]
    fn empty_frame_breaks_hold() {
        let mut s = session();
        s.observe(hand(Gesture::Victory), ms(0));
        s.observe(vec![], ms(200));
        assert_eq!(s.live(), None);
        s.observe(hand(Gesture::Victory), ms(250));
        assert!(s.observe(hand(Gesture::Victory), ms(400)).is_empty());
        let fired = s.observe(hand(Gesture::Victory), ms(550));
        assert_eq!(fired[0].snippet, SnippetMap::builtin(Gesture::Victory));
        assert_eq!(s.console(), ">>> victory:\n3 line(s)\n\n");
    }

    #[test]
    fn incomplete_hand_warns_and_never_fires() {
        let mut s = session();
        let short = vec![vec![Point::new(0.5, 0.5); 12]];
        for t in [0, 400, 800, 1600] {
            assert!(s.observe(short.clone(), ms(t)).is_empty());
        }
        assert_eq!(s.status(), "Warning: Incomplete hand landmarks detected");
        assert_eq!(s.hands().len(), 1);
    }

    #[test]
    fn ambiguous_pose_is_ignored() {
        let mut s = session();
        let pose = vec![HandPose::ambiguous().landmarks(0.0)];
        for t in (0..2000).step_by(100) {
            assert!(s.observe(pose.clone(), ms(t)).is_empty());
        }
        assert_eq!(s.program(), "");
    }

    #[test]
    fn run_code_success_and_failure() {
        let mut s = session();
        s.run_code("a\nb");
        assert_eq!(s.status(), "Code executed successfully");
        assert_eq!(s.console(), "2 line(s)\n");

        s.run_code("boom");
        assert_eq!(s.status(), "Error executing code: ZeroDivisionError: division by zero");
        assert_eq!(s.console(), "Error: ZeroDivisionError: division by zero");
    }

    #[test]
    fn clear_empties_program() {
        let mut s = session();
        s.observe(hand(Gesture::OpenPalm), ms(0));
        s.observe(hand(Gesture::OpenPalm), ms(300));
        assert!(!s.program().is_empty());
        s.clear_code();
        assert_eq!(s.program(), "");
        assert_eq!(s.status(), "Code cleared");
    }

    #[test]
    fn save_writes_text_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session();
        let text = "x = 1\n\tprint(x)  \n";
        let path = s.save_code(text, dir.path()).unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("handycodes_") && name.ends_with(".py"), "{}", name);
        assert_eq!(name.len(), "handycodes_20240101_120000.py".len());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
        assert_eq!(s.console(), format!("Code saved to {}", path.display()));

        // the next dispatch brings the transcript back
        s.observe(hand(Gesture::Fist), ms(0));
        s.observe(hand(Gesture::Fist), ms(300));
        assert!(s.console().starts_with(">>> fist:"));
    }

    #[test]
    fn save_into_missing_dir_fails_with_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session();
        assert!(s.save_code("x", &dir.path().join("missing")).is_err());
        assert!(s.status().starts_with("Error saving code:"));
    }

    #[test]
    fn toggle_camera_flips_state() {
        let mut s = session();
        assert!(s.camera_active());
        assert!(!s.toggle_camera());
        assert_eq!(s.status(), "Camera paused");
        assert!(s.toggle_camera());
        assert_eq!(s.status(), "Camera active");
    }
}
