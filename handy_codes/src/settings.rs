//! User settings, stored as JSON.
//!
//! Every field has a default, so a partial file (or none at all) is fine.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use hand_gesture::{Gesture, HoldConfig};
use serde::{Deserialize, Serialize};
use snippet_runner::{PythonEvaluator, SnippetMap};

pub const DEFAULT_SETTINGS_FILE: &str = "handy_codes.json";

/// Where camera frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Keyboard-driven synthetic hand.
    #[default]
    Sim,
    /// External landmark detector process.
    Sidecar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds a gesture must be held before it fires.
    pub hold_secs:         f64,
    /// Seconds between two fires.
    pub cooldown_secs:     f64,
    /// Preferred camera index.
    pub camera:            usize,
    pub backend:           Backend,
    /// Interpreter used to launch the landmark sidecar.
    pub sidecar_python:    PathBuf,
    pub sidecar_script:    PathBuf,
    /// Camera indices probed when listing devices.
    pub max_probe:         usize,
    /// Interpreter used to run snippets.
    pub interpreter:       PathBuf,
    pub eval_timeout_secs: f64,
    /// Directory that saved programs are written to.
    pub save_dir:          PathBuf,
    pub debug_logging:     bool,
    /// Per-gesture snippet replacements; an empty string disables a gesture.
    pub snippets:          BTreeMap<Gesture, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            hold_secs:         0.3,
            cooldown_secs:     1.0,
            camera:            0,
            backend:           Backend::Sim,
            sidecar_python:    PathBuf::from("python3"),
            sidecar_script:    PathBuf::from("hand_landmarks.py"),
            max_probe:         5,
            interpreter:       PathBuf::from("python3"),
            eval_timeout_secs: 5.0,
            save_dir:          PathBuf::from("."),
            debug_logging:     false,
            snippets:          BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load from `path`.  A missing or empty file yields the defaults; any
    /// other read failure is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading settings file {}", path.display()));
            }
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        settings
            .validate()
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        Ok(settings)
    }

    /// Every time setting must be a non-negative number of seconds that
    /// fits in a `Duration`.
    pub fn validate(&self) -> anyhow::Result<()> {
        let times = [
            ("hold_secs",         self.hold_secs),
            ("cooldown_secs",     self.cooldown_secs),
            ("eval_timeout_secs", self.eval_timeout_secs),
        ];
        for (name, secs) in times {
            anyhow::ensure!(secs >= 0.0, "{} must not be negative, got {}", name, secs);
            Duration::try_from_secs_f64(secs)
                .with_context(|| format!("{} is out of range: {}", name, secs))?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing settings to {}", path.display()))?;
        Ok(())
    }

    pub fn hold_config(&self) -> HoldConfig {
        HoldConfig::from_secs(self.hold_secs, self.cooldown_secs)
    }

    pub fn snippet_map(&self) -> SnippetMap {
        SnippetMap::with_overrides(&self.snippets)
    }

    pub fn evaluator(&self) -> PythonEvaluator {
        PythonEvaluator::new(
            self.interpreter.clone(),
            Duration::try_from_secs_f64(self.eval_timeout_secs.max(0.1)).unwrap_or(Duration::MAX),
        )
    }
}
