//! Code evaluation via an external interpreter.
//!
//! The interpreter runs as a child process with `-c <code>`; its stdout is
//! the captured output.  Both pipes are drained on helper threads so a
//! chatty program cannot fill a pipe and stall.  One deadline covers both
//! the child's exit and the pipes closing: a background grandchild that
//! keeps a pipe open counts as running, and is abandoned at the timeout.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

/// Anything that can run a piece of code and capture what it prints.
pub trait Evaluator {
    fn evaluate(&mut self, code: &str) -> Result<String, EvalError>;
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(&mut self, code: &str) -> Result<String, EvalError> {
        (**self).evaluate(code)
    }
}

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The program ran and failed; the message is its last stderr line.
    #[error("{0}")]
    Failed(String),

    #[error("timed out after {} s", .0.as_secs_f64())]
    TimedOut(Duration),

    #[error("i/o error while running code: {0}")]
    Io(#[from] io::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// PythonEvaluator
// ════════════════════════════════════════════════════════════════════════════

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Runs code with an interpreter that accepts `-c <code>` (`python3` by
/// default).
#[derive(Clone, Debug)]
pub struct PythonEvaluator {
    pub interpreter: PathBuf,
    pub timeout:     Duration,
}

impl Default for PythonEvaluator {
    fn default() -> Self {
        PythonEvaluator {
            interpreter: PathBuf::from("python3"),
            timeout:     Duration::from_secs(5),
        }
    }
}

impl PythonEvaluator {
    pub fn new(interpreter: impl Into<PathBuf>, timeout: Duration) -> Self {
        PythonEvaluator { interpreter: interpreter.into(), timeout }
    }
}

impl Evaluator for PythonEvaluator {
    fn evaluate(&mut self, code: &str) -> Result<String, EvalError> {
        let program = self.interpreter.display().to_string();
        let mut child = Command::new(&self.interpreter)
            .arg("-c")
            .arg(code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EvalError::Spawn { program: program.clone(), source })?;

        let (tx, rx) = mpsc::channel();
        if let Some(pipe) = child.stdout.take() { drain(Pipe::Stdout, pipe, tx.clone()); }
        if let Some(pipe) = child.stderr.take() { drain(Pipe::Stderr, pipe, tx.clone()); }
        drop(tx);

        // `None` when the timeout is too large to represent: wait forever.
        let deadline = Instant::now().checked_add(self.timeout);
        let expired = || deadline.is_some_and(|d| Instant::now() >= d);

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if expired() {
                warn!(%program, timeout = ?self.timeout, "evaluation timed out, killing child");
                let _ = child.kill();
                let _ = child.wait();
                return Err(EvalError::TimedOut(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        // Both senders drop once their pipe reaches EOF.
        let (mut out, mut err) = (String::new(), String::new());
        loop {
            let received = match deadline {
                Some(d) => rx.recv_timeout(d.saturating_duration_since(Instant::now())),
                None    => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok((Pipe::Stdout, text)) => out = text,
                Ok((Pipe::Stderr, text)) => err = text,
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    warn!(%program, timeout = ?self.timeout, "output still open at deadline, giving up on it");
                    return Err(EvalError::TimedOut(self.timeout));
                }
            }
        }
        debug!(%program, %status, stdout_len = out.len(), "evaluation finished");

        if status.success() {
            Ok(out)
        } else {
            let msg = err
                .lines()
                .rev()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} exited with {}", program, status));
            Err(EvalError::Failed(msg))
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Pipe { Stdout, Stderr }

fn drain<R: Read + Send + 'static>(which: Pipe, mut pipe: R, tx: Sender<(Pipe, String)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((which, String::from_utf8_lossy(&buf).into_owned()));
    });
}

// ════════════════════════════════════════════════════════════════════════════
// Tests: `sh` stands in for the interpreter, it takes `-c` too
// ════════════════════════════════════════════════════════════════════════════
