//! # snippet_runner
//!
//! Turns debounced gestures into code: each gesture owns a fixed snippet,
//! which is appended to the accumulated program and run by an external
//! [`Evaluator`].  Captured output (or the error text) is appended to a
//! console transcript.
//!
//! No sandbox is provided.  The default [`PythonEvaluator`] runs code with
//! the full rights of the current user.
//!
//! ```rust,no_run
//! use hand_gesture::Gesture;
//! use snippet_runner::{Dispatcher, PythonEvaluator, SnippetMap};
//!
//! let mut d = Dispatcher::new(SnippetMap::default(), PythonEvaluator::default());
//! d.dispatch(Gesture::OpenPalm);
//! assert_eq!(d.transcript().text(), ">>> open_palm:\nHello World\n\n");
//! ```

pub mod snippets;
pub mod eval;
pub mod dispatch;

pub use snippets::{SnippetMap, ProgramBuffer, Transcript};
pub use eval::{Evaluator, EvalError, PythonEvaluator};
pub use dispatch::{Dispatcher, Dispatched};
