//! Snippet dispatcher: gesture → program buffer → evaluator → transcript.

use hand_gesture::Gesture;
use tracing::{debug, info};

use crate::eval::Evaluator;
use crate::snippets::{ProgramBuffer, SnippetMap, Transcript};

/// What one dispatch did.
#[derive(Clone, Debug, PartialEq)]
pub struct Dispatched {
    pub gesture: Gesture,
    pub snippet: String,
    /// Captured stdout, or `Error: …` text.
    pub output:  String,
    pub ok:      bool,
}

/// Owns the snippet table, the accumulated program and the transcript.
pub struct Dispatcher<E> {
    snippets:   SnippetMap,
    program:    ProgramBuffer,
    transcript: Transcript,
    evaluator:  E,
}

impl<E: Evaluator> Dispatcher<E> {
    pub fn new(snippets: SnippetMap, evaluator: E) -> Self {
        Dispatcher {
            snippets,
            program:    ProgramBuffer::default(),
            transcript: Transcript::default(),
            evaluator,
        }
    }

    /// Append and run the snippet for `gesture`.  Returns `None` when the
    /// gesture has no snippet.  Evaluation errors end up in the transcript,
    /// never in the return type.
    pub fn dispatch(&mut self, gesture: Gesture) -> Option<Dispatched> {
        let snippet = self.snippets.get(gesture)?.to_string();
        self.program.append(&snippet);

        let (output, ok) = self.run(&snippet);
        self.transcript.record(gesture.name(), &output);
        info!(%gesture, ok, "snippet dispatched");

        Some(Dispatched { gesture, snippet, output, ok })
    }

    /// Run arbitrary text (the editor contents).  The transcript is replaced
    /// by the result.  Returns whether evaluation succeeded.
    pub fn run_program(&mut self, code: &str) -> bool {
        let (output, ok) = self.run(code);
        self.transcript.replace(output);
        ok
    }

    /// Empty the accumulated program.  The transcript is kept.
    pub fn clear(&mut self) {
        self.program.clear();
    }

    fn run(&mut self, code: &str) -> (String, bool) {
        match self.evaluator.evaluate(code) {
            Ok(out) => (out, true),
            Err(e)  => {
                debug!(error = %e, "evaluation failed");
                (format!("Error: {}", e), false)
            }
        }
    }

    pub fn snippets(&self)   -> &SnippetMap    { &self.snippets }
    pub fn program(&self)    -> &ProgramBuffer { &self.program }
    pub fn transcript(&self) -> &Transcript    { &self.transcript }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
