//! Snippet table, accumulated program, and console transcript.

use std::collections::BTreeMap;

use hand_gesture::Gesture;

// ════════════════════════════════════════════════════════════════════════════
// SnippetMap
// ════════════════════════════════════════════════════════════════════════════

/// Gesture → literal code.  Built once at startup, read-only afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct SnippetMap {
    entries: BTreeMap<Gesture, String>,
}

impl Default for SnippetMap {
    fn default() -> Self {
        let entries = Gesture::ALL
            .into_iter()
            .map(|g| (g, Self::builtin(g).to_string()))
            .collect();
        SnippetMap { entries }
    }
}

impl SnippetMap {
    /// The built-in snippet for a gesture.
    pub fn builtin(gesture: Gesture) -> &'static str {
        match gesture {
            Gesture::OpenPalm      => "print(\"Hello World\")",
            Gesture::ThumbsUp      => "x = 10\nprint(\"Variable x set to\", x)",
            Gesture::Victory       => "x = 10\nif x > 5:\n    print(\"x is greater than 5\")",
            Gesture::PointingIndex => "for i in range(5):\n    print(\"Loop iteration\", i)",
            Gesture::Fist          => "print(\"Fist detected - Stopping execution\")",
            Gesture::ThreeFingers  => "def greet(name):\n    print(f\"Hello, {name}!\")\n\ngreet(\"User\")",
        }
    }

    /// The built-in table with some entries replaced.  An empty override
    /// removes the gesture from the map.
    pub fn with_overrides<'a, I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a Gesture, &'a String)>,
    {
        let mut map = SnippetMap::default();
        for (g, code) in overrides {
            if code.is_empty() {
                map.entries.remove(g);
            } else {
                map.entries.insert(*g, code.clone());
            }
        }
        map
    }

    pub fn get(&self, gesture: Gesture) -> Option<&str> {
        self.entries.get(&gesture).map(String::as_str)
    }

    /// Gestures that have a snippet, in enum order.
    pub fn gestures(&self) -> impl Iterator<Item = Gesture> + '_ {
        self.entries.keys().copied()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ProgramBuffer
// ════════════════════════════════════════════════════════════════════════════

/// Every snippet dispatched this session, each followed by a newline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgramBuffer {
    text:   String,
    pieces: usize,
}

impl ProgramBuffer {
    pub fn append(&mut self, snippet: &str) {
        self.text.push_str(snippet);
        self.text.push('\n');
        self.pieces += 1;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.pieces = 0;
    }

    pub fn text(&self) -> &str { &self.text }

    /// Number of snippets appended since the last clear.
    pub fn len(&self) -> usize { self.pieces }

    pub fn is_empty(&self) -> bool { self.pieces == 0 }
}

// ════════════════════════════════════════════════════════════════════════════
// Transcript
// ════════════════════════════════════════════════════════════════════════════

/// Console text shown beside the editor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transcript {
    text: String,
}

impl Transcript {
    /// Append the result of a gesture-triggered run.
    pub fn record(&mut self, label: &str, output: &str) {
        self.text.push_str(&format!(">>> {}:\n{}\n", label, output));
    }

    /// Replace everything, as a manual run does.
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str { &self.text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn victory_snippet_verbatim() {
        let map = SnippetMap::default();
        assert_eq!(
            map.get(Gesture::Victory),
            Some("x = 10\nif x > 5:\n    print(\"x is greater than 5\")"),
        );
    }

    #[test]
    fn default_map_covers_every_gesture() {
        let map = SnippetMap::default();
        assert_eq!(map.gestures().count(), Gesture::ALL.len());
    }

    #[test]
    fn overrides_replace_and_remove() {
        let mut o = BTreeMap::new();
        o.insert(Gesture::Fist, "print('stop')".to_string());
        o.insert(Gesture::OpenPalm, String::new());
        let map = SnippetMap::with_overrides(&o);
        assert_eq!(map.get(Gesture::Fist), Some("print('stop')"));
        assert_eq!(map.get(Gesture::OpenPalm), None);
        assert_eq!(map.get(Gesture::ThumbsUp), Some(SnippetMap::builtin(Gesture::ThumbsUp)));
    }

    #[test]
    fn buffer_appends_with_separator() {
        let mut b = ProgramBuffer::default();
        b.append("a = 1");
        b.append("print(a)");
        assert_eq!(b.text(), "a = 1\nprint(a)\n");
        assert_eq!(b.len(), 2);
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.text(), "");
    }

    #[test]
    fn transcript_record_format() {
        let mut t = Transcript::default();
        t.record("fist", "done\n");
        assert_eq!(t.text(), ">>> fist:\ndone\n\n");
        t.replace("fresh");
        assert_eq!(t.text(), "fresh");
    }
}
