//! Editable text buffer behind the code pane.
//!
//! The cursor is a byte offset that always sits on a char boundary.

const TAB: &str = "    ";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Editor {
    text:   String,
    cursor: usize,
}

impl Editor {
    pub fn text(&self) -> &str { &self.text }

    pub fn cursor(&self) -> usize { self.cursor }

    /// Replace the contents and park the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.len();
    }

    /// Adopt `program` if it differs from what is shown, ignoring
    /// leading/trailing whitespace.  Returns whether the text changed.
    pub fn sync_from(&mut self, program: &str) -> bool {
        if self.text.trim() == program.trim() {
            return false;
        }
        self.set_text(program);
        true
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    // ── editing ───────────────────────────────────────────────────────────

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    pub fn newline(&mut self) { self.insert_char('\n'); }

    pub fn tab(&mut self) { self.insert_str(TAB); }

    pub fn backspace(&mut self) {
        if let Some(c) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
            self.text.remove(self.cursor);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    // ── movement ──────────────────────────────────────────────────────────

    pub fn left(&mut self) {
        if let Some(c) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
        }
    }

    pub fn right(&mut self) {
        if let Some(c) = self.text[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    /// Start of the current line.
    pub fn home(&mut self) {
        self.cursor = self.text[..self.cursor].rfind('\n').map_or(0, |i| i + 1);
    }

    /// End of the current line.
    pub fn end(&mut self) {
        self.cursor += self.text[self.cursor..].find('\n').unwrap_or(self.text.len() - self.cursor);
    }

    // ── layout ────────────────────────────────────────────────────────────

    /// Lines as shown, always at least one.
    pub fn lines(&self) -> Vec<&str> {
        self.text.split('\n').collect()
    }

    pub fn line_count(&self) -> usize {
        self.text.matches('\n').count() + 1
    }

    /// Zero-based (line, column-in-chars) of the cursor.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let before = &self.text[..self.cursor];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        (line, before[line_start..].chars().count())
    }
}
