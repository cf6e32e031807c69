//! Minimal syntax highlighting for the editor pane.
//!
//! Two classes only: control-flow keywords and quoted string literals.
//! String literals are found first and keywords inside them are dropped.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Conditional,
    Str,
}

/// A highlighted byte range of the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub range: Range<usize>,
    pub kind:  TokenKind,
}

fn keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:if|else|elif|for|while|try|except)\b").expect("static regex")
    })
}

fn string_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""[^"\\\n]*(?:\\.[^"\\\n]*)*"|'[^'\\\n]*(?:\\.[^'\\\n]*)*'"#)
            .expect("static regex")
    })
}

/// Highlight spans in source order.
pub fn highlight(text: &str) -> Vec<Span> {
    let mut spans: Vec<Span> = string_re()
        .find_iter(text)
        .map(|m| Span { range: m.range(), kind: TokenKind::Str })
        .collect();

    let keywords: Vec<Span> = keyword_re()
        .find_iter(text)
        .filter(|m| !spans.iter().any(|s| s.range.start <= m.start() && m.end() <= s.range.end))
        .map(|m| Span { range: m.range(), kind: TokenKind::Conditional })
        .collect();

    spans.extend(keywords);
    spans.sort_by_key(|s| s.range.start);
    spans
}

/// Per-byte token kind, for renderers that walk the text one char at a time.
pub fn classify_bytes(text: &str) -> Vec<Option<TokenKind>> {
    let mut kinds = vec![None; text.len()];
    for span in highlight(text) {
        for k in &mut kinds[span.range] {
            *k = Some(span.kind);
        }
    }
    kinds
}
