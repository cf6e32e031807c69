//! Software-rendered window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ Camera: 0   Ctrl+R run  Ctrl+L clear  Ctrl+S save  …                 │
//! ├──────────────────────────────────┬───────────────────────────────────┤
//! │ CODE EDITOR                      │ CONSOLE OUTPUT                    │
//! │  1 │ x = 10                       │ >>> victory:                      │
//! │  2 │ if x > 5:                    │ x is greater than 5               │
//! │  3 │     print("x is …")          │                                   │
//! ├──────────────┬───────────────────┴───────────────────────────────────┤
//! │ [camera +    │  GESTURE GUIDE                                         │
//! │  skeleton]   │  F1 open_palm  F2 thumbs_up  …                         │
//! ├──────────────┴────────────────────────────────────────────────────────┤
//! │ status bar                                                            │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;
use hand_gesture::{Gesture, Point, HAND_CONNECTIONS};
use minifb::{InputCallback, Key, KeyRepeat, Window, WindowOptions};

use crate::editor::Editor;
use crate::font::{glyph, GLYPH_H, GLYPH_W};
use crate::highlight::{classify_bytes, TokenKind};
use crate::pose::HandPose;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 1000;
pub const WIN_H:       usize = 700;
const SCALE:           usize = 2;
const CHAR_W:          usize = (GLYPH_W + 1) * SCALE;
const LINE_H:          usize = (GLYPH_H + 2) * SCALE;
const BAR_H:           usize = 30;
const PANEL_Y:         usize = 40;
const PANEL_H:         usize = 420;
const EDITOR_X:        usize = 10;
const PANEL_W:         usize = 485;
const CONSOLE_X:       usize = 505;
const TITLE_H:         usize = 20;
const GUTTER_W:        usize = 5 * CHAR_W;
const PREVIEW:         Rect  = Rect { x: 10, y: 475, w: 320, h: 180 };
const GUIDE_X:         usize = 350;
const STATUS_Y:        usize = WIN_H - 32;

const BG_COLOR:        u32 = 0xFF0F1419;
const BAR_BG:          u32 = 0xFF1F2430;
const CONSOLE_BG:      u32 = 0xFF131721;
const TEXT_COLOR:      u32 = 0xFFE6E1CF;
const GUTTER_COLOR:    u32 = 0xFF5C6773;
const STRING_COLOR:    u32 = 0xFFC2D94C;
const KEYWORD_COLOR:   u32 = 0xFFFF8F40;
const LIVE_COLOR:      u32 = 0xFFFFD700;
const BONE_COLOR:      u32 = 0xFF39BAE6;
const JOINT_COLOR:     u32 = 0xFFF07178;
const PREVIEW_BG:      u32 = 0xFF0B0E14;

/// Keys F1–F6 hold the poses for `Gesture::ALL` in order; F7 holds the
/// ambiguous pose.
const POSE_KEYS: [Key; 7] = [Key::F1, Key::F2, Key::F3, Key::F4, Key::F5, Key::F6, Key::F7];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

// ════════════════════════════════════════════════════════════════════════════
// Input
// ════════════════════════════════════════════════════════════════════════════

/// Editing keystrokes for the code pane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKey {
    Char(char),
    Newline,
    Tab,
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
}

/// A user action decoded from the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiCommand {
    Run,
    Clear,
    Save,
    ToggleCamera,
    PrevCamera,
    NextCamera,
    Edit(EditKey),
    Quit,
}

/// Everything read from the window in one poll.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UiInput {
    pub commands: Vec<UiCommand>,
    /// Simulated pose held down right now.
    pub pose:     Option<HandPose>,
}

/// Collects typed characters from minifb's text callback.
struct CharQueue(Rc<RefCell<Vec<char>>>);

impl InputCallback for CharQueue {
    fn add_char(&mut self, uni_char: u32) {
        if let Some(c) = char::from_u32(uni_char) {
            if !c.is_control() {
                self.0.borrow_mut().push(c);
            }
        }
    }
}

/// The pose bound to the `n`th pose key.
pub fn pose_for_key(n: usize) -> Option<HandPose> {
    match Gesture::ALL.get(n) {
        Some(&g) => Some(HandPose::for_gesture(g)),
        None if n == Gesture::ALL.len() => Some(HandPose::ambiguous()),
        None => None,
    }
}

/// Label of the key that holds `gesture`'s pose.
pub fn key_label(gesture: Gesture) -> String {
    let n = Gesture::ALL.iter().position(|&g| g == gesture).unwrap_or(0);
    format!("F{}", n + 1)
}

// ════════════════════════════════════════════════════════════════════════════
// View: what one frame shows
// ════════════════════════════════════════════════════════════════════════════

pub struct View<'a> {
    pub editor:        &'a Editor,
    pub console:       &'a str,
    pub status:        &'a str,
    pub camera_label:  &'a str,
    /// Width and height of the last frame read.
    pub frame_size:    Option<(u32, u32)>,
    pub camera_active: bool,
    pub hands:         &'a [Vec<Point>],
    /// Last gesture that fired.
    pub displayed:     Option<Gesture>,
    /// Label of the hand in view right now.
    pub live:          Option<Gesture>,
    /// Gestures with a snippet, for the guide.
    pub guide:         &'a [Gesture],
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    typed:  Rc<RefCell<Vec<char>>>,
    tick:   u64,
}

impl Visualizer {
    pub fn new() -> anyhow::Result<Self> {
        let mut window = Window::new(
            "HandyCodes - Gesture Code Editor",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| anyhow!("failed to open window: {}", e))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        let typed = Rc::new(RefCell::new(Vec::new()));
        window.set_input_callback(Box::new(CharQueue(Rc::clone(&typed))));

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            typed,
            tick: 0,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Decode keyboard state into commands and the held pose.
    pub fn poll_input(&mut self) -> UiInput {
        let mut input = UiInput::default();
        let typed: Vec<char> = self.typed.borrow_mut().drain(..).collect();

        let ctrl = self.window.is_key_down(Key::LeftCtrl)
                || self.window.is_key_down(Key::RightCtrl);

        // Keys that trigger on first press only
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        // Keys that repeat while held
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(Key::Escape) {
            input.commands.push(UiCommand::Quit);
            return input;
        }

        if ctrl {
            if one_shot(Key::R) { input.commands.push(UiCommand::Run); }
            if one_shot(Key::L) { input.commands.push(UiCommand::Clear); }
            if one_shot(Key::S) { input.commands.push(UiCommand::Save); }
            if one_shot(Key::P) { input.commands.push(UiCommand::ToggleCamera); }
        } else {
            input.commands.extend(typed.into_iter().map(|c| UiCommand::Edit(EditKey::Char(c))));
        }

        if one_shot(Key::F9)  { input.commands.push(UiCommand::PrevCamera); }
        if one_shot(Key::F10) { input.commands.push(UiCommand::NextCamera); }

        let edits = [
            (Key::Enter,     EditKey::Newline),
            (Key::Tab,       EditKey::Tab),
            (Key::Backspace, EditKey::Backspace),
            (Key::Delete,    EditKey::Delete),
            (Key::Left,      EditKey::Left),
            (Key::Right,     EditKey::Right),
            (Key::Home,      EditKey::Home),
            (Key::End,       EditKey::End),
        ];
        for (key, edit) in edits {
            if held(key) { input.commands.push(UiCommand::Edit(edit)); }
        }

        input.pose = POSE_KEYS
            .iter()
            .position(|&k| self.window.is_key_down(k))
            .and_then(pose_for_key);

        input
    }

    /// Render one frame.
    pub fn render(&mut self, view: &View<'_>) {
        self.tick = self.tick.wrapping_add(1);
        self.buf.fill(BG_COLOR);

        // ── Control bar ───────────────────────────────────────────────────
        self.fill_rect(0, 0, WIN_W, BAR_H, BAR_BG);
        let bar = format!(
            "Camera: {}   Ctrl+R run  Ctrl+L clear  Ctrl+S save  Ctrl+P {}  F9/F10 camera  Esc quit",
            view.camera_label,
            if view.camera_active { "pause" } else { "resume" },
        );
        self.draw_text(&bar, 10, 10, TEXT_COLOR);

        // ── Editor and console ────────────────────────────────────────────
        self.draw_text("CODE EDITOR", EDITOR_X, PANEL_Y, TEXT_COLOR);
        self.draw_editor(view.editor);

        self.draw_text("CONSOLE OUTPUT", CONSOLE_X, PANEL_Y, TEXT_COLOR);
        self.draw_console(view.console);

        // ── Camera preview ────────────────────────────────────────────────
        self.draw_preview(view);

        // ── Gesture guide ─────────────────────────────────────────────────
        self.draw_guide(view.guide, view.live);

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, BAR_BG);
        self.draw_text(view.status, 10, STATUS_Y + 11, TEXT_COLOR);

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Editor ────────────────────────────────────────────────────────────

    fn draw_editor(&mut self, editor: &Editor) {
        let body_y = PANEL_Y + TITLE_H;
        let body_h = PANEL_H - TITLE_H;
        self.fill_rect(EDITOR_X, body_y, GUTTER_W, body_h, BAR_BG);

        let rows = body_h / LINE_H;
        let cols = (PANEL_W - GUTTER_W - 8) / CHAR_W;
        let (cur_line, cur_col) = editor.cursor_line_col();
        let first = scroll_start(cur_line, rows);

        let text = editor.text();
        let kinds = classify_bytes(text);
        let text_x = EDITOR_X + GUTTER_W + 6;

        let mut offset = 0usize;
        for (n, line) in editor.lines().into_iter().enumerate() {
            let line_start = offset;
            offset += line.len() + 1;
            if n < first { continue; }
            if n >= first + rows { break; }

            let y = body_y + (n - first) * LINE_H + 4;
            self.draw_text(&format!("{:>3}", n + 1), EDITOR_X + 4, y, GUTTER_COLOR);

            for (col, (i, c)) in line.char_indices().enumerate() {
                if col >= cols { break; }
                let color = match kinds[line_start + i] {
                    Some(TokenKind::Str)         => STRING_COLOR,
                    Some(TokenKind::Conditional) => KEYWORD_COLOR,
                    None                         => TEXT_COLOR,
                };
                self.draw_char(c, text_x + col * CHAR_W, y, color);
            }
        }

        // blinking caret
        if (self.tick / 30) % 2 == 0 && cur_line >= first && cur_line < first + rows && cur_col <= cols {
            let x = text_x + cur_col * CHAR_W;
            let y = body_y + (cur_line - first) * LINE_H + 2;
            self.fill_rect(x.saturating_sub(1), y, 2, LINE_H - 2, TEXT_COLOR);
        }
    }

    // ── Console ───────────────────────────────────────────────────────────

    fn draw_console(&mut self, console: &str) {
        let body_y = PANEL_Y + TITLE_H;
        let body_h = PANEL_H - TITLE_H;
        self.fill_rect(CONSOLE_X, body_y, PANEL_W, body_h, CONSOLE_BG);

        let rows = body_h / LINE_H;
        let cols = (PANEL_W - 16) / CHAR_W;
        let lines = wrap(console, cols);
        // auto-scroll to the end
        let skip = lines.len().saturating_sub(rows);
        for (i, line) in lines.iter().skip(skip).enumerate() {
            self.draw_text(line, CONSOLE_X + 8, body_y + 4 + i * LINE_H, TEXT_COLOR);
        }
    }

    // ── Camera preview ────────────────────────────────────────────────────

    fn draw_preview(&mut self, view: &View<'_>) {
        let r = PREVIEW;
        self.fill_rect(r.x, r.y, r.w, r.h, PREVIEW_BG);
        self.draw_border(r.x, r.y, r.w, r.h, GUTTER_COLOR);

        for hand in view.hands {
            for &(a, b) in HAND_CONNECTIONS.iter() {
                if let (Some(pa), Some(pb)) = (hand.get(a), hand.get(b)) {
                    let (x0, y0) = to_preview(*pa, r);
                    let (x1, y1) = to_preview(*pb, r);
                    self.draw_line(x0, y0, x1, y1, BONE_COLOR);
                }
            }
            for p in hand {
                let (x, y) = to_preview(*p, r);
                self.fill_rect_clipped(x - 2, y - 2, 5, 5, JOINT_COLOR, r);
            }
        }

        let notice = if view.camera_label.is_empty() {
            Some("NO CAMERA")
        } else if !view.camera_active {
            Some("PAUSED")
        } else if view.hands.is_empty() {
            Some("NO HAND")
        } else {
            None
        };
        if let Some((w, h)) = view.frame_size {
            let size = format!("{}x{}", w, h);
            let x = r.x + r.w - size.len() * CHAR_W - 6;
            self.draw_text(&size, x, r.y + r.h - LINE_H, GUTTER_COLOR);
        }

        if let Some(n) = notice {
            let w = n.len() * CHAR_W;
            self.draw_text(n, r.x + (r.w - w) / 2, r.y + r.h / 2 - GLYPH_H, GUTTER_COLOR);
        }

        // gesture banner, darkened over the top of the preview
        if let Some(g) = view.displayed {
            for row in r.y + 8..r.y + 32 {
                for col in r.x + 1..r.x + r.w - 1 {
                    let px = &mut self.buf[row * WIN_W + col];
                    *px = blend(*px, 0xFF1E1E1E, 0.7);
                }
            }
            self.draw_text(&format!("Gesture: {}", g), r.x + 10, r.y + 14, 0xFFFFFFFF);
        }
    }

    // ── Gesture guide ─────────────────────────────────────────────────────

    fn draw_guide(&mut self, guide: &[Gesture], live: Option<Gesture>) {
        let y0 = PREVIEW.y;
        self.draw_text("GESTURE GUIDE  (hold key to pose the simulated hand)", GUIDE_X, y0, TEXT_COLOR);
        for (i, &g) in guide.iter().enumerate() {
            let x = GUIDE_X + (i % 2) * 300;
            let y = y0 + 24 + (i / 2) * (LINE_H + 6);
            let color = if live == Some(g) { LIVE_COLOR } else { TEXT_COLOR };
            self.draw_text(&format!("{:<4}{}", key_label(g), g), x, y, color);
        }
        let y = y0 + 24 + guide.len().div_ceil(2) * (LINE_H + 6);
        self.draw_text("F7  (no gesture)", GUIDE_X, y, GUTTER_COLOR);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn fill_rect_clipped(&mut self, x: isize, y: isize, w: usize, h: usize, color: u32, clip: Rect) {
        for dy in 0..h as isize {
            for dx in 0..w as isize {
                let (px, py) = (x + dx, y + dy);
                if px >= clip.x as isize && py >= clip.y as isize
                    && px < (clip.x + clip.w) as isize && py < (clip.y + clip.h) as isize
                {
                    self.set_pixel(px as usize, py as usize, color);
                }
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for col in x..(x+w).min(WIN_W) {
            if y < WIN_H           { self.buf[y           * WIN_W + col] = color; }
            if y+h-1 < WIN_H       { self.buf[(y+h-1)     * WIN_W + col] = color; }
        }
        for row in y..(y+h).min(WIN_H) {
            if x < WIN_W           { self.buf[row * WIN_W + x    ] = color; }
            if x+w-1 < WIN_W       { self.buf[row * WIN_W + x+w-1] = color; }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    /// Bresenham line, clipped to the preview.
    fn draw_line(&mut self, x0: isize, y0: isize, x1: isize, y1: isize, color: u32) {
        let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
        let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.fill_rect_clipped(x, y, 1, 1, color, PREVIEW);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    fn draw_char(&mut self, c: char, x: usize, y: usize, color: u32) {
        for (row, &bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) != 0 {
                    self.fill_rect(x + col * SCALE, y + row * SCALE, SCALE, SCALE, color);
                }
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            if cx + CHAR_W > WIN_W { break; }
            self.draw_char(ch, cx, y, color);
            cx += CHAR_W;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Layout helpers
// ════════════════════════════════════════════════════════════════════════════

/// First visible line so that `cursor_line` stays on screen.
pub fn scroll_start(cursor_line: usize, rows: usize) -> usize {
    (cursor_line + 1).saturating_sub(rows.max(1))
}

/// Hard-wrap text at `cols` characters, keeping empty lines.
pub fn wrap(text: &str, cols: usize) -> Vec<String> {
    let cols = cols.max(1);
    let mut out = Vec::new();
    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            out.push(String::new());
            continue;
        }
        for chunk in chars.chunks(cols) {
            out.push(chunk.iter().collect());
        }
    }
    out
}

/// Map a normalized landmark into preview pixel space.
pub fn to_preview(p: Point, r: Rect) -> (isize, isize) {
    let x = r.x as f32 + p.x.clamp(0.0, 1.0) * (r.w - 1) as f32;
    let y = r.y as f32 + p.y.clamp(0.0, 1.0) * (r.h - 1) as f32;
    (x.round() as isize, y.round() as isize)
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_gesture::classify;

    #[test]
    fn pose_keys_cover_every_gesture() {
        for (n, &g) in Gesture::ALL.iter().enumerate() {
            let pose = pose_for_key(n).unwrap();
            assert_eq!(classify(&pose.landmarks(0.0)), Some(g));
            assert_eq!(key_label(g), format!("F{}", n + 1));
        }
        assert_eq!(pose_for_key(6), Some(HandPose::ambiguous()));
        assert_eq!(pose_for_key(7), None);
    }

    #[test]
    fn scroll_keeps_cursor_visible() {
        assert_eq!(scroll_start(0, 28), 0);
        assert_eq!(scroll_start(27, 28), 0);
        assert_eq!(scroll_start(28, 28), 1);
        assert_eq!(scroll_start(5, 0), 5);
    }

    #[test]
    fn wrap_splits_long_lines() {
        assert_eq!(wrap("abcdef\n\nxy", 4), vec!["abcd", "ef", "", "xy"]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn preview_mapping_clamps() {
        let r = Rect { x: 10, y: 20, w: 101, h: 51 };
        assert_eq!(to_preview(Point::new(0.0, 0.0), r), (10, 20));
        assert_eq!(to_preview(Point::new(1.0, 1.0), r), (110, 70));
        assert_eq!(to_preview(Point::new(2.0, -1.0), r), (110, 20));
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
    }
}
