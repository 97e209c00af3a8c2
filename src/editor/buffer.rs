use ropey::{Rope, RopeSlice};

use super::position::Position;

/// A text buffer backed by a rope data structure.
///
/// All offsets are char indices into the rope. Lines are addressed without
/// their terminator; the buffer recognises the same line breaks ropey does
/// (LF, CRLF, CR and the Unicode separators).
pub struct EditorBuffer {
    rope: Rope,
    dirty: bool,
}

impl EditorBuffer {
    /// Create a new buffer from a string.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            dirty: false,
        }
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// Whether the buffer has been modified since creation or last save.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the buffer as clean (e.g., after saving).
    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total number of chars in the buffer.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Get the content of a line (without its line terminator).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(line_idx);
        Some(line.slice(..content_len(line)).to_string())
    }

    /// Length of a line in chars (without its line terminator).
    pub fn line_len(&self, line_idx: usize) -> usize {
        if line_idx >= self.rope.len_lines() {
            return 0;
        }
        content_len(self.rope.line(line_idx))
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// The text between two char offsets.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.rope.len_chars());
        let start = start.min(end);
        self.rope.slice(start..end).to_string()
    }

    /// Convert a position to a char offset.
    ///
    /// Returns `None` when the line does not exist or the character lies past
    /// the end of the line's content.
    pub fn position_to_char(&self, position: Position) -> Option<usize> {
        if position.line >= self.rope.len_lines() {
            return None;
        }
        if position.character > self.line_len(position.line) {
            return None;
        }
        Some(self.rope.line_to_char(position.line) + position.character)
    }

    /// Convert a char offset to a position, clamping to the end of the buffer.
    pub fn char_to_position(&self, char_idx: usize) -> Position {
        let char_idx = char_idx.min(self.rope.len_chars());
        let line = self.rope.char_to_line(char_idx);
        Position::new(line, char_idx - self.rope.line_to_char(line))
    }

    /// Move an offset that splits a CRLF pair back to before the `\r`.
    ///
    /// Every other offset is returned unchanged (clamped to the buffer).
    pub fn align_to_line_break(&self, char_idx: usize) -> usize {
        let char_idx = char_idx.min(self.rope.len_chars());
        if char_idx > 0
            && char_idx < self.rope.len_chars()
            && self.rope.char(char_idx - 1) == '\r'
            && self.rope.char(char_idx) == '\n'
        {
            char_idx - 1
        } else {
            char_idx
        }
    }

    /// Replace the chars in `[start, end)` with `text`.
    ///
    /// Returns the number of chars inserted.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> usize {
        if start < end {
            self.rope.remove(start..end);
        }
        let inserted = text.chars().count();
        if inserted > 0 {
            self.rope.insert(start, text);
        }
        if start < end || inserted > 0 {
            self.dirty = true;
        }
        inserted
    }
}

/// Number of chars in `line` before its terminator.
fn content_len(line: RopeSlice<'_>) -> usize {
    let len = line.len_chars();
    if len == 0 {
        return 0;
    }
    match line.char(len - 1) {
        '\n' if len >= 2 && line.char(len - 2) == '\r' => len - 2,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}' => len - 1,
        _ => len,
    }
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("dirty", &self.dirty)
            .finish()
    }
}
