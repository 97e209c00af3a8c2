//! Viewport management for reveal requests.
//!
//! The [`Viewport`] struct tracks the visible area of an editor and turns
//! reveal intents into scroll offsets.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Vertical placement strategy for a reveal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevealAt {
    /// Scroll the minimum amount needed.
    #[default]
    Auto,
    /// Always center the target.
    Center,
    /// Center the target only if it is not already visible.
    CenterIfOutsideViewport,
    /// Put the target on the first visible line. Honoured for ranges only.
    Top,
}

/// Manages the visible portion of a document.
///
/// # Example
///
/// ```
/// use decor::editor::{RevealAt, Viewport};
///
/// let mut vp = Viewport::new(80, 24, 100);
/// assert_eq!(vp.visible_range(), 0..24);
///
/// vp.reveal_line(50, RevealAt::Center);
/// assert_eq!(vp.visible_range(), 38..62);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    width: u16,
    height: u16,
    offset: usize,
    column_offset: usize,
    total_lines: usize,
}

impl Viewport {
    /// Create a new viewport.
    ///
    /// # Arguments
    ///
    /// * `width` - Visible columns
    /// * `height` - Visible lines
    /// * `total_lines` - Total lines in the document
    pub const fn new(width: u16, height: u16, total_lines: usize) -> Self {
        Self {
            width,
            height,
            offset: 0,
            column_offset: 0,
            total_lines,
        }
    }

    /// Get the first visible line.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Get the first visible column.
    pub const fn column_offset(&self) -> usize {
        self.column_offset
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub const fn height(&self) -> u16 {
        self.height
    }

    pub const fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// Get the range of visible lines.
    ///
    /// Returns a range from the current offset to offset + height,
    /// clamped to the document bounds.
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.offset;
        let end = (self.offset + self.height as usize).min(self.total_lines);
        start..end
    }

    /// Whether a line is currently on screen.
    pub fn is_line_visible(&self, line: usize) -> bool {
        self.visible_range().contains(&line)
    }

    /// Put a specific line at the top of the viewport.
    pub fn go_to_line(&mut self, line: usize) {
        self.offset = line.min(self.max_offset());
    }

    /// Scroll so that `line` becomes visible.
    ///
    /// `RevealAt::Top` is treated like `Auto`; only ranges may be pinned
    /// to the top.
    pub fn reveal_line(&mut self, line: usize, at: RevealAt) {
        let at = if at == RevealAt::Top { RevealAt::Auto } else { at };
        self.reveal_lines(line, line, at);
    }

    /// Scroll so that lines `start..=end` become visible.
    pub fn reveal_lines(&mut self, start: usize, end: usize, at: RevealAt) {
        let last = self.total_lines.saturating_sub(1);
        let start = start.min(last);
        let end = end.clamp(start, last);
        let height = self.height as usize;
        let fully_visible = self.is_line_visible(start) && self.is_line_visible(end);
        match at {
            RevealAt::Auto => {
                if fully_visible {
                    return;
                }
                if start < self.offset || end - start + 1 > height {
                    self.go_to_line(start);
                } else {
                    self.go_to_line((end + 1).saturating_sub(height));
                }
            }
            RevealAt::Center => self.center_on(start, end),
            RevealAt::CenterIfOutsideViewport => {
                if !fully_visible {
                    self.center_on(start, end);
                }
            }
            RevealAt::Top => self.go_to_line(start),
        }
    }

    /// Scroll horizontally so that `column` becomes visible.
    pub fn reveal_column(&mut self, column: usize) {
        let width = self.width as usize;
        if column < self.column_offset {
            self.column_offset = column;
        } else if width > 0 && column >= self.column_offset + width {
            self.column_offset = column + 1 - width;
        }
    }

    /// Resize the viewport.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        // Clamp offset if document is now shorter than viewport
        self.offset = self.offset.min(self.max_offset());
    }

    /// Update the total number of lines (e.g., after an edit).
    pub fn set_total_lines(&mut self, total: usize) {
        self.total_lines = total;
        self.offset = self.offset.min(self.max_offset());
    }

    fn center_on(&mut self, start: usize, end: usize) {
        let middle = start + (end - start) / 2;
        let half = self.height as usize / 2;
        self.go_to_line(middle.saturating_sub(half));
    }

    /// Calculate the maximum valid offset.
    const fn max_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.height as usize)
    }
}
