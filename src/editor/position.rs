use std::fmt;

use serde::{Deserialize, Serialize};

/// A zero-based (line, character) location in a document.
///
/// `character` counts Unicode scalar values from the start of the line and
/// never includes the line terminator. Ordering is line-major.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based character offset within the line.
    pub character: usize,
}

impl Position {
    /// Create a position at the given line and character.
    pub const fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }

    /// The start of the document.
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

/// An ordered pair of positions.
///
/// Construction is unchecked so ranges can come straight from scripts or
/// peers; every operation that consumes a range validates it first and fails
/// with [`EditorError::InvalidRange`](crate::error::EditorError::InvalidRange)
/// when `end` precedes `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a range from two positions without validating their order.
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Shorthand for `Range::new(Position::new(..), Position::new(..))`.
    pub const fn at(
        start_line: usize,
        start_character: usize,
        end_line: usize,
        end_character: usize,
    ) -> Self {
        Self::new(
            Position::new(start_line, start_character),
            Position::new(end_line, end_character),
        )
    }

    /// An empty range located at `position`.
    pub const fn empty_at(position: Position) -> Self {
        Self::new(position, position)
    }

    /// Whether `start <= end`.
    pub fn is_well_formed(&self) -> bool {
        self.start <= self.end
    }

    /// Whether the range spans no characters.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `position` lies within the range (both ends inclusive).
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    /// Whether the range touches any line in `[start_line, end_line]`.
    pub const fn overlaps_lines(&self, start_line: usize, end_line: usize) -> bool {
        self.start.line <= end_line && self.end.line >= start_line
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
