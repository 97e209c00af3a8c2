//! The text document: rope content, version counter and decorations.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::buffer::EditorBuffer;
use super::decorations::{Decoration, DecorationId, DecorationStore, EditorDecoration, OffsetEdit};
use super::position::{Position, Range};
use super::{Disposable, Saveable, TextEditorDocument};
use crate::error::{EditorError, EditorResult};

/// A replacement of `range` by `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

impl TextEdit {
    pub fn replace(range: Range, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    pub fn insert(position: Position, new_text: impl Into<String>) -> Self {
        Self::replace(Range::empty_at(position), new_text)
    }

    pub fn delete(range: Range) -> Self {
        Self::replace(range, String::new())
    }
}

/// One applied replacement, in the coordinates of the text it was applied to.
///
/// `range_length` is the number of chars `range` spanned before the edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentContentChangeDelta {
    pub range: Range,
    pub range_length: usize,
    pub text: String,
}

/// A delta together with the offsets used to move anchors through it.
#[derive(Debug, Clone)]
pub(crate) struct AppliedEdit {
    pub delta: TextDocumentContentChangeDelta,
    pub offsets: OffsetEdit,
}

/// Build a `file://` URI for a path.
pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Resolve a `file://` URI, or a bare path, to a filesystem path.
pub fn path_from_uri(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

/// A document opened from a URI.
#[derive(Debug)]
pub struct TextDocument {
    uri: String,
    path: Option<PathBuf>,
    buffer: EditorBuffer,
    decorations: DecorationStore,
    version: u64,
    disposed: bool,
}

impl TextDocument {
    /// Create an in-memory document with no file behind it.
    pub fn new(uri: impl Into<String>, text: &str) -> Self {
        Self {
            uri: uri.into(),
            path: None,
            buffer: EditorBuffer::from_text(text),
            decorations: DecorationStore::new(),
            version: 1,
            disposed: false,
        }
    }

    /// Load a document from disk.
    ///
    /// # Errors
    /// Returns [`EditorError::Io`] if the file cannot be read.
    pub fn open(path: impl AsRef<Path>) -> EditorResult<Self> {
        let path = path
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        let text = fs::read_to_string(&path)?;
        tracing::info!(path = %path.display(), "opened document");
        let mut document = Self::new(file_uri(&path), &text);
        document.path = Some(path);
        Ok(document)
    }

    /// The file this document saves to, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Validate a position and convert it to a char offset.
    ///
    /// # Errors
    /// Returns [`EditorError::InvalidPosition`] if the position does not
    /// address the document.
    pub fn offset_at(&self, position: Position) -> EditorResult<usize> {
        self.buffer
            .position_to_char(position)
            .ok_or(EditorError::InvalidPosition {
                position,
                reason: "position lies outside the document",
            })
    }

    /// Validate a range and convert it to char offsets.
    ///
    /// # Errors
    /// Returns [`EditorError::InvalidRange`] if the range is inverted or
    /// either end lies outside the document.
    pub fn offsets_of(&self, range: Range) -> EditorResult<(usize, usize)> {
        if !range.is_well_formed() {
            return Err(EditorError::InvalidRange {
                range,
                reason: "end precedes start",
            });
        }
        let start = self
            .buffer
            .position_to_char(range.start)
            .ok_or(EditorError::InvalidRange {
                range,
                reason: "start lies outside the document",
            })?;
        let end = self
            .buffer
            .position_to_char(range.end)
            .ok_or(EditorError::InvalidRange {
                range,
                reason: "end lies outside the document",
            })?;
        Ok((start, end))
    }

    /// Char offset of the nearest valid position to `position`.
    pub fn clamped_offset(&self, position: Position) -> usize {
        let last_line = self.buffer.line_count().saturating_sub(1);
        let line = position.line.min(last_line);
        let character = position.character.min(self.buffer.line_len(line));
        self.buffer
            .position_to_char(Position::new(line, character))
            .unwrap_or_else(|| self.buffer.len_chars())
    }

    /// Offset moved off the middle of a CRLF pair, if it splits one.
    pub fn align_offset(&self, offset: usize) -> usize {
        self.buffer.align_to_line_break(offset)
    }

    pub fn position_at(&self, offset: usize) -> Position {
        self.buffer.char_to_position(offset)
    }

    pub fn line_len(&self, line: usize) -> usize {
        if self.disposed {
            return 0;
        }
        self.buffer.line_len(line)
    }

    /// Apply a batch of edits as one transaction.
    ///
    /// Every range is validated before anything changes. Overlapping ranges
    /// reject the whole batch. Edits are applied from the end of the
    /// document backwards, so the returned deltas can be replayed in order.
    ///
    /// # Errors
    /// Returns [`EditorError::DisposedState`], [`EditorError::InvalidRange`]
    /// or [`EditorError::OverlappingEdits`]; the document is unchanged in
    /// every error case.
    pub(crate) fn apply_edits(&mut self, edits: &[TextEdit]) -> EditorResult<Vec<AppliedEdit>> {
        self.ensure_live()?;
        let mut resolved = edits
            .iter()
            .map(|edit| self.offsets_of(edit.range).map(|(s, e)| (s, e, edit)))
            .collect::<EditorResult<Vec<_>>>()?;
        resolved.sort_by_key(|(start, end, _)| (*start, *end));
        for pair in resolved.windows(2) {
            let (_, prev_end, prev) = pair[0];
            let (next_start, _, next) = pair[1];
            if next_start < prev_end {
                return Err(EditorError::OverlappingEdits {
                    first: prev.range,
                    second: next.range,
                });
            }
        }
        if resolved.is_empty() {
            return Ok(Vec::new());
        }

        let mut applied = Vec::with_capacity(resolved.len());
        for (start, end, edit) in resolved.into_iter().rev() {
            let inserted = self.buffer.replace(start, end, &edit.new_text);
            let offsets = OffsetEdit {
                start,
                old_end: end,
                inserted,
            };
            self.decorations.apply_edit(offsets);
            applied.push(AppliedEdit {
                delta: TextDocumentContentChangeDelta {
                    range: edit.range,
                    range_length: end - start,
                    text: edit.new_text.clone(),
                },
                offsets,
            });
        }
        let buffer = &self.buffer;
        self.decorations
            .realign(|offset| buffer.align_to_line_break(offset));
        self.version += 1;
        tracing::debug!(
            uri = %self.uri,
            version = self.version,
            edits = applied.len(),
            "applied edits"
        );
        Ok(applied)
    }

    /// Remove `old` decorations and install `new` ones atomically.
    ///
    /// # Errors
    /// Returns [`EditorError::DisposedState`] on a disposed document, or
    /// [`EditorError::InvalidRange`] if any new range is invalid, in which
    /// case no decoration is removed.
    pub fn delta_decorations(
        &mut self,
        old: &[DecorationId],
        new: &[EditorDecoration],
    ) -> EditorResult<Vec<DecorationId>> {
        self.ensure_live()?;
        let resolved = new
            .iter()
            .map(|decoration| {
                self.offsets_of(decoration.range)
                    .map(|(start, end)| (start, end, decoration.options.clone()))
            })
            .collect::<EditorResult<Vec<_>>>()?;
        Ok(self.decorations.delta(old, resolved))
    }

    /// Current range of a decoration, or `None` if it is unknown or removed.
    pub fn decoration_range(&self, id: &DecorationId) -> Option<Range> {
        if self.disposed {
            return None;
        }
        let (start, end) = self.decorations.offsets_of(id)?;
        Some(Range::new(
            self.buffer.char_to_position(start),
            self.buffer.char_to_position(end),
        ))
    }

    /// Decorations touching any line in `[start_line, end_line]`.
    pub fn decorations_in_lines(&self, start_line: usize, end_line: usize) -> Vec<Decoration> {
        self.collect_decorations(|range| range.overlaps_lines(start_line, end_line))
    }

    /// Every installed decoration, ordered by position.
    pub fn all_decorations(&self) -> Vec<Decoration> {
        self.collect_decorations(|_| true)
    }

    pub fn decoration_count(&self) -> usize {
        self.decorations.len()
    }

    fn collect_decorations(&self, keep: impl Fn(&Range) -> bool) -> Vec<Decoration> {
        if self.disposed {
            return Vec::new();
        }
        self.decorations
            .iter()
            .filter_map(|(id, start, end, options)| {
                let range = Range::new(
                    self.buffer.char_to_position(start),
                    self.buffer.char_to_position(end),
                );
                keep(&range).then(|| Decoration {
                    id,
                    range,
                    options: options.clone(),
                })
            })
            .collect()
    }

    fn ensure_live(&self) -> EditorResult<()> {
        if self.disposed {
            return Err(EditorError::DisposedState {
                uri: self.uri.clone(),
            });
        }
        Ok(())
    }
}

impl TextEditorDocument for TextDocument {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn line_count(&self) -> usize {
        if self.disposed {
            return 0;
        }
        self.buffer.line_count()
    }

    fn get_line_content(&self, line: usize) -> Option<String> {
        if self.disposed {
            return None;
        }
        self.buffer.line_at(line)
    }

    fn text(&self) -> String {
        if self.disposed {
            return String::new();
        }
        self.buffer.text()
    }

    fn get_text(&self, range: Range) -> EditorResult<String> {
        if self.disposed {
            return Ok(String::new());
        }
        let (start, end) = self.offsets_of(range)?;
        Ok(self.buffer.slice(start, end))
    }
}

impl Saveable for TextDocument {
    fn is_dirty(&self) -> bool {
        !self.disposed && self.buffer.is_dirty()
    }

    fn save(&mut self) -> EditorResult<()> {
        self.ensure_live()?;
        let path = self.path.as_ref().ok_or_else(|| EditorError::NoSaveTarget {
            uri: self.uri.clone(),
        })?;
        fs::write(path, self.buffer.text())?;
        self.buffer.mark_clean();
        tracing::info!(path = %path.display(), version = self.version, "saved document");
        Ok(())
    }
}

impl Disposable for TextDocument {
    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.decorations.clear();
        self.buffer = EditorBuffer::empty();
        tracing::debug!(uri = %self.uri, "disposed document");
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}
