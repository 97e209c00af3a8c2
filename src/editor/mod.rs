//! Headless text editor with anchored decorations.
//!
//! An editor is a view over a [`TextDocument`]: it tracks cursor, selection
//! and focus, queues reveal requests for its [`Viewport`], and applies text
//! edits while keeping decorations anchored to the text they annotate.
//!
//! Capabilities are separate traits composed by [`TextEditor`]:
//! - [`Disposable`]: idempotent teardown
//! - [`Selectable`]: cursor and selection state
//! - [`Navigatable`]: reveal requests

pub mod backend;
mod buffer;
mod decorations;
pub mod document;
mod event;
mod position;
mod provider;
mod text_editor;
mod viewport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use backend::{
    BackendError, FileReplaceBackend, NoBackend, ReplaceBackend, ReplaceOperation,
    ReplaceTextParams,
};
pub use buffer::EditorBuffer;
pub use decorations::{
    Decoration, DecorationId, DecorationOptions, DecorationStore, EditorDecoration, OffsetEdit,
    TrackedRangeStickiness,
};
pub use document::{TextDocument, TextDocumentContentChangeDelta, TextEdit};
pub use event::{Emitter, Listener, ListenerId};
pub use provider::TextEditorProvider;
pub use text_editor::DecoratedEditor;

pub use position::{Position, Range};
pub use viewport::{RevealAt, Viewport};

use crate::error::EditorResult;

/// Something that holds resources until explicitly released.
pub trait Disposable {
    /// Release resources. Calling this more than once has no further effect.
    fn dispose(&mut self);
    fn is_disposed(&self) -> bool;
}

/// Something whose changes can be persisted.
pub trait Saveable {
    fn is_dirty(&self) -> bool;
    /// # Errors
    /// Returns an error if the content cannot be written.
    fn save(&mut self) -> EditorResult<()>;
}

/// Read access to a document's text.
pub trait TextEditorDocument: Saveable + Disposable {
    fn uri(&self) -> &str;
    /// Incremented once per applied edit batch.
    fn version(&self) -> u64;
    fn line_count(&self) -> usize;
    /// Content of a line without its terminator.
    fn get_line_content(&self, line: usize) -> Option<String>;
    fn text(&self) -> String;
    /// # Errors
    /// Returns [`EditorError::InvalidRange`](crate::error::EditorError::InvalidRange)
    /// if the range does not address the document.
    fn get_text(&self, range: Range) -> EditorResult<String>;
}

/// A location in a document, used to open or navigate editors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEditorSelection {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Range>,
}

/// Cursor and selection state.
///
/// Setting the cursor collapses the selection onto it; setting the selection
/// moves the cursor to the selection's end.
pub trait Selectable {
    fn uri(&self) -> &str;
    fn cursor(&self) -> Position;
    /// # Errors
    /// Fails on a disposed editor or a position outside the document.
    fn set_cursor(&mut self, position: Position) -> EditorResult<()>;
    fn selection(&self) -> Range;
    /// # Errors
    /// Fails on a disposed editor or an invalid range.
    fn set_selection(&mut self, range: Range) -> EditorResult<()>;

    fn current_selection(&self) -> TextEditorSelection {
        TextEditorSelection {
            uri: self.uri().to_string(),
            cursor: Some(self.cursor()),
            selection: Some(self.selection()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevealPositionOptions {
    #[serde(default)]
    pub vertical: RevealAt,
    #[serde(default)]
    pub horizontal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevealRangeOptions {
    #[serde(default)]
    pub at: RevealAt,
}

/// Advisory scroll requests. They never fail and are honoured on the next
/// [`TextEditor::refresh`].
pub trait Navigatable {
    fn target_uri(&self) -> Option<&str>;
    fn reveal_position(&mut self, position: Position, options: RevealPositionOptions);
    fn reveal_range(&mut self, range: Range, options: RevealRangeOptions);
}

/// Size of the host area an editor renders into, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: u16,
    pub height: u16,
}

impl Default for Dimension {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
        }
    }
}

/// Fired after an edit batch has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentChangeEvent {
    pub uri: String,
    pub version: u64,
    pub content_changes: Vec<TextDocumentContentChangeDelta>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaDecorationParams {
    #[serde(default)]
    pub old_decorations: Vec<DecorationId>,
    #[serde(default)]
    pub new_decorations: Vec<EditorDecoration>,
}

/// The full editor capability surface.
#[async_trait(?Send)]
pub trait TextEditor: Disposable + Selectable + Navigatable {
    fn document(&self) -> &dyn TextEditorDocument;

    fn on_document_content_changed(
        &mut self,
        listener: Listener<TextDocumentChangeEvent>,
    ) -> ListenerId;
    fn on_cursor_position_changed(&mut self, listener: Listener<Position>) -> ListenerId;
    fn on_selection_changed(&mut self, listener: Listener<Range>) -> ListenerId;
    fn on_focus_changed(&mut self, listener: Listener<bool>) -> ListenerId;
    /// Remove a listener registered with any of the `on_*` methods.
    fn unsubscribe(&mut self, id: ListenerId) -> bool;

    fn focus(&mut self);
    fn blur(&mut self);
    fn is_focused(&self) -> bool;

    /// Honour queued reveal requests and re-render.
    fn refresh(&mut self);
    /// Resize the viewport to fit the host area.
    fn resize_to_fit(&mut self);
    fn set_size(&mut self, size: Dimension);

    /// Remove `old_decorations` and install `new_decorations`.
    ///
    /// # Errors
    /// Fails on a disposed editor or an invalid range; nothing changes then.
    fn delta_decorations(&mut self, params: DeltaDecorationParams) -> EditorResult<Vec<DecorationId>>;
    fn get_decoration_range(&self, id: &DecorationId) -> Option<Range>;
    /// Decorations on the lines spanned by `range`. Only the lines of `range`
    /// are used for filtering.
    fn get_decorations_in_range(&self, range: Range) -> Vec<Decoration>;
    fn get_lines_decorations(&self, start_line: usize, end_line: usize) -> Vec<Decoration>;
    fn get_visible_column(&self, position: Position) -> Option<usize>;

    /// Apply replace operations to the document named by `params.source`.
    ///
    /// # Errors
    /// Rejects on a disposed editor or a backend failure. Operations that
    /// cannot be applied resolve `Ok(false)`.
    async fn replace_text(&mut self, params: ReplaceTextParams) -> EditorResult<bool>;

    /// Apply a batch of non-overlapping edits as one transaction.
    ///
    /// Returns `Ok(false)` if the editor is read-only.
    ///
    /// # Errors
    /// Fails on a disposed editor, an invalid range or overlapping edits;
    /// nothing changes then.
    fn execute_edits(&mut self, edits: &[TextEdit]) -> EditorResult<bool>;
}
