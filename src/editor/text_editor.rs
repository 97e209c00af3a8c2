//! [`DecoratedEditor`]: the [`TextEditor`] implementation over a [`TextDocument`].

use std::collections::VecDeque;
use std::fmt;

use async_trait::async_trait;
use unicode_width::UnicodeWidthChar;

use super::backend::{ReplaceBackend, ReplaceTextParams, to_text_edits};
use super::decorations::{Decoration, DecorationId};
use super::document::{AppliedEdit, TextDocument, TextEdit, path_from_uri};
use super::event::{Emitter, Listener, ListenerId};
use super::viewport::Viewport;
use super::{
    DeltaDecorationParams, Dimension, Disposable, Navigatable, Position, Range,
    RevealPositionOptions, RevealRangeOptions, Saveable, Selectable, TextDocumentChangeEvent,
    TextEditor, TextEditorDocument,
};
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealRequest {
    Position {
        position: Position,
        options: RevealPositionOptions,
    },
    Range {
        range: Range,
        options: RevealRangeOptions,
    },
}

/// An editor over one document.
///
/// Collaborators are passed in at construction: the document, the editor
/// settings and the backend that serves `replace_text` requests for other
/// sources.
pub struct DecoratedEditor {
    document: TextDocument,
    config: EditorConfig,
    backend: Box<dyn ReplaceBackend>,
    cursor: Position,
    selection: Range,
    focused: bool,
    viewport: Viewport,
    size: Dimension,
    pending_reveals: VecDeque<RevealRequest>,
    needs_render: bool,
    disposed: bool,
    content_changed: Emitter<TextDocumentChangeEvent>,
    cursor_changed: Emitter<Position>,
    selection_changed: Emitter<Range>,
    focus_changed: Emitter<bool>,
}

impl DecoratedEditor {
    pub fn new(document: TextDocument, config: EditorConfig, backend: Box<dyn ReplaceBackend>) -> Self {
        let viewport = Viewport::new(
            config.viewport.width,
            config.viewport.height,
            document.line_count(),
        );
        Self {
            document,
            config,
            backend,
            cursor: Position::zero(),
            selection: Range::default(),
            focused: false,
            viewport,
            size: config.viewport,
            pending_reveals: VecDeque::new(),
            needs_render: true,
            disposed: false,
            content_changed: Emitter::new(),
            cursor_changed: Emitter::new(),
            selection_changed: Emitter::new(),
            focus_changed: Emitter::new(),
        }
    }

    pub fn text_document(&self) -> &TextDocument {
        &self.document
    }

    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Whether state changed since the last [`TextEditor::refresh`].
    pub const fn needs_refresh(&self) -> bool {
        self.needs_render
    }

    pub fn pending_reveal_count(&self) -> usize {
        self.pending_reveals.len()
    }

    pub const fn is_read_only(&self) -> bool {
        self.config.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.config.read_only = read_only;
    }

    /// Write the document back to its file.
    ///
    /// # Errors
    /// See [`Saveable::save`].
    pub fn save(&mut self) -> EditorResult<()> {
        self.document.save()
    }

    /// Every decoration of the document, ordered by position.
    pub fn all_decorations(&self) -> Vec<Decoration> {
        self.document.all_decorations()
    }

    fn ensure_live(&self) -> EditorResult<()> {
        if self.disposed {
            return Err(EditorError::DisposedState {
                uri: self.document.uri().to_string(),
            });
        }
        Ok(())
    }

    fn is_local_source(&self, source: &str) -> bool {
        if source == self.document.uri() {
            return true;
        }
        let Some(own) = self.document.path() else {
            return false;
        };
        let path = path_from_uri(source);
        path == own || path.canonicalize().is_ok_and(|resolved| resolved == own)
    }

    /// Apply a batch and move cursor and selection through it.
    fn apply_batch(&mut self, edits: &[TextEdit]) -> EditorResult<()> {
        let cursor = self.document.clamped_offset(self.cursor);
        let selection_start = self.document.clamped_offset(self.selection.start);
        let selection_end = self.document.clamped_offset(self.selection.end);

        let applied = self.document.apply_edits(edits)?;
        if applied.is_empty() {
            return Ok(());
        }

        let (mut cursor, mut start, mut end) = (cursor, selection_start, selection_end);
        for AppliedEdit { offsets, .. } in &applied {
            cursor = offsets.map_end(cursor, true);
            start = offsets.map_start(start, false);
            end = offsets.map_end(end, true);
        }
        let cursor = self.document.align_offset(cursor);
        let end = self.document.align_offset(end);
        let start = self.document.align_offset(start).min(end);

        self.viewport.set_total_lines(self.document.line_count());
        self.needs_render = true;

        let event = TextDocumentChangeEvent {
            uri: self.document.uri().to_string(),
            version: self.document.version(),
            content_changes: applied.into_iter().map(|edit| edit.delta).collect(),
        };
        self.content_changed.fire(&event);

        let cursor = self.document.position_at(cursor);
        let selection = Range::new(
            self.document.position_at(start),
            self.document.position_at(end),
        );
        self.update_selection(cursor, selection);
        Ok(())
    }

    /// Store new cursor and selection, firing the cursor event before the
    /// selection event, each only when its value changed.
    fn update_selection(&mut self, cursor: Position, selection: Range) {
        let cursor_moved = cursor != self.cursor;
        let selection_moved = selection != self.selection;
        self.cursor = cursor;
        self.selection = selection;
        if cursor_moved || selection_moved {
            self.needs_render = true;
        }
        if cursor_moved {
            self.cursor_changed.fire(&cursor);
        }
        if selection_moved {
            self.selection_changed.fire(&selection);
        }
    }

    fn set_focus(&mut self, focused: bool) {
        if self.disposed || self.focused == focused {
            return;
        }
        self.focused = focused;
        self.focus_changed.fire(&focused);
    }

    fn visible_column_at(&self, position: Position) -> usize {
        let tab_size = self.config.tab_size.max(1);
        self.document
            .get_line_content(position.line)
            .unwrap_or_default()
            .chars()
            .take(position.character)
            .fold(0, |column, ch| {
                if ch == '\t' {
                    column + tab_size - column % tab_size
                } else {
                    column + ch.width().unwrap_or(0)
                }
            })
    }
}

impl fmt::Debug for DecoratedEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratedEditor")
            .field("uri", &self.document.uri())
            .field("version", &self.document.version())
            .field("cursor", &self.cursor)
            .field("selection", &self.selection)
            .field("focused", &self.focused)
            .field("pending_reveals", &self.pending_reveals.len())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl Disposable for DecoratedEditor {
    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.focused = false;
        self.pending_reveals.clear();
        self.content_changed.clear();
        self.cursor_changed.clear();
        self.selection_changed.clear();
        self.focus_changed.clear();
        self.document.dispose();
        tracing::debug!(uri = %self.document.uri(), "disposed editor");
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Selectable for DecoratedEditor {
    fn uri(&self) -> &str {
        self.document.uri()
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, position: Position) -> EditorResult<()> {
        self.ensure_live()?;
        self.document.offset_at(position)?;
        self.update_selection(position, Range::empty_at(position));
        Ok(())
    }

    fn selection(&self) -> Range {
        self.selection
    }

    fn set_selection(&mut self, range: Range) -> EditorResult<()> {
        self.ensure_live()?;
        self.document.offsets_of(range)?;
        self.update_selection(range.end, range);
        Ok(())
    }
}

impl Navigatable for DecoratedEditor {
    fn target_uri(&self) -> Option<&str> {
        (!self.disposed).then(|| self.document.uri())
    }

    fn reveal_position(&mut self, position: Position, options: RevealPositionOptions) {
        if self.disposed {
            return;
        }
        self.pending_reveals
            .push_back(RevealRequest::Position { position, options });
        self.needs_render = true;
    }

    fn reveal_range(&mut self, range: Range, options: RevealRangeOptions) {
        if self.disposed {
            return;
        }
        self.pending_reveals
            .push_back(RevealRequest::Range { range, options });
        self.needs_render = true;
    }
}

#[async_trait(?Send)]
impl TextEditor for DecoratedEditor {
    fn document(&self) -> &dyn TextEditorDocument {
        &self.document
    }

    fn on_document_content_changed(
        &mut self,
        listener: Listener<TextDocumentChangeEvent>,
    ) -> ListenerId {
        self.content_changed.subscribe(listener)
    }

    fn on_cursor_position_changed(&mut self, listener: Listener<Position>) -> ListenerId {
        self.cursor_changed.subscribe(listener)
    }

    fn on_selection_changed(&mut self, listener: Listener<Range>) -> ListenerId {
        self.selection_changed.subscribe(listener)
    }

    fn on_focus_changed(&mut self, listener: Listener<bool>) -> ListenerId {
        self.focus_changed.subscribe(listener)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.content_changed.unsubscribe(id)
            || self.cursor_changed.unsubscribe(id)
            || self.selection_changed.unsubscribe(id)
            || self.focus_changed.unsubscribe(id)
    }

    fn focus(&mut self) {
        self.set_focus(true);
    }

    fn blur(&mut self) {
        self.set_focus(false);
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn refresh(&mut self) {
        if self.disposed {
            return;
        }
        self.viewport.set_total_lines(self.document.line_count());
        while let Some(request) = self.pending_reveals.pop_front() {
            match request {
                RevealRequest::Position { position, options } => {
                    let position = self
                        .document
                        .position_at(self.document.clamped_offset(position));
                    self.viewport.reveal_line(position.line, options.vertical);
                    if options.horizontal {
                        let column = self.visible_column_at(position);
                        self.viewport.reveal_column(column);
                    }
                }
                RevealRequest::Range { range, options } => {
                    let (start, end) = if range.is_well_formed() {
                        (range.start.line, range.end.line)
                    } else {
                        (range.end.line, range.start.line)
                    };
                    self.viewport.reveal_lines(start, end, options.at);
                }
            }
        }
        self.needs_render = false;
        tracing::trace!(
            uri = %self.document.uri(),
            offset = self.viewport.offset(),
            "refreshed editor"
        );
    }

    fn resize_to_fit(&mut self) {
        if self.disposed {
            return;
        }
        self.viewport.resize(self.size.width, self.size.height);
        self.needs_render = true;
    }

    fn set_size(&mut self, size: Dimension) {
        if self.size != size {
            self.size = size;
            self.needs_render = true;
        }
    }

    fn delta_decorations(&mut self, params: DeltaDecorationParams) -> EditorResult<Vec<DecorationId>> {
        self.ensure_live()?;
        let ids = self
            .document
            .delta_decorations(&params.old_decorations, &params.new_decorations)?;
        self.needs_render = true;
        Ok(ids)
    }

    fn get_decoration_range(&self, id: &DecorationId) -> Option<Range> {
        self.document.decoration_range(id)
    }

    fn get_decorations_in_range(&self, range: Range) -> Vec<Decoration> {
        let first = range.start.line.min(range.end.line);
        let last = range.start.line.max(range.end.line);
        self.document.decorations_in_lines(first, last)
    }

    fn get_lines_decorations(&self, start_line: usize, end_line: usize) -> Vec<Decoration> {
        self.document.decorations_in_lines(start_line, end_line)
    }

    fn get_visible_column(&self, position: Position) -> Option<usize> {
        if self.disposed {
            return None;
        }
        self.document.offset_at(position).ok()?;
        Some(self.visible_column_at(position))
    }

    async fn replace_text(&mut self, params: ReplaceTextParams) -> EditorResult<bool> {
        self.ensure_live()?;
        if !self.is_local_source(&params.source) {
            return Ok(self
                .backend
                .replace(&params.source, &params.replace_operations)
                .await?);
        }
        if self.config.read_only {
            tracing::debug!(uri = %self.document.uri(), "replace_text on read-only editor");
            return Ok(false);
        }
        match self.apply_batch(&to_text_edits(&params.replace_operations)) {
            Ok(()) => Ok(true),
            Err(err @ (EditorError::InvalidRange { .. } | EditorError::OverlappingEdits { .. })) => {
                tracing::debug!(uri = %self.document.uri(), error = %err, "replace operations not applicable");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    fn execute_edits(&mut self, edits: &[TextEdit]) -> EditorResult<bool> {
        self.ensure_live()?;
        if self.config.read_only {
            tracing::debug!(uri = %self.document.uri(), "execute_edits on read-only editor");
            return Ok(false);
        }
        self.apply_batch(edits)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use tempfile::tempdir;

    use super::*;
    use crate::editor::backend::{FileReplaceBackend, NoBackend, ReplaceOperation};
    use crate::editor::document::file_uri;
    use crate::editor::{DecorationOptions, EditorDecoration, RevealAt};

    fn editor(text: &str) -> DecoratedEditor {
        DecoratedEditor::new(
            TextDocument::new("inmemory://test", text),
            EditorConfig::default(),
            Box::new(NoBackend),
        )
    }

    fn record(editor: &mut DecoratedEditor) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let content = Rc::clone(&log);
        editor.on_document_content_changed(Box::new(move |event| {
            content.borrow_mut().push(format!("content v{}", event.version));
        }));
        let cursor = Rc::clone(&log);
        editor.on_cursor_position_changed(Box::new(move |position| {
            cursor.borrow_mut().push(format!("cursor {position}"));
        }));
        let selection = Rc::clone(&log);
        editor.on_selection_changed(Box::new(move |range| {
            selection.borrow_mut().push(format!("selection {range}"));
        }));
        log
    }

    #[test]
    fn test_set_cursor_collapses_selection() {
        let mut ed = editor("hello\nworld");
        ed.set_selection(Range::at(0, 1, 1, 2)).unwrap();
        assert_eq!(ed.cursor(), Position::new(1, 2));
        ed.set_cursor(Position::new(0, 3)).unwrap();
        assert_eq!(ed.selection(), Range::at(0, 3, 0, 3));
    }

    #[test]
    fn test_cursor_events_fire_only_on_change() {
        let mut ed = editor("hello");
        let log = record(&mut ed);
        ed.set_cursor(Position::new(0, 2)).unwrap();
        ed.set_cursor(Position::new(0, 2)).unwrap();
        assert_eq!(*log.borrow(), vec!["cursor 0:2", "selection 0:2-0:2"]);
    }

    #[test]
    fn test_invalid_cursor_is_rejected() {
        let mut ed = editor("hello");
        assert!(matches!(
            ed.set_cursor(Position::new(0, 6)),
            Err(EditorError::InvalidPosition { .. })
        ));
        assert!(matches!(
            ed.set_selection(Range::at(0, 4, 0, 1)),
            Err(EditorError::InvalidRange { .. })
        ));
        assert_eq!(ed.cursor(), Position::zero());
    }

    #[test]
    fn test_edit_moves_cursor_and_fires_in_order() {
        let mut ed = editor("abc");
        ed.set_cursor(Position::new(0, 3)).unwrap();
        let log = record(&mut ed);
        assert!(
            ed.execute_edits(&[TextEdit::insert(Position::new(0, 0), "xy")])
                .unwrap()
        );
        assert_eq!(ed.cursor(), Position::new(0, 5));
        assert_eq!(
            *log.borrow(),
            vec!["content v2", "cursor 0:5", "selection 0:5-0:5"]
        );
    }

    #[test]
    fn test_typing_at_cursor_moves_it_forward() {
        let mut ed = editor("ab");
        ed.set_cursor(Position::new(0, 1)).unwrap();
        ed.execute_edits(&[TextEdit::insert(Position::new(0, 1), "\n")])
            .unwrap();
        assert_eq!(ed.cursor(), Position::new(1, 0));
    }

    #[test]
    fn test_selection_shrinks_when_its_text_is_deleted() {
        let mut ed = editor("0123456789");
        ed.set_selection(Range::at(0, 2, 0, 6)).unwrap();
        ed.execute_edits(&[TextEdit::delete(Range::at(0, 4, 0, 8))])
            .unwrap();
        assert_eq!(ed.selection(), Range::at(0, 2, 0, 4));
        assert_eq!(ed.cursor(), Position::new(0, 4));
    }

    #[test]
    fn test_edits_never_leave_anchors_inside_crlf() {
        let mut ed = editor("ab\ncd");
        let ids = ed
            .delta_decorations(DeltaDecorationParams {
                old_decorations: Vec::new(),
                new_decorations: vec![EditorDecoration::new(
                    Range::at(0, 1, 0, 2),
                    DecorationOptions::default(),
                )],
            })
            .unwrap();
        ed.set_cursor(Position::new(0, 2)).unwrap();
        ed.execute_edits(&[TextEdit::insert(Position::new(0, 2), "\r")])
            .unwrap();
        assert_eq!(ed.document().text(), "ab\r\ncd");

        let range = ed.get_decoration_range(&ids[0]).unwrap();
        assert_eq!(range, Range::at(0, 1, 0, 2));
        assert_eq!(ed.document().get_text(range).unwrap(), "b");
        assert_eq!(ed.cursor(), Position::new(0, 2));
        ed.set_cursor(ed.cursor()).unwrap();
    }

    #[test]
    fn test_deleting_between_cr_and_lf_realigns_cursor() {
        let mut ed = editor("ab\rX\ncd");
        ed.set_cursor(Position::new(1, 1)).unwrap();
        ed.execute_edits(&[TextEdit::delete(Range::at(1, 0, 1, 1))])
            .unwrap();
        assert_eq!(ed.document().text(), "ab\r\ncd");
        assert_eq!(ed.cursor(), Position::new(0, 2));
        assert_eq!(ed.document().line_count(), 2);
    }

    #[test]
    fn test_two_replacements_apply_in_range_order() {
        let mut ed = editor("one two three");
        let accepted = ed
            .execute_edits(&[
                TextEdit::replace(Range::at(0, 8, 0, 13), "3"),
                TextEdit::replace(Range::at(0, 0, 0, 3), "1"),
            ])
            .unwrap();
        assert!(accepted);
        assert_eq!(ed.document().text(), "1 two 3");
    }

    #[test]
    fn test_rejected_batch_changes_nothing() {
        let mut ed = editor("abcdef");
        let log = record(&mut ed);
        let result = ed.execute_edits(&[
            TextEdit::replace(Range::at(0, 0, 0, 1), "x"),
            TextEdit::replace(Range::at(0, 2, 0, 9), "y"),
        ]);
        assert!(matches!(result, Err(EditorError::InvalidRange { .. })));
        assert_eq!(ed.document().text(), "abcdef");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_read_only_editor_refuses_edits() {
        let mut ed = editor("abc");
        ed.set_read_only(true);
        assert!(
            !ed.execute_edits(&[TextEdit::insert(Position::zero(), "x")])
                .unwrap()
        );
        assert_eq!(ed.document().text(), "abc");
        assert_eq!(ed.document().version(), 1);
    }

    #[test]
    fn test_focus_events() {
        let mut ed = editor("");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = ed.on_focus_changed(Box::new(move |focused| sink.borrow_mut().push(*focused)));
        ed.focus();
        ed.focus();
        ed.blur();
        assert!(ed.unsubscribe(id));
        ed.focus();
        assert_eq!(*seen.borrow(), vec![true, false]);
        assert!(ed.is_focused());
    }

    #[test]
    fn test_reveals_are_deferred_until_refresh() {
        let text = (0..100).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let mut ed = editor(&text);
        ed.refresh();
        ed.reveal_position(
            Position::new(60, 0),
            RevealPositionOptions {
                vertical: RevealAt::Center,
                horizontal: false,
            },
        );
        assert_eq!(ed.pending_reveal_count(), 1);
        assert!(ed.needs_refresh());
        assert_eq!(ed.viewport().offset(), 0);
        ed.refresh();
        assert_eq!(ed.pending_reveal_count(), 0);
        assert!(!ed.needs_refresh());
        assert_eq!(ed.viewport().offset(), 48);
    }

    #[test]
    fn test_reveal_out_of_bounds_never_fails() {
        let mut ed = editor("a\nb\nc");
        ed.reveal_range(Range::at(90, 0, 99, 0), RevealRangeOptions { at: RevealAt::Top });
        ed.reveal_position(Position::new(500, 500), RevealPositionOptions::default());
        ed.refresh();
        assert_eq!(ed.viewport().offset(), 0);
    }

    #[test]
    fn test_horizontal_reveal_scrolls_columns() {
        let mut ed = editor(&"x".repeat(200));
        ed.reveal_position(
            Position::new(0, 150),
            RevealPositionOptions {
                vertical: RevealAt::Auto,
                horizontal: true,
            },
        );
        ed.refresh();
        assert_eq!(ed.viewport().column_offset(), 71);
    }

    #[test]
    fn test_resize_to_fit_uses_latest_size() {
        let mut ed = editor("a");
        ed.set_size(Dimension {
            width: 40,
            height: 10,
        });
        assert_eq!(ed.viewport().height(), 24);
        ed.resize_to_fit();
        assert_eq!(ed.viewport().height(), 10);
        assert_eq!(ed.viewport().width(), 40);
    }

    #[test]
    fn test_visible_column_expands_tabs_and_wide_chars() {
        let mut ed = editor("\tab\t界x");
        assert_eq!(ed.get_visible_column(Position::new(0, 0)), Some(0));
        assert_eq!(ed.get_visible_column(Position::new(0, 1)), Some(4));
        assert_eq!(ed.get_visible_column(Position::new(0, 4)), Some(8));
        assert_eq!(ed.get_visible_column(Position::new(0, 5)), Some(10));
        assert_eq!(ed.get_visible_column(Position::new(0, 9)), None);
        ed.dispose();
        assert_eq!(ed.get_visible_column(Position::new(0, 0)), None);
    }

    #[test]
    fn test_decorations_in_range_uses_lines_only() {
        let mut ed = editor("aaaa\nbbbb\ncccc");
        let ids = ed
            .delta_decorations(DeltaDecorationParams {
                old_decorations: Vec::new(),
                new_decorations: vec![EditorDecoration::new(
                    Range::at(1, 3, 1, 4),
                    DecorationOptions::with_class("mark"),
                )],
            })
            .unwrap();
        let found = ed.get_decorations_in_range(Range::at(1, 0, 1, 1));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, ids[0]);
        assert!(ed.get_lines_decorations(2, 2).is_empty());
    }

    #[test]
    fn test_dispose_is_idempotent_and_invalidates_state() {
        let mut ed = editor("abc");
        let ids = ed
            .delta_decorations(DeltaDecorationParams {
                old_decorations: Vec::new(),
                new_decorations: vec![EditorDecoration::new(
                    Range::at(0, 0, 0, 1),
                    DecorationOptions::default(),
                )],
            })
            .unwrap();
        let log = record(&mut ed);
        ed.focus();
        assert!(ed.is_focused());
        ed.on_focus_changed(Box::new(|_| panic!("focus listener outlived dispose")));
        ed.reveal_position(Position::zero(), RevealPositionOptions::default());
        ed.dispose();
        ed.dispose();
        assert!(ed.is_disposed());
        assert!(!ed.is_focused());
        assert_eq!(ed.content_changed.listener_count(), 0);
        assert_eq!(ed.cursor_changed.listener_count(), 0);
        assert_eq!(ed.selection_changed.listener_count(), 0);
        assert_eq!(ed.focus_changed.listener_count(), 0);
        ed.focus();
        assert!(log.borrow().is_empty());
        assert_eq!(ed.pending_reveal_count(), 0);
        assert_eq!(ed.get_decoration_range(&ids[0]), None);
        assert_eq!(ed.target_uri(), None);
        assert!(matches!(
            ed.execute_edits(&[]),
            Err(EditorError::DisposedState { .. })
        ));
        assert!(matches!(
            ed.set_cursor(Position::zero()),
            Err(EditorError::DisposedState { .. })
        ));
    }

    #[tokio::test]
    async fn test_replace_text_on_own_document() {
        let mut ed = editor("hello world");
        let ok = ed
            .replace_text(ReplaceTextParams {
                source: "inmemory://test".to_string(),
                replace_operations: vec![ReplaceOperation {
                    range: Range::at(0, 0, 0, 5),
                    text: "HELLO".to_string(),
                }],
            })
            .await
            .unwrap();
        assert!(ok);
        assert_eq!(ed.document().text(), "HELLO world");
    }

    #[tokio::test]
    async fn test_replace_text_stale_range_resolves_false() {
        let mut ed = editor("short");
        let ok = ed
            .replace_text(ReplaceTextParams {
                source: "inmemory://test".to_string(),
                replace_operations: vec![ReplaceOperation {
                    range: Range::at(4, 0, 4, 2),
                    text: "x".to_string(),
                }],
            })
            .await
            .unwrap();
        assert!(!ok);
        assert_eq!(ed.document().version(), 1);
    }

    #[tokio::test]
    async fn test_replace_text_on_read_only_editor_resolves_false() {
        let mut ed = editor("hello");
        ed.set_read_only(true);
        let log = record(&mut ed);
        let ok = ed
            .replace_text(ReplaceTextParams {
                source: "inmemory://test".to_string(),
                replace_operations: vec![ReplaceOperation {
                    range: Range::at(0, 0, 0, 5),
                    text: "HELLO".to_string(),
                }],
            })
            .await
            .unwrap();
        assert!(!ok);
        assert_eq!(ed.document().text(), "hello");
        assert_eq!(ed.document().version(), 1);
        assert!(log.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_replace_text_on_disposed_editor_fails() {
        let mut ed = editor("hello");
        ed.dispose();
        let result = ed
            .replace_text(ReplaceTextParams {
                source: "inmemory://test".to_string(),
                replace_operations: vec![ReplaceOperation {
                    range: Range::at(0, 0, 0, 1),
                    text: "j".to_string(),
                }],
            })
            .await;
        assert!(matches!(result, Err(EditorError::DisposedState { .. })));
    }

    #[tokio::test]
    async fn test_replace_text_foreign_source_without_backend_rejects() {
        let mut ed = editor("abc");
        let result = ed
            .replace_text(ReplaceTextParams {
                source: "inmemory://other".to_string(),
                replace_operations: Vec::new(),
            })
            .await;
        assert!(matches!(result, Err(EditorError::Backend(_))));
    }

    #[tokio::test]
    async fn test_replace_text_foreign_file_goes_through_backend() {
        let dir = tempdir().unwrap();
        let other = dir.path().join("other.txt");
        std::fs::write(&other, "x = 1\n").unwrap();
        let mut ed = DecoratedEditor::new(
            TextDocument::new("inmemory://test", "abc"),
            EditorConfig::default(),
            Box::new(FileReplaceBackend),
        );
        let ok = ed
            .replace_text(ReplaceTextParams {
                source: file_uri(&other),
                replace_operations: vec![ReplaceOperation {
                    range: Range::at(0, 4, 0, 5),
                    text: "2".to_string(),
                }],
            })
            .await
            .unwrap();
        assert!(ok);
        assert_eq!(std::fs::read_to_string(&other).unwrap(), "x = 2\n");
        assert_eq!(ed.document().text(), "abc");
    }
}
