use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use super::backend::FileReplaceBackend;
use super::document::{TextDocument, file_uri, path_from_uri};
use super::text_editor::DecoratedEditor;
use super::{Disposable, Selectable};
use crate::config::EditorConfig;
use crate::error::EditorResult;

/// Opens documents into editors and keeps one editor per URI.
#[derive(Debug, Default)]
pub struct TextEditorProvider {
    config: EditorConfig,
    editors: HashMap<String, DecoratedEditor>,
}

impl TextEditorProvider {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            editors: HashMap::new(),
        }
    }

    /// Open `uri_or_path` (a `file://` URI or a filesystem path).
    ///
    /// Re-opening a document that is already open returns the existing
    /// editor with its state intact.
    ///
    /// # Errors
    /// Returns [`EditorError::Io`](crate::error::EditorError::Io) if the file
    /// cannot be read.
    pub fn open(&mut self, uri_or_path: &str) -> EditorResult<&mut DecoratedEditor> {
        let path = path_from_uri(uri_or_path);
        match self.editors.entry(resolved_uri(&path)) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => {
                let document = TextDocument::open(&path)?;
                let editor =
                    DecoratedEditor::new(document, self.config, Box::new(FileReplaceBackend));
                Ok(slot.insert(editor))
            }
        }
    }

    /// Register an editor built elsewhere, replacing and disposing any editor
    /// already open under the same URI.
    pub fn insert(&mut self, editor: DecoratedEditor) -> &mut DecoratedEditor {
        match self.editors.entry(editor.uri().to_string()) {
            Entry::Occupied(mut slot) => {
                slot.insert(editor).dispose();
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(editor),
        }
    }

    pub fn get(&self, uri: &str) -> Option<&DecoratedEditor> {
        self.editors.get(uri)
    }

    pub fn get_mut(&mut self, uri: &str) -> Option<&mut DecoratedEditor> {
        self.editors.get_mut(uri)
    }

    /// Dispose and drop the editor for `uri`. Returns `false` if none was open.
    pub fn close(&mut self, uri: &str) -> bool {
        match self.editors.remove(uri) {
            Some(mut editor) => {
                editor.dispose();
                tracing::debug!(uri, "closed editor");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }
}

fn resolved_uri(path: &Path) -> String {
    match path.canonicalize() {
        Ok(resolved) => file_uri(&resolved),
        Err(_) => file_uri(path),
    }
}
