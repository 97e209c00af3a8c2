//! Backends that apply `replace_text` requests addressed to other sources.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::document::{TextDocument, TextEdit, path_from_uri};
use super::position::Range;
use super::{Disposable, TextEditorDocument};

/// A single replace operation of a [`ReplaceTextParams`] request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceOperation {
    /// The range that shall be replaced.
    pub range: Range,
    /// The text to replace it with.
    pub text: String,
}

/// Replace operations addressed to a named source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceTextParams {
    /// URI or path of the document to edit.
    pub source: String,
    pub replace_operations: Vec<ReplaceOperation>,
}

/// Transport-level failures. Edits that are well formed but cannot be
/// applied are reported as `Ok(false)` instead.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no backend can reach {source_uri}")]
    Unavailable { source_uri: String },

    #[error("I/O error on {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

/// Applies replace operations to documents the editor does not own.
#[async_trait(?Send)]
pub trait ReplaceBackend {
    /// Apply `operations` to `source`.
    ///
    /// Resolves `false` when the operations could not be applied (stale or
    /// overlapping ranges).
    async fn replace(
        &self,
        source: &str,
        operations: &[ReplaceOperation],
    ) -> Result<bool, BackendError>;
}

/// Converts replace operations into a batch of text edits.
pub fn to_text_edits(operations: &[ReplaceOperation]) -> Vec<TextEdit> {
    operations
        .iter()
        .map(|op| TextEdit::replace(op.range, op.text.clone()))
        .collect()
}

/// Rejects every request; used when an editor has no route to other sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBackend;

#[async_trait(?Send)]
impl ReplaceBackend for NoBackend {
    async fn replace(
        &self,
        source: &str,
        _operations: &[ReplaceOperation],
    ) -> Result<bool, BackendError> {
        Err(BackendError::Unavailable {
            source_uri: source.to_string(),
        })
    }
}

/// Edits files on disk. `source` is a path or a `file://` URI.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileReplaceBackend;

#[async_trait(?Send)]
impl ReplaceBackend for FileReplaceBackend {
    async fn replace(
        &self,
        source: &str,
        operations: &[ReplaceOperation],
    ) -> Result<bool, BackendError> {
        let path = path_from_uri(source);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|error| BackendError::Io {
                path: path.clone(),
                error,
            })?;
        let mut document = TextDocument::new(source, &text);
        let applied = match document.apply_edits(&to_text_edits(operations)) {
            Ok(applied) => applied,
            Err(err) => {
                tracing::debug!(source, error = %err, "replace operations not applicable");
                return Ok(false);
            }
        };
        if !applied.is_empty() {
            tokio::fs::write(&path, document.text())
                .await
                .map_err(|error| BackendError::Io {
                    path: path.clone(),
                    error,
                })?;
        }
        document.dispose();
        tracing::debug!(source, operations = operations.len(), "replaced text on disk");
        Ok(true)
    }
}
