//! Error types shared by the editor modules.

use thiserror::Error;

use crate::editor::backend::BackendError;
use crate::editor::{Position, Range};

/// Every failure an editor or document operation can report.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("invalid range {range}: {reason}")]
    InvalidRange { range: Range, reason: &'static str },

    #[error("invalid position {position}: {reason}")]
    InvalidPosition {
        position: Position,
        reason: &'static str,
    },

    #[error("edits at {first} and {second} overlap")]
    OverlappingEdits { first: Range, second: Range },

    #[error("document {uri} has been disposed")]
    DisposedState { uri: String },

    #[error("document {uri} has no file to save to")]
    NoSaveTarget { uri: String },

    #[error("replace backend failed: {0}")]
    Backend(#[from] BackendError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    /// Offset of this error inside the editor's reserved error-code range.
    pub const fn code_offset(&self) -> i32 {
        match self {
            Self::InvalidRange { .. } => 0,
            Self::InvalidPosition { .. } => 1,
            Self::OverlappingEdits { .. } => 2,
            Self::DisposedState { .. } => 3,
            Self::NoSaveTarget { .. } => 4,
            Self::Backend(_) => 5,
            Self::Io(_) => 6,
        }
    }
}

/// Editor result
pub type EditorResult<T> = Result<T, EditorError>;
