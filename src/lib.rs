// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. storage::StorageError)
    clippy::module_name_repetitions
)]

//! # Decor
//!
//! A headless text editor with anchored decorations.
//!
//! Decor keeps a rope-backed document, tracks cursor and selection, applies
//! batches of edits atomically and moves decorations with the text they
//! annotate.
//!
//! ## Architecture
//!
//! Everything runs on one thread and is driven by explicit calls:
//! - **Document**: text, version counter and decorations
//! - **Editor**: cursor, selection, focus and reveal requests over a document
//! - **Events**: listeners notified synchronously after each state change
//! - **Refresh**: queued reveals are honoured only when the caller refreshes
//!
//! ## Modules
//!
//! - [`editor`]: Documents, decorations and the editor capability traits
//! - [`storage`]: Scoped JSON persistence for editor state
//! - [`app_error`]: Reserved numeric error-code ranges
//! - [`script`]: JSON command scripts and reports
//! - [`config`]: Flag files and editor settings
//! - [`error`]: Editor error type

pub mod app_error;
pub mod config;
pub mod editor;
pub mod error;
pub mod script;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::EditorConfig;
    pub use crate::editor::{
        DecoratedEditor, DecorationOptions, Disposable, EditorDecoration, Navigatable, Position,
        Range, Selectable, TextDocument, TextEdit, TextEditor, TextEditorDocument,
    };
    pub use crate::error::{EditorError, EditorResult};
}
