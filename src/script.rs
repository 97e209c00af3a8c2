//! JSON command scripts run against an editor.
//!
//! A script is a JSON array of commands tagged by `op`:
//!
//! ```json
//! [
//!   { "op": "decorate", "decorations": [
//!       { "range": { "start": { "line": 1, "character": 0 },
//!                    "end": { "line": 1, "character": 3 } },
//!         "options": { "className": "hit" } } ] },
//!   { "op": "edit", "edits": [
//!       { "range": { "start": { "line": 0, "character": 0 },
//!                    "end": { "line": 0, "character": 0 } },
//!         "newText": "// " } ] },
//!   { "op": "refresh" }
//! ]
//! ```
//!
//! Every command runs even if an earlier one failed; failures are reported
//! per step as [`ResponseError`]s with codes from the editor's reserved range.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::app_error::{CodeRange, CodeRegistry, ReservationError, ResponseError};
use crate::editor::{
    DecoratedEditor, Decoration, DecorationId, DeltaDecorationParams, EditorDecoration,
    Navigatable, Position, Range, ReplaceOperation, ReplaceTextParams, RevealAt,
    RevealRangeOptions, Selectable, TextEdit, TextEditor,
};
use crate::error::EditorError;

/// Error codes reserved for editor failures.
pub const EDITOR_ERROR_CODES: (i32, i32) = (1000, 1099);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Install decorations. With `replace`, the decorations installed by
    /// previous `decorate` steps are removed in the same delta.
    Decorate {
        #[serde(default)]
        replace: bool,
        decorations: Vec<EditorDecoration>,
    },
    ClearDecorations,
    Edit {
        edits: Vec<TextEdit>,
    },
    /// `source` defaults to the editor's own document.
    ReplaceText {
        #[serde(default)]
        source: Option<String>,
        operations: Vec<ReplaceOperation>,
    },
    Cursor {
        position: Position,
    },
    Select {
        range: Range,
    },
    Reveal {
        range: Range,
        #[serde(default)]
        at: RevealAt,
    },
    Refresh,
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Decorate { .. } => "decorate",
            Self::ClearDecorations => "clear_decorations",
            Self::Edit { .. } => "edit",
            Self::ReplaceText { .. } => "replace_text",
            Self::Cursor { .. } => "cursor",
            Self::Select { .. } => "select",
            Self::Reveal { .. } => "reveal",
            Self::Refresh => "refresh",
        }
    }
}

/// Parse a script from JSON text.
///
/// # Errors
/// Returns the parse error if the text is not an array of commands.
pub fn parse_script(text: &str) -> Result<Vec<Command>, serde_json::Error> {
    serde_json::from_str(text)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl StepOutcome {
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-step outcomes and the editor state after the last step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptReport {
    pub uri: String,
    pub version: u64,
    pub text: String,
    pub cursor: Position,
    pub selection: Range,
    pub decorations: Vec<Decoration>,
    pub steps: Vec<StepOutcome>,
}

/// Maps [`EditorError`]s onto the editor's reserved error codes.
#[derive(Debug, Clone)]
pub struct EditorErrorCodes {
    range: CodeRange,
}

impl EditorErrorCodes {
    /// Reserve [`EDITOR_ERROR_CODES`] in `registry`.
    ///
    /// # Errors
    /// Fails if the range is already taken.
    pub fn reserve(registry: &mut CodeRegistry) -> Result<Self, ReservationError> {
        let (from, to) = EDITOR_ERROR_CODES;
        Ok(Self {
            range: registry.reserve(from, to, "editor")?,
        })
    }

    pub fn to_response(&self, error: &EditorError) -> ResponseError {
        let (from, _) = self.range.bounds();
        let data = match error {
            EditorError::InvalidRange { range, .. } => Some(json!({ "range": range })),
            EditorError::InvalidPosition { position, .. } => Some(json!({ "position": position })),
            EditorError::OverlappingEdits { first, second } => {
                Some(json!({ "ranges": [first, second] }))
            }
            EditorError::DisposedState { uri } | EditorError::NoSaveTarget { uri } => {
                Some(json!({ "uri": uri }))
            }
            EditorError::Backend(_) | EditorError::Io(_) => None,
        };
        match self.range.define(from + error.code_offset()) {
            Ok(code) => code.create(error.to_string(), data),
            Err(err) => ResponseError {
                code: from,
                message: format!("{error} ({err})"),
                data,
            },
        }
    }
}

/// Runs scripts, remembering the decorations installed by earlier steps.
#[derive(Debug)]
pub struct ScriptRunner {
    codes: EditorErrorCodes,
    decorations: Vec<DecorationId>,
}

impl ScriptRunner {
    pub const fn new(codes: EditorErrorCodes) -> Self {
        Self {
            codes,
            decorations: Vec::new(),
        }
    }

    /// Ids installed by `decorate` steps and not yet removed.
    pub fn decoration_ids(&self) -> &[DecorationId] {
        &self.decorations
    }

    pub async fn run(&mut self, editor: &mut DecoratedEditor, commands: &[Command]) -> ScriptReport {
        let mut steps = Vec::with_capacity(commands.len());
        for (index, command) in commands.iter().enumerate() {
            let outcome = self.step(editor, command).await;
            let (result, error) = match outcome {
                Ok(result) => (result, None),
                Err(err) => {
                    tracing::debug!(index, op = command.name(), error = %err, "script step failed");
                    (None, Some(self.codes.to_response(&err)))
                }
            };
            steps.push(StepOutcome {
                index,
                op: command.name(),
                result,
                error,
            });
        }
        ScriptReport {
            uri: editor.uri().to_string(),
            version: editor.document().version(),
            text: editor.document().text(),
            cursor: editor.cursor(),
            selection: editor.selection(),
            decorations: editor.all_decorations(),
            steps,
        }
    }

    async fn step(
        &mut self,
        editor: &mut DecoratedEditor,
        command: &Command,
    ) -> Result<Option<Value>, EditorError> {
        match command {
            Command::Decorate {
                replace,
                decorations,
            } => {
                let old = if *replace {
                    self.decorations.clone()
                } else {
                    Vec::new()
                };
                let ids = editor.delta_decorations(DeltaDecorationParams {
                    old_decorations: old,
                    new_decorations: decorations.clone(),
                })?;
                if *replace {
                    self.decorations.clear();
                }
                self.decorations.extend(ids.iter().cloned());
                Ok(Some(json!(ids)))
            }
            Command::ClearDecorations => {
                let old = std::mem::take(&mut self.decorations);
                editor.delta_decorations(DeltaDecorationParams {
                    old_decorations: old,
                    new_decorations: Vec::new(),
                })?;
                Ok(None)
            }
            Command::Edit { edits } => Ok(Some(json!(editor.execute_edits(edits)?))),
            Command::ReplaceText { source, operations } => {
                let source = source.clone().unwrap_or_else(|| editor.uri().to_string());
                let applied = editor
                    .replace_text(ReplaceTextParams {
                        source,
                        replace_operations: operations.clone(),
                    })
                    .await?;
                Ok(Some(json!(applied)))
            }
            Command::Cursor { position } => {
                editor.set_cursor(*position)?;
                Ok(None)
            }
            Command::Select { range } => {
                editor.set_selection(*range)?;
                Ok(None)
            }
            Command::Reveal { range, at } => {
                editor.reveal_range(*range, RevealRangeOptions { at: *at });
                Ok(None)
            }
            Command::Refresh => {
                editor.refresh();
                Ok(Some(json!({ "offset": editor.viewport().offset() })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editor::{NoBackend, TextDocument};

    const SAMPLE: &str = "0123456\ndddxeee\n6543210";

    fn runner() -> ScriptRunner {
        let mut registry = CodeRegistry::new();
        ScriptRunner::new(EditorErrorCodes::reserve(&mut registry).unwrap())
    }

    fn editor() -> DecoratedEditor {
        DecoratedEditor::new(
            TextDocument::new("inmemory://script", SAMPLE),
            EditorConfig::default(),
            Box::new(NoBackend),
        )
    }

    #[test]
    fn test_parse_script_commands() {
        let commands = parse_script(
            r#"[
                {"op": "cursor", "position": {"line": 1, "character": 2}},
                {"op": "reveal", "range": {"start": {"line": 0, "character": 0}, "end": {"line": 2, "character": 0}}, "at": "center"},
                {"op": "clear_decorations"},
                {"op": "refresh"}
            ]"#,
        )
        .unwrap();
        assert_eq!(commands.len(), 4);
        assert_eq!(
            commands[0],
            Command::Cursor {
                position: Position::new(1, 2)
            }
        );
        assert!(matches!(
            commands[1],
            Command::Reveal {
                at: RevealAt::Center,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_op_is_a_parse_error() {
        assert!(parse_script(r#"[{"op": "explode"}]"#).is_err());
    }

    #[tokio::test]
    async fn test_run_reports_final_state() {
        let script = parse_script(
            r#"[
                {"op": "decorate", "decorations": [
                    {"range": {"start": {"line": 1, "character": 0}, "end": {"line": 1, "character": 3}}},
                    {"range": {"start": {"line": 1, "character": 4}, "end": {"line": 1, "character": 7}}}
                ]},
                {"op": "edit", "edits": [
                    {"range": {"start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 0}}, "newText": "> "}
                ]},
                {"op": "cursor", "position": {"line": 2, "character": 1}}
            ]"#,
        )
        .unwrap();
        let mut ed = editor();
        let mut runner = runner();
        let report = runner.run(&mut ed, &script).await;
        assert!(report.steps.iter().all(StepOutcome::is_ok));
        assert_eq!(report.text, "> 0123456\ndddxeee\n6543210");
        assert_eq!(report.version, 2);
        assert_eq!(report.decorations.len(), 2);
        assert_eq!(report.cursor, Position::new(2, 1));
        assert_eq!(runner.decoration_ids().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_step_does_not_stop_the_script() {
        let script = vec![
            Command::Cursor {
                position: Position::new(9, 0),
            },
            Command::Edit {
                edits: vec![TextEdit::replace(Range::at(0, 0, 0, 1), "X")],
            },
        ];
        let mut ed = editor();
        let report = runner().run(&mut ed, &script).await;
        let error = report.steps[0].error.as_ref().unwrap();
        assert_eq!(error.code, 1001);
        assert!(report.steps[1].is_ok());
        assert!(report.text.starts_with('X'));
    }

    #[tokio::test]
    async fn test_replace_and_clear_decorations() {
        let decoration = |line| EditorDecoration::new(Range::at(line, 0, line, 1), Default::default());
        let script = vec![
            Command::Decorate {
                replace: false,
                decorations: vec![decoration(0)],
            },
            Command::Decorate {
                replace: true,
                decorations: vec![decoration(1), decoration(2)],
            },
        ];
        let mut ed = editor();
        let mut runner = runner();
        let report = runner.run(&mut ed, &script).await;
        let lines: Vec<usize> = report.decorations.iter().map(|d| d.range.start.line).collect();
        assert_eq!(lines, vec![1, 2]);

        let report = runner.run(&mut ed, &[Command::ClearDecorations]).await;
        assert!(report.decorations.is_empty());
        assert!(runner.decoration_ids().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_edit_reports_code_and_ranges() {
        let script = vec![Command::Edit {
            edits: vec![
                TextEdit::replace(Range::at(0, 0, 0, 4), "a"),
                TextEdit::replace(Range::at(0, 2, 0, 6), "b"),
            ],
        }];
        let mut ed = editor();
        let report = runner().run(&mut ed, &script).await;
        let error = report.steps[0].error.as_ref().unwrap();
        assert_eq!(error.code, 1002);
        assert!(error.data.as_ref().unwrap()["ranges"].is_array());
        assert_eq!(report.version, 1);
    }

    #[tokio::test]
    async fn test_foreign_replace_without_backend_is_reported() {
        let script = vec![Command::ReplaceText {
            source: Some("inmemory://elsewhere".to_string()),
            operations: Vec::new(),
        }];
        let mut ed = editor();
        let report = runner().run(&mut ed, &script).await;
        assert_eq!(report.steps[0].error.as_ref().unwrap().code, 1005);
    }
}
