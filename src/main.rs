//! decor - run decoration and edit scripts against a text file.
//!
//! # Usage
//!
//! ```bash
//! decor notes.txt
//! decor --script steps.json notes.txt
//! decor --script steps.json --write notes.txt
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use decor::app_error::CodeRegistry;
use decor::config::{
    ConfigFlags, EditorConfig, clear_config_flags, default_storage_path, global_config_path,
    load_config_flags, local_override_path, parse_flag_tokens, save_config_flags,
};
use decor::editor::{Position, Selectable, TextEditorProvider};
use decor::script::{EditorErrorCodes, ScriptRunner, parse_script};
use decor::storage::{FileBackend, LocalStorageService, StorageBackendKind, TracingNotifier};

/// Run decoration and edit scripts against a text file
#[derive(Parser, Debug)]
#[command(name = "decor", version, about, long_about = None)]
struct Cli {
    /// Text file to open
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// JSON script of editor commands to run
    #[arg(short, long, value_name = "PATH")]
    script: Option<PathBuf>,

    /// Save the document after the script ran
    #[arg(short, long)]
    write: bool,

    /// Refuse edits to the document
    #[arg(long)]
    read_only: bool,

    /// Do not restore or persist editor state
    #[arg(long)]
    no_storage: bool,

    /// Columns per tab stop
    #[arg(long, value_name = "N")]
    tab_size: Option<usize>,

    /// Viewport width in columns
    #[arg(long)]
    width: Option<u16>,

    /// Viewport height in lines
    #[arg(long)]
    height: Option<u16>,

    /// File holding persisted editor state
    #[arg(long, value_name = "PATH")]
    storage: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn open_storage(flags: &ConfigFlags) -> LocalStorageService {
    let scope = std::env::current_dir()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();
    let kind = if flags.no_storage {
        StorageBackendKind::Unavailable
    } else {
        let path = flags.storage_path.clone().unwrap_or_else(default_storage_path);
        match FileBackend::open(&path, None) {
            Ok(backend) => StorageBackendKind::Available(Box::new(backend)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot open state file");
                StorageBackendKind::Unavailable
            }
        }
    };
    LocalStorageService::new(kind, scope, Box::new(TracingNotifier))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    // Verify file exists
    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let commands = match &cli.script {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read script {}", path.display()))?;
            parse_script(&text).with_context(|| format!("Invalid script {}", path.display()))?
        }
        None => Vec::new(),
    };

    let mut storage = open_storage(&effective);
    let mut provider = TextEditorProvider::new(EditorConfig::from_flags(&effective));
    let file = cli.file.to_string_lossy();
    let editor = provider
        .open(&file)
        .with_context(|| format!("Failed to open {}", cli.file.display()))?;
    let cursor_key = format!("cursor:{}", editor.uri());

    match storage.get_data::<Position>(&cursor_key) {
        Ok(Some(position)) => {
            if let Err(err) = editor.set_cursor(position) {
                tracing::info!(error = %err, "stored cursor no longer fits the document");
            }
        }
        Ok(None) => {}
        Err(err) => tracing::warn!(error = %err, "ignoring stored cursor"),
    }

    let mut registry = CodeRegistry::new();
    let mut runner = ScriptRunner::new(EditorErrorCodes::reserve(&mut registry)?);
    let report = runner.run(editor, &commands).await;

    if cli.write {
        editor
            .save()
            .with_context(|| format!("Failed to save {}", cli.file.display()))?;
    }
    if let Err(err) = storage.set_data(&cursor_key, &editor.cursor()) {
        tracing::warn!(error = %err, "failed to persist cursor");
    }

    let uri = editor.uri().to_string();
    provider.close(&uri);

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to encode report")?
    );
    Ok(())
}
