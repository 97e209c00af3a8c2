use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::editor::Dimension;

pub const DEFAULT_TAB_SIZE: usize = 4;

/// Flags that may be set on the command line or saved to a config file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub read_only: bool,
    pub no_storage: bool,
    pub tab_size: Option<usize>,
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub storage_path: Option<PathBuf>,
}

impl ConfigFlags {
    /// Merge `other` over `self`: booleans are or-ed and options set in
    /// `other` win.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            read_only: self.read_only || other.read_only,
            no_storage: self.no_storage || other.no_storage,
            tab_size: other.tab_size.or(self.tab_size),
            width: other.width.or(self.width),
            height: other.height.or(self.height),
            storage_path: other
                .storage_path
                .clone()
                .or_else(|| self.storage_path.clone()),
        }
    }
}

/// Settings an editor is constructed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    pub tab_size: usize,
    pub read_only: bool,
    pub viewport: Dimension,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_size: DEFAULT_TAB_SIZE,
            read_only: false,
            viewport: Dimension::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_flags(flags: &ConfigFlags) -> Self {
        let defaults = Self::default();
        Self {
            tab_size: flags
                .tab_size
                .filter(|size| *size > 0)
                .unwrap_or(defaults.tab_size),
            read_only: flags.read_only,
            viewport: Dimension {
                width: flags.width.unwrap_or(defaults.viewport.width),
                height: flags.height.unwrap_or(defaults.viewport.height),
            },
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("decor").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("decor")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("decor").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("decor").join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".decorrc")
}

/// Default location of the persisted editor state, next to the global config.
pub fn default_storage_path() -> PathBuf {
    global_config_path().with_file_name("state.json")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# decor defaults (saved with --save)".to_string()];
    if flags.read_only {
        lines.push("--read-only".to_string());
    }
    if flags.no_storage {
        lines.push("--no-storage".to_string());
    }
    if let Some(size) = flags.tab_size {
        lines.push(format!("--tab-size {size}"));
    }
    if let Some(width) = flags.width {
        lines.push(format!("--width {width}"));
    }
    if let Some(height) = flags.height {
        lines.push(format!("--height {height}"));
    }
    if let Some(path) = &flags.storage_path {
        lines.push(format!("--storage {}", path.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pull the known flags out of a token list. Unknown tokens and values that
/// fail to parse are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (token, None),
        };
        match name {
            "--read-only" => flags.read_only = true,
            "--no-storage" => flags.no_storage = true,
            "--tab-size" | "--width" | "--height" | "--storage" => {
                let value = match inline {
                    Some(value) => Some(value),
                    None => {
                        let next = tokens.get(i + 1).map(String::as_str);
                        if next.is_some() {
                            i += 1;
                        }
                        next
                    }
                };
                if let Some(value) = value {
                    apply_value(&mut flags, name, value);
                }
            }
            _ => {}
        }
        i += 1;
    }
    flags
}

fn apply_value(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--tab-size" => flags.tab_size = value.parse().ok().or(flags.tab_size),
        "--width" => flags.width = value.parse().ok().or(flags.width),
        "--height" => flags.height = value.parse().ok().or(flags.height),
        "--storage" => flags.storage_path = Some(PathBuf::from(value)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&tokens(&[
            "decor",
            "--read-only",
            "--tab-size",
            "8",
            "--width=120",
            "--storage",
            "state.json",
            "notes.txt",
        ]));
        assert!(flags.read_only);
        assert!(!flags.no_storage);
        assert_eq!(flags.tab_size, Some(8));
        assert_eq!(flags.width, Some(120));
        assert_eq!(flags.height, None);
        assert_eq!(flags.storage_path, Some(PathBuf::from("state.json")));
    }

    #[test]
    fn test_parse_flag_tokens_skips_bad_numbers() {
        let flags = parse_flag_tokens(&tokens(&["--tab-size", "wide", "--height=-3"]));
        assert_eq!(flags.tab_size, None);
        assert_eq!(flags.height, None);
    }

    #[test]
    fn test_trailing_flag_without_value_is_ignored() {
        let flags = parse_flag_tokens(&tokens(&["--no-storage", "--width"]));
        assert!(flags.no_storage);
        assert_eq!(flags.width, None);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            read_only: true,
            tab_size: Some(2),
            width: Some(100),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            no_storage: true,
            tab_size: Some(8),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.read_only);
        assert!(merged.no_storage);
        assert_eq!(merged.tab_size, Some(8));
        assert_eq!(merged.width, Some(100));
    }

    #[test]
    fn test_editor_config_from_flags() {
        let config = EditorConfig::from_flags(&ConfigFlags {
            read_only: true,
            tab_size: Some(0),
            height: Some(40),
            ..ConfigFlags::default()
        });
        assert!(config.read_only);
        assert_eq!(config.tab_size, DEFAULT_TAB_SIZE);
        assert_eq!(
            config.viewport,
            Dimension {
                width: 80,
                height: 40
            }
        );
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".decorrc");
        let flags = ConfigFlags {
            read_only: true,
            no_storage: true,
            tab_size: Some(2),
            width: Some(132),
            height: Some(50),
            storage_path: Some(PathBuf::from("state.json")),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempdir().unwrap();
        let loaded = load_config_flags(&dir.path().join("absent")).unwrap();
        assert_eq!(loaded, ConfigFlags::default());
    }
}
