// src/models.rs

use crate::constants::{GO, GORENAME, GURU};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

// --- EDITOR MODEL ---
// Positions follow the editor convention: zero-based lines, zero-based
// characters counted in UTF-16 code units.

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    /// Human form, one-based, as compilers print it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", u64::from(self.line) + 1, u64::from(self.character) + 1)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start_line: u32, start_character: u32, end_line: u32, end_character: u32) -> Self {
        Self {
            start: Position::new(start_line, start_character),
            end: Position::new(end_line, end_character),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub range: Range,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

/// A set of text edits spanning several files, in the order they were added.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkspaceEdit {
    pub changes: BTreeMap<PathBuf, Vec<TextEdit>>,
}

impl WorkspaceEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, path: &Path, range: Range, new_text: impl Into<String>) {
        self.changes
            .entry(path.to_path_buf())
            .or_default()
            .push(TextEdit {
                range,
                new_text: new_text.into(),
            });
    }

    pub fn is_empty(&self) -> bool {
        self.changes.values().all(Vec::is_empty)
    }

    pub fn file_count(&self) -> usize {
        self.changes.len()
    }

    pub fn edit_count(&self) -> usize {
        self.changes.values().map(Vec::len).sum()
    }
}

// --- CONFIGURATION MODELS (config.toml) ---

/// Deserialized form of `config.toml`. Every field is optional in the file.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ShimConfig {
    /// Passed verbatim to `-tags` of every tool.
    #[serde(default)]
    pub build_tags: String,
    #[serde(default)]
    pub alternate: AlternateConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AlternateConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Shell reaching the alternate environment, e.g. `bash.exe`.
    pub shell: Option<String>,
}

/// Explicit tool locations. Unset tools are looked up in GOBIN, GOPATH and PATH.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolsConfig {
    pub guru: Option<String>,
    pub gorename: Option<String>,
    pub go: Option<String>,
}

impl ToolsConfig {
    pub fn configured_path(&self, tool: &str) -> Option<&str> {
        match tool {
            GURU => self.guru.as_deref(),
            GORENAME => self.gorename.as_deref(),
            GO => self.go.as_deref(),
            _ => None,
        }
    }
}
