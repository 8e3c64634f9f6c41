// src/core/document.rs

//! A read-only view of a source file, addressed the way editors address it.
//!
//! Editors speak in zero-based lines and UTF-16 columns; the Go tools want a
//! byte offset into the file. [`TextDocument::byte_offset_at`] bridges the two.

use crate::models::{Position, Range};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Could not read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Line {line} is outside '{path}' ({line_count} lines).")]
    LineOutOfRange {
        path: String,
        line: u32,
        line_count: usize,
    },
}

#[derive(Debug, Clone)]
pub struct TextDocument {
    path: PathBuf,
    text: String,
    /// Byte offset at which each line starts.
    line_starts: Vec<usize>,
}

impl TextDocument {
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let text = fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_text(path, text))
    }

    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            path: path.into(),
            text,
            line_starts,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The content of `line` without its terminator (`\n` or `\r\n`).
    fn line_text(&self, line: u32) -> Result<(usize, &str), DocumentError> {
        let index = line as usize;
        let start = *self
            .line_starts
            .get(index)
            .ok_or_else(|| DocumentError::LineOutOfRange {
                path: self.path.display().to_string(),
                line,
                line_count: self.line_starts.len(),
            })?;
        let end = self
            .line_starts
            .get(index + 1)
            .map_or(self.text.len(), |next| next - 1);
        let content = self.text.get(start..end).unwrap_or_default();
        Ok((start, content.strip_suffix('\r').unwrap_or(content)))
    }

    /// Byte offset of `position`. Columns past the end of the line clamp to it.
    pub fn byte_offset_at(&self, position: Position) -> Result<usize, DocumentError> {
        let (line_start, content) = self.line_text(position.line)?;
        Ok(line_start + byte_index_of_column(content, position.character))
    }

    /// The identifier touching `position`, if any. A caret just after the last
    /// character of a word still selects it.
    pub fn word_range_at(&self, position: Position) -> Option<Range> {
        let (_, content) = self.line_text(position.line).ok()?;
        let caret = byte_index_of_column(content, position.character);

        let start = content
            .get(..caret)?
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_word_char(*c))
            .last()
            .map_or(caret, |(i, _)| i);
        let end = content
            .get(caret..)?
            .char_indices()
            .find(|(_, c)| !is_word_char(*c))
            .map_or(content.len(), |(i, _)| caret + i);

        if start == end {
            return None;
        }
        Some(Range::new(
            position.line,
            utf16_len(content.get(..start)?),
            position.line,
            utf16_len(content.get(..end)?),
        ))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte index within `line` of a UTF-16 column, clamped to the line length.
fn byte_index_of_column(line: &str, column: u32) -> usize {
    let column = column as usize;
    let mut units = 0usize;
    for (index, c) in line.char_indices() {
        if units >= column {
            return index;
        }
        units += c.len_utf16();
    }
    line.len()
}

fn utf16_len(text: &str) -> u32 {
    let units: usize = text.chars().map(char::len_utf16).sum();
    u32::try_from(units).unwrap_or(u32::MAX)
}
