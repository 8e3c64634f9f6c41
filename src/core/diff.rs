// src/core/diff.rs

//! Unified diff parsing for `gorename -d` output.
//!
//! Every contiguous run of removed and added lines inside a hunk becomes one
//! [`TextEdit`] replacing whole lines of the old file.

use crate::models::{Range, TextEdit};
use std::iter::Peekable;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DiffError {
    #[error("Invalid hunk header '{0}'.")]
    InvalidHunkHeader(String),
    #[error("Hunk '{0}' appears before any '---' file header.")]
    OrphanHunk(String),
    #[error("Hunk '{header}' of '{file}' does not match its line counts.")]
    MalformedHunk { file: String, header: String },
}

/// The edits a diff applies to one file, in old-file line order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePatch {
    /// Name from the `---` header, timestamp stripped.
    pub file_name: String,
    pub edits: Vec<TextEdit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkHeader {
    old_start: u32,
    old_count: u32,
    new_start: u32,
    new_count: u32,
}

pub fn parse_unified_diff(diff: &str) -> Result<Vec<FilePatch>, DiffError> {
    let mut patches: Vec<FilePatch> = Vec::new();
    let mut lines = diff.lines().peekable();

    while let Some(line) = lines.next() {
        if let Some(name) = line.strip_prefix("--- ") {
            let file_name = name.split('\t').next().unwrap_or(name).trim_end();
            patches.push(FilePatch {
                file_name: file_name.to_string(),
                edits: Vec::new(),
            });
        } else if line.starts_with("@@") {
            let header = parse_hunk_header(line)
                .ok_or_else(|| DiffError::InvalidHunkHeader(line.to_string()))?;
            let patch = patches
                .last_mut()
                .ok_or_else(|| DiffError::OrphanHunk(line.to_string()))?;
            let edits = read_hunk(&header, line, &patch.file_name, &mut lines)?;
            patch.edits.extend(edits);
        }
        // `+++`, `diff -u ...` and any other header noise is skipped.
    }

    log::trace!("Parsed diff touching {} file(s).", patches.len());
    Ok(patches)
}

/// `@@ -a[,b] +c[,d] @@[ section]`
fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let inner = line.strip_prefix("@@ -")?;
    let (ranges, _) = inner.split_once(" @@")?;
    let (old, new) = ranges.split_once(" +")?;
    let (old_start, old_count) = parse_hunk_range(old)?;
    let (new_start, new_count) = parse_hunk_range(new)?;
    Some(HunkHeader {
        old_start,
        old_count,
        new_start,
        new_count,
    })
}

fn parse_hunk_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// A run of `-`/`+` lines not yet turned into an edit.
struct PendingEdit<'a> {
    start: u32,
    removed: u32,
    added: Vec<&'a str>,
}

impl PendingEdit<'_> {
    /// `None` when the edit would end past `u32::MAX`.
    fn into_edit(self) -> Option<TextEdit> {
        let end = self.start.checked_add(self.removed)?;
        Some(TextEdit {
            range: Range::new(self.start, 0, end, 0),
            new_text: self.added.iter().map(|line| format!("{}\n", line)).collect(),
        })
    }
}

/// Advances a line counter, failing instead of wrapping.
fn bump(counter: &mut u32) -> Option<()> {
    *counter = counter.checked_add(1)?;
    Some(())
}

fn read_hunk<'a, I>(
    header: &HunkHeader,
    header_line: &str,
    file_name: &str,
    lines: &mut Peekable<I>,
) -> Result<Vec<TextEdit>, DiffError>
where
    I: Iterator<Item = &'a str>,
{
    let malformed = || DiffError::MalformedHunk {
        file: file_name.to_string(),
        header: header_line.to_string(),
    };

    // An empty old range means "insert after line old_start".
    let mut old_line = if header.old_count == 0 {
        header.old_start
    } else {
        header.old_start.saturating_sub(1)
    };
    let (mut old_seen, mut new_seen) = (0u32, 0u32);
    let mut pending: Option<PendingEdit<'a>> = None;
    let mut edits = Vec::new();

    while old_seen < header.old_count || new_seen < header.new_count {
        let line = lines.next().ok_or_else(malformed)?;
        let mut chars = line.chars();
        match chars.next() {
            Some('\\') => continue,
            // Some tools strip the single space off empty context lines.
            Some(' ') | None => {
                if let Some(run) = pending.take() {
                    edits.push(run.into_edit().ok_or_else(malformed)?);
                }
                bump(&mut old_line).ok_or_else(malformed)?;
                bump(&mut old_seen).ok_or_else(malformed)?;
                bump(&mut new_seen).ok_or_else(malformed)?;
            }
            Some('-') => {
                let run = pending.get_or_insert_with(|| PendingEdit {
                    start: old_line,
                    removed: 0,
                    added: Vec::new(),
                });
                bump(&mut run.removed).ok_or_else(malformed)?;
                bump(&mut old_line).ok_or_else(malformed)?;
                bump(&mut old_seen).ok_or_else(malformed)?;
            }
            Some('+') => {
                pending
                    .get_or_insert_with(|| PendingEdit {
                        start: old_line,
                        removed: 0,
                        added: Vec::new(),
                    })
                    .added
                    .push(chars.as_str());
                bump(&mut new_seen).ok_or_else(malformed)?;
            }
            Some(_) => return Err(malformed()),
        }
    }
    if old_seen != header.old_count || new_seen != header.new_count {
        return Err(malformed());
    }
    while lines.peek().is_some_and(|line| line.starts_with('\\')) {
        lines.next();
    }
    if let Some(run) = pending.take() {
        edits.push(run.into_edit().ok_or_else(malformed)?);
    }

    log::trace!(
        "Hunk -{},{} +{},{} produced {} edit(s).",
        header.old_start,
        header.old_count,
        header.new_start,
        header.new_count,
        edits.len()
    );
    Ok(edits)
}
