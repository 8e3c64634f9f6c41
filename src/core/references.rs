// src/core/references.rs

//! Find-references through `guru referrers`.
//!
//! Tool failures never surface as errors here: a missing `guru` triggers one
//! notification, a failing run is logged (and its stderr passed on), and both
//! yield no locations.

use crate::CancellationToken;
use crate::constants::GURU;
use crate::core::document::TextDocument;
use crate::core::notify::Notifier;
use crate::core::provider::{ProviderError, ToolRunner};
use crate::models::{Location, Position, Range};
use crate::system::executor::{CommandInvocation, ExecResult, ExecutionError, ExecutionMode};
use crate::system::path_translator::PathForm;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

lazy_static! {
    // <file>:<line>.<col>-<line>.<col>: <text>
    static ref REFERRER_RE: Regex = Regex::new(r"^(.*):(\d+)\.(\d+)-(\d+)\.(\d+):").unwrap();
}

#[derive(Debug, Clone)]
pub struct ReferenceProvider {
    runner: ToolRunner,
}

impl ReferenceProvider {
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }

    pub async fn find_references(
        &self,
        doc: &TextDocument,
        position: Position,
        cancel: &CancellationToken,
    ) -> Result<Vec<Location>, ProviderError> {
        if doc.word_range_at(position).is_none() {
            log::debug!("No identifier at {}, nothing to look up.", position);
            return Ok(Vec::new());
        }

        let mode = self.runner.snapshot_mode();
        let target = self.runner.target(doc, position, &mode)?;
        let mut invocation = CommandInvocation::new(self.runner.locator().resolve(GURU)).args([
            "-tags".to_string(),
            self.runner.build_tags().to_string(),
            "referrers".to_string(),
            target.offset_arg(),
        ]);
        if let Some(cwd) = &target.cwd {
            invocation = invocation.cwd(cwd);
        }

        let outcome = self.runner.run(&invocation, cancel).await?;
        Ok(referrers_from_outcome(
            outcome,
            target.cwd.as_deref(),
            &mode,
            self.runner.notifier(),
        ))
    }
}

/// Turns the outcome of a `guru referrers` run into locations.
pub fn referrers_from_outcome(
    outcome: ExecResult,
    cwd: Option<&Path>,
    mode: &ExecutionMode,
    notifier: &dyn Notifier,
) -> Vec<Location> {
    match outcome {
        Ok(output) => parse_referrers_output(&output.stdout_text(), cwd, mode),
        Err(ExecutionError::NotFound { program }) => {
            log::debug!("'{}' is not installed.", program);
            notifier.tool_missing(GURU);
            Vec::new()
        }
        Err(ExecutionError::Cancelled) => {
            log::debug!("Reference lookup cancelled.");
            Vec::new()
        }
        Err(ExecutionError::NonZeroExit { stderr, .. }) if !stderr.trim().is_empty() => {
            log::warn!("{} referrers failed: {}", GURU, stderr.trim());
            notifier.error(stderr.trim());
            Vec::new()
        }
        Err(e) => {
            log::warn!("{} referrers failed: {}", GURU, e);
            Vec::new()
        }
    }
}

/// Parses `guru referrers` output. Lines that do not start with a position
/// prefix are skipped.
pub fn parse_referrers_output(stdout: &str, cwd: Option<&Path>, mode: &ExecutionMode) -> Vec<Location> {
    log::trace!("guru output:\n{}", stdout);
    stdout
        .lines()
        .filter_map(|line| parse_referrer_line(line, cwd, mode))
        .collect()
}

fn parse_referrer_line(line: &str, cwd: Option<&Path>, mode: &ExecutionMode) -> Option<Location> {
    let caps = REFERRER_RE.captures(line)?;
    let number = |index: usize| -> Option<u32> { caps.get(index)?.as_str().parse().ok() };
    let (start_line, start_col) = (number(2)?, number(3)?);
    let (end_line, end_col) = (number(4)?, number(5)?);

    let file = mode.inbound_path(caps.get(1)?.as_str());
    // Lines and start columns are one-based; guru's end column is already exclusive.
    let range = Range::new(
        start_line.saturating_sub(1),
        start_col.saturating_sub(1),
        end_line.saturating_sub(1),
        end_col,
    );
    Some(Location {
        path: resolve_against(cwd, &file),
        range,
    })
}

fn resolve_against(cwd: Option<&Path>, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() || PathForm::classify(file).is_native() {
        return path.to_path_buf();
    }
    match cwd {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}
