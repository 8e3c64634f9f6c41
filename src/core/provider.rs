// src/core/provider.rs

//! Plumbing shared by the tool providers: the error type they return and the
//! [`ToolRunner`] that launches a tool under a cancellation token.

use crate::CancellationToken;
use crate::core::config::{self, ConfigError};
use crate::core::diff::DiffError;
use crate::core::document::{DocumentError, TextDocument};
use crate::core::notify::Notifier;
use crate::core::tools::ToolLocator;
use crate::models::{Position, ShimConfig};
use crate::system::executor::{self, CommandInvocation, ExecResult, ExecutionMode, ProcessShim};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Error, Debug)]
pub enum ProviderError {
    /// The tool ran and rejected the request. Carries the user-facing message.
    #[error("{0}")]
    RenameFailed(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("Could not read the tool output: {0}")]
    Diff(#[from] DiffError),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Where a tool should look: the `<file>:#<offset>` argument and the
/// directory the tool runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolTarget {
    /// The document path as the tool will see it.
    pub file: String,
    pub offset: usize,
    pub cwd: Option<PathBuf>,
}

impl ToolTarget {
    pub fn offset_arg(&self) -> String {
        format!("{}:#{}", self.file, self.offset)
    }
}

/// Everything a provider needs to run one tool request.
#[derive(Clone)]
pub struct ToolRunner {
    shim: ProcessShim,
    locator: ToolLocator,
    build_tags: String,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for ToolRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRunner")
            .field("shim", &self.shim)
            .field("locator", &self.locator)
            .field("build_tags", &self.build_tags)
            .finish_non_exhaustive()
    }
}

impl ToolRunner {
    pub fn new(
        shim: ProcessShim,
        locator: ToolLocator,
        build_tags: impl Into<String>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            shim,
            locator,
            build_tags: build_tags.into(),
            notifier,
        }
    }

    /// Builds the shim and tool locator described by `config`, reading the
    /// process environment for tool lookup.
    pub fn from_config(config: &ShimConfig, notifier: Arc<dyn Notifier>) -> Result<Self, ConfigError> {
        let mode = config::execution_mode(config)?;
        let locator = ToolLocator::from_env(&config.tools, &mode);
        Ok(Self::new(
            ProcessShim::new(mode),
            locator,
            config.build_tags.clone(),
            notifier,
        ))
    }

    pub fn shim(&self) -> &ProcessShim {
        &self.shim
    }

    pub fn locator(&self) -> &ToolLocator {
        &self.locator
    }

    pub fn build_tags(&self) -> &str {
        &self.build_tags
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// The execution mode this request will use from start to finish.
    pub fn snapshot_mode(&self) -> ExecutionMode {
        self.shim.mode().clone()
    }

    /// Computes the tool's view of `position` in `doc`.
    pub fn target(
        &self,
        doc: &TextDocument,
        position: Position,
        mode: &ExecutionMode,
    ) -> Result<ToolTarget, ProviderError> {
        let offset = doc.byte_offset_at(position)?;
        let file_name = self
            .locator
            .canonical_file_name(&doc.path().to_string_lossy());
        let cwd = executor::parent_dir(&PathBuf::from(&file_name));
        Ok(ToolTarget {
            file: mode.outbound_path(&file_name),
            offset,
            cwd,
        })
    }

    /// Runs `invocation` to completion. Cancelling `cancel` terminates the
    /// process; the outcome is then [`ExecutionError::Cancelled`].
    ///
    /// The outer `Result` only fails when the outcome was lost.
    ///
    /// [`ExecutionError::Cancelled`]: crate::system::executor::ExecutionError::Cancelled
    pub async fn run(
        &self,
        invocation: &CommandInvocation,
        cancel: &CancellationToken,
    ) -> Result<ExecResult, ProviderError> {
        let (tx, mut rx) = oneshot::channel();
        let handle = self.shim.run_async(invocation, move |outcome| {
            if tx.send(outcome).is_err() {
                log::trace!("Tool outcome arrived after the request was dropped.");
            }
        });

        let received = tokio::select! {
            biased;
            received = &mut rx => received,
            () = cancel.cancelled() => {
                log::debug!("Request cancelled, terminating '{}'.", invocation.program());
                handle.terminate();
                rx.await
            }
        };
        received.map_err(|_| {
            ProviderError::Internal(format!(
                "the outcome of '{}' was lost",
                invocation.program()
            ))
        })
    }
}
