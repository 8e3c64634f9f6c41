// src/cli/handlers/commons.rs

// Shared plumbing for the command handlers: loading the session, running a
// request on a runtime wired to Ctrl+C, and the terminal notifier.

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::future::Future;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::{
    CancellationToken,
    cli::handlers::install,
    core::{config, document::TextDocument, notify::Notifier, provider::ToolRunner, tools},
    models::ShimConfig,
    system::executor::ExecutionError,
};

/// Prints notifications to the terminal and remembers which tools were missing
/// so the handler can offer to install them once the request is over.
#[derive(Debug, Default)]
pub struct CliNotifier {
    missing: Mutex<Vec<String>>,
}

impl CliNotifier {
    fn take_missing(&self) -> Vec<String> {
        match self.missing.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Notifier for CliNotifier {
    fn tool_missing(&self, tool: &str) {
        eprintln!(
            "{}",
            format!(t!("notify.warning.tool_missing"), tool = tool).yellow()
        );
        match self.missing.lock() {
            Ok(mut guard) => guard.push(tool.to_string()),
            Err(poisoned) => poisoned.into_inner().push(tool.to_string()),
        }
    }

    fn error(&self, message: &str) {
        eprintln!("{}", message.red());
    }
}

/// The loaded configuration plus a runner built from it.
#[derive(Debug)]
pub struct Session {
    pub config: ShimConfig,
    pub runner: ToolRunner,
    notifier: Arc<CliNotifier>,
}

impl Session {
    /// Loads `config.toml` and the environment. `build_tags` overrides the
    /// configured tags when given.
    pub fn load(build_tags: Option<String>) -> Result<Self> {
        let mut config = config::load().context(t!("session.error.config_load"))?;
        if let Some(tags) = build_tags {
            config.build_tags = tags;
        }
        let notifier = Arc::new(CliNotifier::default());
        let runner = ToolRunner::from_config(&config, notifier.clone())
            .context(t!("session.error.config_invalid"))?;
        Ok(Self {
            config,
            runner,
            notifier,
        })
    }

    /// After a request: offers to install the tools reported missing, or
    /// prints how to do it when nobody is at the terminal.
    pub fn offer_install(&self) -> Result<()> {
        let missing = self.notifier.take_missing();
        if missing.is_empty() {
            return Ok(());
        }
        let known: Vec<&'static tools::KnownTool> = missing
            .iter()
            .filter_map(|name| tools::find_known_tool(name))
            .collect();
        let list = missing.join(", ");

        if !std::io::stdin().is_terminal() || known.is_empty() {
            eprintln!(
                "{}",
                format!(t!("notify.info.install_hint"), tools = list).dimmed()
            );
            return Ok(());
        }

        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(t!("install.prompt.confirm"), tools = list))
            .default(true)
            .interact()?;
        if confirmed {
            install::install_tools(&self.runner, &known)?;
        }
        Ok(())
    }
}

/// Runs `future` on a fresh multi-threaded runtime. Ctrl+C cancels `cancel`.
pub fn block_on_cancellable<F, T>(cancel: &CancellationToken, future: F) -> Result<T>
where
    F: Future<Output = T>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context(t!("session.error.runtime"))?;

    let token = cancel.clone();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::debug!("Ctrl+C received, cancelling the request.");
            token.cancel();
        }
    });

    Ok(runtime.block_on(future))
}

/// The error a handler returns when the user cancelled; `main` exits with 130.
pub fn cancelled() -> anyhow::Error {
    anyhow::Error::new(ExecutionError::Cancelled)
}

/// Opens the Go file a request is about, by its absolute path.
pub fn open_document(file: &Path) -> Result<TextDocument> {
    let path: PathBuf = dunce::canonicalize(file)
        .with_context(|| format!(t!("document.error.not_found"), path = file.display()))?;
    Ok(TextDocument::open(&path)?)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context(t!("output.error.json"))?;
    println!("{}", json);
    Ok(())
}
