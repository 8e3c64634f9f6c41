// src/cli/handlers/install.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::*;

use crate::{
    CancellationToken,
    cli::handlers::commons::Session,
    constants::GO,
    core::{
        provider::ToolRunner,
        tools::{self, KnownTool},
    },
    system::executor::{CommandInvocation, ExecutionError},
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Installs the Go tools goshim runs (go install <tool>@latest)."
)]
struct InstallArgs {
    /// Tools to install. Installs every known tool when omitted.
    tools: Vec<String>,
}

pub fn handle(args: Vec<String>, _cancel: &CancellationToken) -> Result<()> {
    let install_args = InstallArgs::try_parse_from(&args)?;
    let selected = select_tools(&install_args.tools)?;
    let session = Session::load(None)?;
    install_tools(&session.runner, &selected)
}

fn select_tools(names: &[String]) -> Result<Vec<&'static KnownTool>> {
    if names.is_empty() {
        return Ok(tools::KNOWN_TOOLS.iter().collect());
    }
    names
        .iter()
        .map(|name| {
            tools::find_known_tool(name).ok_or_else(|| {
                let known: Vec<&str> = tools::KNOWN_TOOLS.iter().map(|t| t.name).collect();
                anyhow!(
                    t!("install.error.unknown_tool"),
                    tool = name,
                    known = known.join(", ")
                )
            })
        })
        .collect()
}

/// Runs `go install` for each tool, through the shim so that alternate mode
/// installs inside the alternate environment.
pub fn install_tools(runner: &ToolRunner, selected: &[&KnownTool]) -> Result<()> {
    let go = runner.locator().resolve(GO);
    let mut failures = Vec::new();

    for tool in selected {
        println!(
            "{}",
            format!(
                t!("install.info.installing"),
                tool = tool.name.cyan(),
                import_path = tool.import_path
            )
        );
        let invocation = CommandInvocation::new(go.clone())
            .arg("install")
            .arg(format!("{}@latest", tool.import_path));

        match runner.shim().spawn_sync(&invocation) {
            Ok(_) => println!(
                "  {}",
                format!(t!("install.success.installed"), tool = tool.name).green()
            ),
            Err(ExecutionError::NotFound { .. }) => {
                return Err(anyhow!(t!("install.error.go_missing"), go = go));
            }
            Err(e) => {
                log::debug!("go install {} failed: {:?}", tool.import_path, e);
                let detail = match &e {
                    ExecutionError::NonZeroExit { stderr, .. } if !stderr.trim().is_empty() => {
                        stderr.trim().to_string()
                    }
                    other => other.to_string(),
                };
                eprintln!(
                    "  {}",
                    format!(t!("install.error.failed"), tool = tool.name, error = detail).red()
                );
                failures.push(tool.name);
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(anyhow!(
            t!("install.error.some_failed"),
            tools = failures.join(", ")
        ))
    }
}
