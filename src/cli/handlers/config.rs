// src/cli/handlers/config.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;

use crate::{
    CancellationToken,
    cli::handlers::commons::Session,
    constants::{GO, GORENAME, GURU},
    core::paths,
    system::executor::ExecutionMode,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Shows the effective configuration and where it was loaded from."
)]
struct ConfigArgs {}

pub fn handle(args: Vec<String>, _cancel: &CancellationToken) -> Result<()> {
    let _config_args = ConfigArgs::try_parse_from(&args)?;
    let session = Session::load(None)?;
    let path = paths::get_config_file_path()?;

    println!("\n--- {} ---", t!("config.header"));
    println!("  {:<12} {}", t!("config.label.file").blue(), path.display());

    let mode = match session.runner.shim().mode() {
        ExecutionMode::Native => t!("config.value.native").to_string(),
        ExecutionMode::Alternate { shell } => {
            format!(t!("config.value.alternate"), shell = shell.display())
        }
    };
    println!("  {:<12} {}", t!("config.label.mode").blue(), mode);

    for tool in [GURU, GORENAME, GO] {
        println!(
            "  {:<12} {}",
            tool.blue(),
            session.runner.locator().resolve(tool)
        );
    }

    let toml = toml::to_string_pretty(&session.config).context(t!("config.error.serialize"))?;
    println!("\n{}", t!("config.label.effective").blue());
    for line in toml.lines() {
        println!("  {}", line.dimmed());
    }
    Ok(())
}
