// src/bin/goshim.rs

use clap::Parser;
use colored::*;
use goshim::{
    CancellationToken,
    cli::{Cli, dispatcher},
    system::executor::ExecutionError,
};

/// Sets up logging, parses arguments, dispatches to the command handler and
/// reports errors in one place.
fn main() {
    env_logger::init();
    let cancellation_token = CancellationToken::new();

    if let Err(e) = dispatcher::dispatch(Cli::parse().args, &cancellation_token) {
        // A cancelled request exits quietly with the shell's interrupt code.
        if matches!(
            e.downcast_ref::<ExecutionError>(),
            Some(ExecutionError::Cancelled)
        ) {
            std::process::exit(130);
        }

        // Argument errors from the per-command parsers print their own usage.
        if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
            clap_err.exit();
        }

        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}
