// src/cli/handlers/exec.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use std::io::Write;

use crate::{
    CancellationToken,
    cli::handlers::commons::Session,
    system::executor::{CommandInvocation, ExecutionError},
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Runs a program through the execution shim, exactly as the tools are run."
)]
struct ExecArgs {
    /// Run one command string through the platform shell instead. The string
    /// is passed as is, without path translation.
    #[arg(long, conflicts_with = "command")]
    shell: Option<String>,
    /// The program and its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

pub fn handle(args: Vec<String>, _cancel: &CancellationToken) -> Result<()> {
    let exec_args = ExecArgs::try_parse_from(&args)?;
    let session = Session::load(None)?;
    let shim = session.runner.shim();

    if let Some(command_line) = exec_args.shell {
        let stdout = shim.run_sync(&command_line)?;
        std::io::stdout().write_all(&stdout)?;
        return Ok(());
    }

    let mut words = exec_args.command.into_iter();
    let program = words
        .next()
        .ok_or_else(|| anyhow!(t!("exec.error.no_program")))?;
    let invocation = CommandInvocation::new(program)
        .args(words)
        .cwd(std::env::current_dir()?);

    match shim.spawn_sync(&invocation) {
        Ok(output) => {
            std::io::stdout().write_all(&output.stdout)?;
            std::io::stderr().write_all(&output.stderr)?;
            Ok(())
        }
        Err(ExecutionError::NonZeroExit {
            program,
            code,
            stdout,
            stderr,
        }) => {
            print!("{}", stdout);
            eprint!("{}", stderr);
            Err(ExecutionError::NonZeroExit {
                program,
                code,
                stdout: String::new(),
                stderr: String::new(),
            }
            .into())
        }
        Err(e) => Err(e.into()),
    }
}
