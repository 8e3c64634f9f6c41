// src/cli/handlers/rename.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::*;
use std::path::PathBuf;

use crate::{
    CancellationToken,
    cli::handlers::commons::{self, Session},
    core::rename::RenameProvider,
    models::{Position, WorkspaceEdit},
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Renames the identifier at a position everywhere it is used (gorename)."
)]
struct RenameArgs {
    /// The Go source file.
    file: PathBuf,
    /// Zero-based line.
    line: u32,
    /// Zero-based character, in UTF-16 code units.
    character: u32,
    /// The new name for the identifier.
    new_name: String,
    /// Build tags passed to gorename, overriding the configured ones.
    #[arg(long)]
    tags: Option<String>,
    /// Print the resulting edit as JSON.
    #[arg(long)]
    json: bool,
}

pub fn handle(args: Vec<String>, cancel: &CancellationToken) -> Result<()> {
    let rename_args = RenameArgs::try_parse_from(&args)?;
    if rename_args.new_name.trim().is_empty() {
        return Err(anyhow!(t!("rename.error.empty_name")));
    }
    let session = Session::load(rename_args.tags)?;
    let doc = commons::open_document(&rename_args.file)?;
    let position = Position::new(rename_args.line, rename_args.character);

    let provider = RenameProvider::new(session.runner.clone());
    let edit = commons::block_on_cancellable(cancel, async {
        provider
            .rename(&doc, position, &rename_args.new_name, cancel)
            .await
    })??;
    if cancel.is_cancelled() {
        return Err(commons::cancelled());
    }

    match edit {
        Some(edit) if rename_args.json => commons::print_json(&edit)?,
        Some(edit) => print_edit(&edit, &rename_args.new_name),
        None if rename_args.json => println!("null"),
        None => println!("{}", t!("rename.info.nothing_done").yellow()),
    }
    session.offer_install()
}

fn print_edit(edit: &WorkspaceEdit, new_name: &str) {
    if edit.is_empty() {
        // gorename ran without -d and rewrote the files itself.
        println!(
            "{}",
            format!(t!("rename.success.in_place"), name = new_name).green()
        );
        return;
    }

    for (path, edits) in &edit.changes {
        println!("{}", path.display().to_string().cyan().bold());
        for text_edit in edits {
            let replacement = text_edit.new_text.trim_end_matches('\n');
            println!(
                "  {}-{} {}",
                text_edit.range.start,
                text_edit.range.end,
                replacement.replace('\n', "\n      ").green()
            );
        }
    }
    println!(
        "\n{}",
        format!(
            t!("rename.success.summary"),
            name = new_name,
            edits = edit.edit_count(),
            files = edit.file_count()
        )
        .dimmed()
    );
}
