// src/cli/handlers/references.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;

use crate::{
    CancellationToken,
    cli::handlers::commons::{self, Session},
    core::references::ReferenceProvider,
    models::{Location, Position},
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Lists every reference to the identifier at a position (guru referrers)."
)]
struct ReferencesArgs {
    /// The Go source file.
    file: PathBuf,
    /// Zero-based line.
    line: u32,
    /// Zero-based character, in UTF-16 code units.
    character: u32,
    /// Build tags passed to guru, overriding the configured ones.
    #[arg(long)]
    tags: Option<String>,
    /// Print the locations as JSON.
    #[arg(long)]
    json: bool,
}

pub fn handle(args: Vec<String>, cancel: &CancellationToken) -> Result<()> {
    let refs_args = ReferencesArgs::try_parse_from(&args)?;
    let session = Session::load(refs_args.tags)?;
    let doc = commons::open_document(&refs_args.file)?;
    let position = Position::new(refs_args.line, refs_args.character);

    let provider = ReferenceProvider::new(session.runner.clone());
    let locations = commons::block_on_cancellable(cancel, async {
        provider.find_references(&doc, position, cancel).await
    })??;
    if cancel.is_cancelled() {
        return Err(commons::cancelled());
    }

    if refs_args.json {
        commons::print_json(&locations)?;
    } else {
        print_locations(&locations);
    }
    session.offer_install()
}

fn print_locations(locations: &[Location]) {
    if locations.is_empty() {
        println!("{}", t!("references.info.none").yellow());
        return;
    }
    for location in locations {
        println!(
            "{}:{}",
            location.path.display().to_string().cyan(),
            location.range.start
        );
    }
    println!(
        "\n{}",
        format!(t!("references.info.count"), count = locations.len()).dimmed()
    );
}
