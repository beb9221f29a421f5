//! folio CLI - paginate a document JSON file with estimated heights
//! The main interface is through WASM bindings, which measure real markup.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

use folio::{paginate_headless, Document, PageGeometry, PaginationOptions, Result};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Paginate a block document into two-column pages", long_about = None)]
struct Cli {
    /// Input document JSON (`{ "type": "doc", "content": [...] }`)
    #[arg(value_name = "DOCUMENT")]
    document: PathBuf,

    /// Display options JSON; auto-pagination is on when omitted
    #[arg(value_name = "OPTIONS")]
    options: Option<PathBuf>,

    /// Page geometry JSON (page size and margins in CSS pixels)
    #[arg(long, value_name = "FILE")]
    geometry: Option<PathBuf>,

    /// Split at manual page breaks only
    #[arg(long)]
    manual: bool,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output compact JSON
    #[arg(long)]
    compact: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let document = Document::from_json(&fs::read_to_string(&cli.document)?)?;

    let mut options = match &cli.options {
        Some(path) => PaginationOptions::from_json(&fs::read_to_string(path)?)?,
        None => PaginationOptions {
            auto_paginate: true,
            ..Default::default()
        },
    };
    if cli.manual {
        options.auto_paginate = false;
    }

    let geometry = match &cli.geometry {
        Some(path) => serde_json::from_str::<PageGeometry>(&fs::read_to_string(path)?)?,
        None => PageGeometry::default(),
    };

    let (state, pages) = paginate_headless(document, geometry, options);
    log::info!("{} pages ({})", pages.len(), state);

    let json = if cli.compact {
        serde_json::to_string(&pages)?
    } else {
        serde_json::to_string_pretty(&pages)?
    };
    write_output(cli.output.as_deref(), &json)?;
    Ok(())
}

fn write_output(path: Option<&Path>, json: &str) -> std::io::Result<()> {
    match path {
        Some(path) => fs::write(path, json),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}
