//! Stamp the branded PDF contracts
//!
//! Overlays the firm header, footer page numbers and a first-page title
//! on the contract template, once per agreement.

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::process;

use contract_branding::Error;
use contract_branding::config::{BrandSpec, ContractPaths, ContractVariant};
use contract_branding::pdf::stamp_contracts;

/// Stamp the contract template PDF with the firm branding
#[derive(Parser)]
#[command(name = "stamp-contracts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project root holding the template, assets/ and contracts/
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Log each step
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn run(root: &Path) -> Result<Vec<PathBuf>> {
    let paths = ContractPaths::rooted(root);
    match stamp_contracts(&paths, &BrandSpec::default(), &ContractVariant::defaults()) {
        // already names the missing path
        Err(e @ Error::TemplateNotFound(_)) => Err(e.into()),
        result => result.with_context(|| format!("Stamping PDF contracts in {}", paths.output_dir.display())),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli.root) {
        Ok(written) => {
            for path in written {
                println!("Wrote {}", path.display());
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
