//! Build the branded DOCX contracts
//!
//! Converts the contract template PDF to DOCX once, then writes the
//! monthly and catch-up agreements with the firm header and footer.

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::process;

use contract_branding::Error;
use contract_branding::config::{BrandSpec, ContractPaths, ContractVariant};
use contract_branding::contracts::make_docx_contracts;

/// Convert the contract template to DOCX and brand two copies
#[derive(Parser)]
#[command(name = "make-docx-contracts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project root holding the template, assets/ and contracts/
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Log each step
    #[arg(short, long)]
    verbose: bool,

    /// Rebuild the cached base DOCX and PNG logo
    #[arg(long)]
    refresh: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn run(root: &Path, refresh: bool) -> Result<Vec<PathBuf>> {
    let paths = ContractPaths::rooted(root);
    match make_docx_contracts(&paths, &BrandSpec::default(), &ContractVariant::defaults(), refresh) {
        // already names the missing path
        Err(e @ Error::TemplateNotFound(_)) => Err(e.into()),
        result => result.with_context(|| format!("Building DOCX contracts in {}", paths.output_dir.display())),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli.root, cli.refresh) {
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
