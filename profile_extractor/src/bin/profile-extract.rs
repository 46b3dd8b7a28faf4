//! Extract a profile record from a saved HTML page and print it as JSON.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use profile_extractor::{save_snapshot, Extractor, HtmlDocument, ScraperConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "profile-extract",
    version,
    about = "Extract a profile record from a saved HTML page"
)]
struct Cli {
    /// Saved HTML page
    html: PathBuf,

    /// Field-set TOML (defaults to the built-in guest profile)
    #[arg(long)]
    fields: Option<PathBuf>,

    /// Scraper config TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// URL the page was saved from; names the snapshot file
    #[arg(long)]
    url: Option<String>,

    /// Save a snapshot to the configured output directory
    #[arg(long)]
    save: bool,

    /// Save the snapshot here instead (implies --save)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the manifest and field reports along with the record
    #[arg(long)]
    manifest: bool,

    /// Exit with an error when a required field is missing
    #[arg(long)]
    strict: bool,

    /// -v for debug, -vv for trace
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => ScraperConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScraperConfig::default(),
    };
    if let Some(fields) = cli.fields {
        config.fields = Some(fields);
    }
    let fields = config.load_fields().context("loading field set")?;

    let path = &cli.html;
    let html = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let document = HtmlDocument::parse(&html);

    let mut result = Extractor::new(fields).extract(&document);
    if let Some(url) = cli.url {
        result = result.with_source_url(url);
    }

    let json = if cli.manifest {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string_pretty(&result.record)?
    };
    println!("{json}");

    if cli.save || cli.out.is_some() {
        let dir = cli.out.unwrap_or_else(|| config.output.dir.clone());
        save_snapshot(&dir, &config.output.file_prefix, &result)?;
    }

    if cli.strict && !result.is_complete() {
        bail!("missing required fields: {}", result.missing().join(", "));
    }
    Ok(())
}
