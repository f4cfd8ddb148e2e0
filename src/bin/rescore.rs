//! Re-score stored search results without re-running any searches.
//!
//! Usage: rescore [--results data/results.jsonl] [-o rescored.jsonl] [--show-changes]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use yt_match::config::DEFAULT_RESULTS_PATH;
use yt_match::progress::{create_spinner, init_logging, set_log_only};
use yt_match::report::print_rescore_summary;
use yt_match::rescore::rescore_store;
use yt_match::store::ResultStore;

#[derive(Parser)]
#[command(name = "rescore")]
#[command(about = "Re-score search results with the current confidence rules")]
struct Args {
    /// JSONL result store to read
    #[arg(long, default_value = DEFAULT_RESULTS_PATH)]
    results: PathBuf,

    /// Output file (default: rewrite the result store in place)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// List every record whose confidence changed
    #[arg(long)]
    show_changes: bool,

    /// Hide the spinner
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();
    set_log_only(args.log_only);

    if !args.results.exists() {
        anyhow::bail!("Result store {} not found", args.results.display());
    }

    let source = ResultStore::new(&args.results);
    let output = ResultStore::new(args.output.as_ref().unwrap_or(&args.results));

    let _source_lock = source.lock().context("Failed to lock result store")?;
    let _output_lock = if output.path() != source.path() {
        Some(output.lock().context("Failed to lock output store")?)
    } else {
        None
    };

    let spinner = create_spinner("Re-scoring");
    let outcome = rescore_store(&source, &output).context("Re-scoring failed")?;
    spinner.finish_and_clear();

    print_rescore_summary(&outcome, output.path(), args.show_changes);
    Ok(())
}
