use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use yt_match::config::{
    ProviderConfig, DEFAULT_CONCURRENCY, DEFAULT_QUERIES_PATH, DEFAULT_RESULTS_PATH, DEFAULT_TIMEOUT_SECS,
    TIMEOUT_ENV, YT_DLP_BIN_ENV,
};
use yt_match::dispatch::{dispatch, DispatchOptions};
use yt_match::progress::{init_logging, set_log_only};
use yt_match::provider::YtDlpProvider;
use yt_match::queries::load_queries;
use yt_match::report::print_dispatch_summary;
use yt_match::store::ResultStore;

#[derive(Parser)]
#[command(name = "yt-match")]
#[command(about = "Search YouTube for each query line and record confidence-scored matches")]
struct Args {
    /// Query file, one "Artist - Song" per line
    #[arg(long, default_value = DEFAULT_QUERIES_PATH)]
    queries: PathBuf,

    /// JSONL result store
    #[arg(long, default_value = DEFAULT_RESULTS_PATH)]
    results: PathBuf,

    /// First query index to process
    #[arg(long, default_value = "0")]
    start: usize,

    /// Stop before this query index
    #[arg(long)]
    end: Option<usize>,

    /// Searches in flight at once (0 is treated as 1)
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Truncate the store and reprocess the range instead of resuming
    #[arg(long)]
    overwrite: bool,

    /// Per-search timeout in seconds
    #[arg(long, env = TIMEOUT_ENV, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// yt-dlp binary
    #[arg(long = "yt-dlp", env = YT_DLP_BIN_ENV, default_value = "yt-dlp")]
    yt_dlp: String,

    /// Hide progress bars and print tail-friendly progress lines
    #[arg(long)]
    log_only: bool,

    /// Write the confidence tally as JSON to this file
    #[arg(long)]
    stats: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();
    set_log_only(args.log_only);

    let start = Instant::now();

    let queries = load_queries(&args.queries)?;
    println!(
        "Loaded {} queries from {}",
        queries.len(),
        args.queries.display()
    );

    let store = ResultStore::new(&args.results);
    let _lock = store.lock().context("Failed to lock result store")?;

    let provider = YtDlpProvider::new(
        ProviderConfig::default()
            .with_binary(args.yt_dlp)
            .with_timeout(Duration::from_secs(args.timeout)),
    );

    let options = DispatchOptions {
        start: args.start,
        end: args.end,
        concurrency: args.concurrency,
        overwrite: args.overwrite,
    };
    let summary = dispatch(&queries, &options, Arc::new(provider), &store)
        .await
        .context("Dispatch failed")?;

    print_dispatch_summary(&summary, store.path(), start.elapsed());

    if let Some(path) = args.stats {
        summary
            .tally
            .write_to_file(&path)
            .with_context(|| format!("Failed to write stats to {}", path.display()))?;
    }

    Ok(())
}
