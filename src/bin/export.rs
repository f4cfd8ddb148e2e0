//! Export video ids or a manual-review sheet from stored search results.
//!
//! Usage: export-results [--confidence high | --min-confidence medium] [-o ids.txt]
//!        export-results --review [-o review.tsv]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use yt_match::config::DEFAULT_RESULTS_PATH;
use yt_match::export::{review_rows, video_ids, TierFilter};
use yt_match::models::Confidence;
use yt_match::progress::init_logging;
use yt_match::store::{latest_by_index, ResultStore};

#[derive(Parser)]
#[command(name = "export-results")]
#[command(about = "Export matched video ids or a review TSV from the result store")]
struct Args {
    /// JSONL result store to read
    #[arg(long, default_value = DEFAULT_RESULTS_PATH)]
    results: PathBuf,

    /// Only records with exactly this confidence
    #[arg(long, conflicts_with = "min_confidence")]
    confidence: Option<Confidence>,

    /// Only records with at least this confidence
    #[arg(long)]
    min_confidence: Option<Confidence>,

    /// Emit low/none/error rows as TSV for manual review instead of ids
    #[arg(long, conflicts_with_all = ["confidence", "min_confidence"])]
    review: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let store = ResultStore::new(&args.results);
    let loaded = store
        .load_all()
        .with_context(|| format!("Failed to read {}", args.results.display()))?;
    let records = latest_by_index(loaded.records);

    let lines: Vec<String> = if args.review {
        review_rows(&records)
    } else {
        let filter = match (args.confidence, args.min_confidence) {
            (Some(tier), _) => TierFilter::Exactly(tier),
            (None, Some(tier)) => TierFilter::AtLeast(tier),
            (None, None) => TierFilter::Any,
        };
        video_ids(&records, filter).into_iter().map(str::to_string).collect()
    };

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    for line in &lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;

    eprintln!("Exported {} of {} records", lines.len(), records.len());
    Ok(())
}
