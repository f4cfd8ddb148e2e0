//! Concurrent, resumable query dispatch.
//!
//! Each pending query runs as its own task: search, score, append. At most
//! `concurrency` searches are in flight at once (semaphore permits). Records
//! are appended the moment they complete, so killing the process after N
//! completions leaves exactly N durable records and the next run resumes
//! from them.
//!
//! Precondition: nothing else mutates the store during a dispatch (take
//! `ResultStore::lock` first).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, StoreError};
use crate::models::{ConfidenceTally, ResultRecord};
use crate::progress::{create_progress_bar, log_progress, println_above};
use crate::provider::SearchProvider;
use crate::queries::select_range;
use crate::report::truncate_chars;
use crate::store::{ResultStore, WriteMode};

/// Interval (in completions) for log-only progress lines
const LOG_INTERVAL: u64 = 100;

/// What to dispatch and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    pub start: usize,
    /// Exclusive; `None` means through the last query
    pub end: Option<usize>,
    pub concurrency: usize,
    /// Truncate the store and reprocess the whole range instead of resuming
    pub overwrite: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            start: 0,
            end: None,
            concurrency: crate::config::DEFAULT_CONCURRENCY,
            overwrite: false,
        }
    }
}

/// Outcome of one dispatch run.
#[derive(Debug, Default)]
pub struct DispatchSummary {
    /// Queries in the requested range
    pub requested: usize,
    /// Queries in range that already had a record (resume)
    pub skipped: usize,
    /// Records produced by this run, sorted by index
    pub records: Vec<ResultRecord>,
    pub tally: ConfidenceTally,
    /// Records that were produced but could not be written
    pub append_failures: usize,
}

impl DispatchSummary {
    pub fn processed(&self) -> usize {
        self.records.len()
    }
}

/// Search one query and turn the outcome into its record. Never fails:
/// provider errors become the record's `error`.
pub async fn process_query(provider: &dyn SearchProvider, index: usize, query: &str) -> ResultRecord {
    if query.trim().is_empty() {
        return ResultRecord::failed(index, query, ProviderError::EmptyQuery.to_string());
    }
    match provider.search(query).await {
        Ok(hit) => ResultRecord::from_hit(index, query, hit),
        Err(e) => {
            debug!(index, provider = provider.name(), "search failed: {}", e);
            ResultRecord::failed(index, query, e.to_string())
        }
    }
}

/// Progress line for one completion: `[done/total] H [index] query`
fn completion_line(done: usize, total: usize, record: &ResultRecord) -> String {
    let marker = if record.video_id.is_some() {
        record.confidence.marker()
    } else {
        '✗'
    };
    format!(
        "[{}/{}] {} [{}] {}",
        done,
        total,
        marker,
        record.index,
        truncate_chars(&record.query, 50)
    )
}

/// Process every query in `[start, end)` that the store does not already
/// hold (or all of them when `overwrite` is set).
pub async fn dispatch(
    queries: &[String],
    options: &DispatchOptions,
    provider: Arc<dyn SearchProvider>,
    store: &ResultStore,
) -> Result<DispatchSummary, StoreError> {
    let selected = select_range(queries, options.start, options.end);
    let requested = selected.len();

    let pending: Vec<(usize, String)> = if options.overwrite {
        selected
    } else {
        let done = store.completed_indices()?;
        if !done.is_empty() {
            info!("Resuming: {} records already in {}", done.len(), store.path().display());
        }
        selected
            .into_iter()
            .filter(|(idx, _)| !done.contains(idx))
            .collect()
    };
    let skipped = requested - pending.len();

    if pending.is_empty() {
        info!("All {} queries in range already processed", requested);
        return Ok(DispatchSummary {
            requested,
            skipped,
            ..Default::default()
        });
    }

    let concurrency = options.concurrency.max(1);
    info!(
        "Processing {} queries (skipping {}), concurrency {}",
        pending.len(),
        skipped,
        concurrency
    );

    let mode = if options.overwrite {
        WriteMode::Truncate
    } else {
        WriteMode::Append
    };
    let writer = Arc::new(store.writer(mode).await?);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let completed = Arc::new(AtomicUsize::new(0));
    let total = pending.len();
    let pb = create_progress_bar(total as u64, "Searching");

    let mut tasks = JoinSet::new();
    for (index, query) in pending {
        let provider = Arc::clone(&provider);
        let writer = Arc::clone(&writer);
        let semaphore = Arc::clone(&semaphore);
        let completed = Arc::clone(&completed);
        let pb = pb.clone();

        tasks.spawn(async move {
            // The semaphore is never closed, so acquire cannot fail
            let _permit = semaphore.acquire_owned().await.ok()?;
            let record = process_query(provider.as_ref(), index, &query).await;

            let appended = match writer.append(&record).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(index, "failed to append record: {}", e);
                    false
                }
            };

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            println_above(&pb, &completion_line(done, total, &record));
            pb.inc(1);
            log_progress("search", done as u64, total as u64, LOG_INTERVAL);

            Some((record, appended))
        });
    }

    let mut records = Vec::with_capacity(total);
    let mut append_failures = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some((record, appended))) => {
                if !appended {
                    append_failures += 1;
                }
                records.push(record);
            }
            Ok(None) => warn!("query task ran without a permit"),
            Err(e) => warn!("query task failed: {}", e),
        }
    }
    pb.finish_with_message(format!("Searched {} queries", records.len()));

    records.sort_by_key(|r| r.index);
    let tally = ConfidenceTally::from_records(&records);

    Ok(DispatchSummary {
        requested,
        skipped,
        records,
        tally,
        append_failures,
    })
}
