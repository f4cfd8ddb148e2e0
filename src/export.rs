//! Read-only views over stored results for downstream tools: the list of
//! video ids to import into a playlist, and a TSV of rows that need manual
//! review.

use crate::models::{Confidence, ResultRecord};

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Which records qualify for id export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TierFilter {
    #[default]
    Any,
    Exactly(Confidence),
    AtLeast(Confidence),
}

impl TierFilter {
    pub fn accepts(self, confidence: Confidence) -> bool {
        match self {
            TierFilter::Any => true,
            TierFilter::Exactly(tier) => confidence == tier,
            TierFilter::AtLeast(tier) => confidence >= tier,
        }
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("{}{}", WATCH_URL_PREFIX, video_id)
}

/// Video ids of successful matches passing `filter`, in record order.
/// Records with an error or without an id are never exported.
pub fn video_ids(records: &[ResultRecord], filter: TierFilter) -> Vec<&str> {
    records
        .iter()
        .filter(|r| !r.is_error() && filter.accepts(r.confidence))
        .filter_map(|r| r.video_id.as_deref())
        .collect()
}

/// Tab/newline safe cell
fn cell(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

/// TSV rows (`index, url, query, title`) for every low, none or failed
/// record. The url column is empty when there is no video id.
pub fn review_rows(records: &[ResultRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.is_error() || r.confidence <= Confidence::Low)
        .map(|r| {
            format!(
                "{}\t{}\t{}\t{}",
                r.index,
                r.video_id.as_deref().map(watch_url).unwrap_or_default(),
                cell(&r.query),
                cell(r.title.as_deref().unwrap_or(""))
            )
        })
        .collect()
}
