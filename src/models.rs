//! Core data models for the search pipeline.
//!
//! This module contains the record stored per query, the confidence tiers,
//! the provider's search hit, and the aggregate tallies used for reporting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownConfidence;
use crate::scoring::compute_confidence;

// ============================================================================
// Confidence
// ============================================================================

/// How well a search result matches its query.
///
/// Variants are declared weakest first so the derived `Ord` ranks
/// `None < Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

impl Confidence {
    /// All tiers, strongest first (report order)
    pub const ALL: [Confidence; 4] = [
        Confidence::High,
        Confidence::Medium,
        Confidence::Low,
        Confidence::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
            Confidence::None => "none",
        }
    }

    /// One-letter marker used in per-completion progress lines
    pub fn marker(self) -> char {
        match self {
            Confidence::High => 'H',
            Confidence::Medium => 'M',
            Confidence::Low => 'L',
            Confidence::None => 'N',
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = UnknownConfidence;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Confidence::High),
            "medium" => Ok(Confidence::Medium),
            "low" => Ok(Confidence::Low),
            "none" => Ok(Confidence::None),
            _ => Err(UnknownConfidence(s.to_string())),
        }
    }
}

// ============================================================================
// Provider Models
// ============================================================================

/// Best match returned by the search provider for one query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchHit {
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub channel: Option<String>,
    pub view_count: Option<u64>,
}

// ============================================================================
// Stored Records
// ============================================================================

/// One line of the result store.
///
/// All fields are always serialized (absent values as `null`), in this
/// order, so every line carries the full schema.
///
/// ## Invariants
///
/// - `index` is the 0-based position of `query` in the query file
/// - `confidence == None` whenever `title` and `channel` are both absent
/// - `error` is set only when the search or its output parsing failed, and
///   then `video_id` is absent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub index: usize,
    pub query: String,
    pub video_id: Option<String>,
    pub title: Option<String>,
    pub channel: Option<String>,
    pub view_count: Option<u64>,
    pub confidence: Confidence,
    pub error: Option<String>,
}

impl ResultRecord {
    /// Record for a successful search, scored against the query.
    pub fn from_hit(index: usize, query: &str, hit: SearchHit) -> Self {
        let confidence = compute_confidence(query, hit.title.as_deref(), hit.channel.as_deref());
        Self {
            index,
            query: query.to_string(),
            video_id: hit.video_id,
            title: hit.title,
            channel: hit.channel,
            view_count: hit.view_count,
            confidence,
            error: None,
        }
    }

    /// Record for a failed search.
    pub fn failed(index: usize, query: &str, error: impl Into<String>) -> Self {
        Self {
            index,
            query: query.to_string(),
            video_id: None,
            title: None,
            channel: None,
            view_count: None,
            confidence: Confidence::None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Confidence recomputed from the stored title/channel with the current
    /// scoring rules.
    pub fn rescored_confidence(&self) -> Confidence {
        compute_confidence(&self.query, self.title.as_deref(), self.channel.as_deref())
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Per-tier counts over a set of records.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfidenceTally {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub none: usize,
    /// Records with `error` set (these are also counted under `none`)
    pub errors: usize,
}

impl ConfidenceTally {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ResultRecord>) -> Self {
        let mut tally = Self::default();
        for record in records {
            tally.record(record);
        }
        tally
    }

    pub fn record(&mut self, record: &ResultRecord) {
        match record.confidence {
            Confidence::High => self.high += 1,
            Confidence::Medium => self.medium += 1,
            Confidence::Low => self.low += 1,
            Confidence::None => self.none += 1,
        }
        if record.is_error() {
            self.errors += 1;
        }
    }

    pub fn count(&self, confidence: Confidence) -> usize {
        match confidence {
            Confidence::High => self.high,
            Confidence::Medium => self.medium,
            Confidence::Low => self.low,
            Confidence::None => self.none,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low + self.none
    }

    /// Write the tally to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// A record whose confidence changed during re-scoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfidenceChange {
    pub index: usize,
    pub query: String,
    pub old: Confidence,
    pub new: Confidence,
}

impl ConfidenceChange {
    pub fn is_upgrade(&self) -> bool {
        self.new > self.old
    }
}
