//! Error taxonomy for the search pipeline.
//!
//! Per-query failures (`ProviderError`) are turned into the `error` field of
//! a record and never escape the operation that produced them. Store errors
//! surface to the caller. Setup failures live in the binaries as `anyhow`
//! errors with context.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single external search.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The search binary could not be started at all
    #[error("failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },

    /// Non-zero exit; the message is the provider's own diagnostic text
    #[error("{}", exit_message(.code, .stderr))]
    Exit { code: Option<i32>, stderr: String },

    #[error("search timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Output was not valid JSON
    #[error("JSON decode error: {0}")]
    Parse(String),

    /// Exit status 0 but nothing on stdout
    #[error("no search results")]
    NoResult,

    #[error("empty query")]
    EmptyQuery,
}

fn exit_message(code: &Option<i32>, stderr: &str) -> String {
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    match code {
        Some(code) => format!("search exited with status {}", code),
        None => "search terminated by signal".to_string(),
    }
}

/// Failure touching the result store as a whole.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result store I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode record {index}: {source}")]
    Encode {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("result store {} is locked by another process", .0.display())]
    Locked(PathBuf),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A stored line that could not be decoded. Logged and counted, never fatal.
#[derive(Debug, Clone, Error)]
#[error("line {line}: {reason}")]
pub struct MalformedRecord {
    /// 1-based line number in the store file
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Error)]
#[error("unknown confidence tier '{0}' (expected high, medium, low or none)")]
pub struct UnknownConfidence(pub String);
