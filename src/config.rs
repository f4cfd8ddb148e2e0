//! Runtime configuration shared by the binaries.

use std::time::Duration;

/// Default query file, one "Artist - Song" per line
pub const DEFAULT_QUERIES_PATH: &str = "data/queries.txt";

/// Default result store
pub const DEFAULT_RESULTS_PATH: &str = "data/results.jsonl";

/// Searches in flight at once unless overridden
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Env var overriding the yt-dlp binary
pub const YT_DLP_BIN_ENV: &str = "YT_DLP_BIN";

/// Env var overriding the per-search timeout in seconds
pub const TIMEOUT_ENV: &str = "YT_MATCH_TIMEOUT";

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// How the external search is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Program name or path of yt-dlp
    pub binary: String,
    /// Upper bound for a single search, including process startup
    pub timeout: Duration,
    /// Prefix turning a free-text query into a single-result search URL
    pub search_prefix: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            search_prefix: "ytsearch1:".to_string(),
        }
    }
}

impl ProviderConfig {
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Search target passed to the binary for one query
    pub fn search_target(&self, query: &str) -> String {
        format!("{}{}", self.search_prefix, query)
    }
}
