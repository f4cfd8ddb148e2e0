//! External video search.
//!
//! `SearchProvider` is the seam the dispatcher talks to; `YtDlpProvider`
//! runs one yt-dlp process per query and parses its flat-playlist JSON.

use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::models::SearchHit;

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Best single match for a free-text query.
    async fn search(&self, query: &str) -> Result<SearchHit, ProviderError>;
}

/// Fields read from one line of `yt-dlp -j --flat-playlist` output.
#[derive(Debug, Deserialize)]
struct YtDlpEntry {
    id: Option<String>,
    title: Option<String>,
    channel: Option<String>,
    uploader: Option<String>,
    view_count: Option<u64>,
}

impl From<YtDlpEntry> for SearchHit {
    fn from(entry: YtDlpEntry) -> Self {
        SearchHit {
            video_id: entry.id,
            title: entry.title,
            channel: entry.channel.or(entry.uploader),
            view_count: entry.view_count,
        }
    }
}

/// Parse yt-dlp stdout: the first non-empty line is the best match.
pub fn parse_output(stdout: &str) -> Result<SearchHit, ProviderError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or(ProviderError::NoResult)?;
    let entry: YtDlpEntry =
        serde_json::from_str(line).map_err(|e| ProviderError::Parse(e.to_string()))?;
    Ok(entry.into())
}

pub struct YtDlpProvider {
    config: ProviderConfig,
}

impl YtDlpProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl SearchProvider for YtDlpProvider {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn search(&self, query: &str) -> Result<SearchHit, ProviderError> {
        let mut cmd = Command::new(&self.config.binary);
        cmd.arg("--flat-playlist")
            .arg("-j")
            .arg(self.config.search_target(query))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Execute with timeout; dropping the future kills the child
        let output = match tokio::time::timeout(self.config.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| ProviderError::Spawn {
                binary: self.config.binary.clone(),
                source,
            })?,
            Err(_) => return Err(ProviderError::Timeout(self.config.timeout)),
        };

        if !output.status.success() {
            return Err(ProviderError::Exit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_output(&String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_output_full_entry() {
        let stdout = r#"{"id": "rV9uCmlMQ1c", "title": "Dirty Loops - Next To You", "channel": "Dirty Loops", "view_count": 1234567, "duration": 215.0}"#;
        let hit = parse_output(stdout).unwrap();
        assert_eq!(hit.video_id.as_deref(), Some("rV9uCmlMQ1c"));
        assert_eq!(hit.title.as_deref(), Some("Dirty Loops - Next To You"));
        assert_eq!(hit.channel.as_deref(), Some("Dirty Loops"));
        assert_eq!(hit.view_count, Some(1234567));
    }

    #[test]
    fn test_parse_output_uploader_fallback() {
        let hit = parse_output(r#"{"id": "x", "title": "T", "uploader": "Someone"}"#).unwrap();
        assert_eq!(hit.channel.as_deref(), Some("Someone"));
    }

    #[test]
    fn test_parse_output_nulls() {
        let hit = parse_output(r#"{"id": "x", "title": null, "channel": null, "view_count": null}"#).unwrap();
        assert_eq!(hit.video_id.as_deref(), Some("x"));
        assert!(hit.title.is_none());
        assert!(hit.view_count.is_none());
    }

    #[test]
    fn test_parse_output_skips_leading_blank_lines() {
        let hit = parse_output("\n\n{\"id\": \"abc\"}\n").unwrap();
        assert_eq!(hit.video_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_parse_output_errors() {
        assert!(matches!(parse_output(""), Err(ProviderError::NoResult)));
        assert!(matches!(parse_output("WARNING: nope"), Err(ProviderError::Parse(_))));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let provider = YtDlpProvider::new(
            ProviderConfig::default()
                .with_binary("/nonexistent/yt-dlp-binary")
                .with_timeout(Duration::from_secs(5)),
        );
        let err = provider.search("Artist - Song").await.unwrap_err();
        assert!(matches!(err, ProviderError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_exit_error() {
        // `false` ignores its arguments and exits 1
        let provider = YtDlpProvider::new(ProviderConfig::default().with_binary("false"));
        let err = provider.search("Artist - Song").await.unwrap_err();
        assert!(matches!(err, ProviderError::Exit { code: Some(1), .. }));
    }
}
