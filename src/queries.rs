//! Query file loading.
//!
//! One query per line; the 0-based line number is the query's index and the
//! primary key of its result record.

use anyhow::{Context, Result};
use std::path::Path;

/// Read the query file. A missing or unreadable file is a setup error.
pub fn load_queries(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read query file {}", path.display()))?;
    Ok(parse_queries(&text))
}

/// Split file contents into queries.
///
/// Blank lines inside the file keep their position so indices stay aligned
/// with line numbers; blank lines at the end of the file are dropped.
pub fn parse_queries(text: &str) -> Vec<String> {
    let mut queries: Vec<String> = text
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect();
    while queries.last().is_some_and(|q| q.trim().is_empty()) {
        queries.pop();
    }
    queries
}

/// Queries in `[start, end)` paired with their index. `end` is clamped to the
/// list length; an empty or inverted range yields nothing.
pub fn select_range(queries: &[String], start: usize, end: Option<usize>) -> Vec<(usize, String)> {
    let end = end.unwrap_or(queries.len()).min(queries.len());
    if start >= end {
        return Vec::new();
    }
    queries[start..end]
        .iter()
        .enumerate()
        .map(|(offset, q)| (start + offset, q.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_inner_blank_lines() {
        let queries = parse_queries("A - One\n\nC - Three\n\n\n");
        assert_eq!(queries, vec!["A - One", "", "C - Three"]);
    }

    #[test]
    fn test_parse_strips_carriage_returns() {
        let queries = parse_queries("A - One\r\nB - Two\r\n");
        assert_eq!(queries, vec!["A - One", "B - Two"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_queries("").is_empty());
        assert!(parse_queries("\n\n").is_empty());
    }

    #[test]
    fn test_select_range() {
        let queries: Vec<String> = (0..5).map(|i| format!("q{}", i)).collect();
        let selected = select_range(&queries, 1, Some(3));
        assert_eq!(selected, vec![(1, "q1".to_string()), (2, "q2".to_string())]);

        assert_eq!(select_range(&queries, 3, None).len(), 2);
        assert_eq!(select_range(&queries, 0, Some(100)).len(), 5);
        assert!(select_range(&queries, 4, Some(2)).is_empty());
        assert!(select_range(&queries, 10, None).is_empty());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = load_queries(Path::new("/nonexistent/queries.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read query file"));
    }
}
