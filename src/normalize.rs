//! Shared normalization for query/result matching.
//! Used by live dispatch and by the offline rescore pass.
//!
//! CRITICAL: Any change here changes stored confidence on the next rescore.
//! Run tests after changes.

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Punctuation removed before comparison: - : _ . ' " ( ) [ ] ! ?
pub static STRIP_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[-:_.'"()\[\]!?]"#).unwrap());

/// Regex to collapse runs of whitespace into a single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Separator between artist and song in a query line
pub const QUERY_SEPARATOR: &str = " - ";

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Lowercase, strip punctuation, collapse whitespace, trim.
///
/// Examples: "Next To You (Official Video)" → "next to you official video"
///           "AC/DC - T.N.T." → "ac/dc tnt"
pub fn normalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let stripped = STRIP_PUNCTUATION.replace_all(&lower, "");
    MULTI_SPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Split a raw query on the first " - " into (artist, song).
/// Without a separator the whole query is the artist and the song is empty.
pub fn split_query(query: &str) -> (&str, &str) {
    query.split_once(QUERY_SEPARATOR).unwrap_or((query, ""))
}

/// Normalized artist and song parts of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParts {
    pub artist: String,
    pub song: String,
}

impl QueryParts {
    pub fn parse(query: &str) -> Self {
        let (artist, song) = split_query(query);
        Self {
            artist: normalize(artist),
            song: normalize(song),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("Dirty Loops"), "dirty loops");
        assert_eq!(
            normalize("Dirty Loops - Next To You (Official Video)"),
            "dirty loops next to you official video"
        );
    }

    #[test]
    fn test_normalize_punctuation_set() {
        assert_eq!(normalize(r#"Don't Stop! [Live]: "Take_2"?"#), "dont stop live take2");
        // Characters outside the set survive
        assert_eq!(normalize("AC/DC & Friends"), "ac/dc & friends");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize("  a \t b\n\nc  "), "a b c");
        assert_eq!(normalize(" - "), "");
    }

    #[test]
    fn test_split_query_first_separator() {
        assert_eq!(split_query("A - B - C"), ("A", "B - C"));
        assert_eq!(split_query("No Separator"), ("No Separator", ""));
        // Hyphen without surrounding spaces is not a separator
        assert_eq!(split_query("Jay-Z"), ("Jay-Z", ""));
    }

    #[test]
    fn test_query_parts() {
        let parts = QueryParts::parse("Dirty Loops - Next to You");
        assert_eq!(parts.artist, "dirty loops");
        assert_eq!(parts.song, "next to you");

        let parts = QueryParts::parse("Somebody");
        assert_eq!(parts.artist, "somebody");
        assert_eq!(parts.song, "");
    }
}
