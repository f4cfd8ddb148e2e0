//! Confidence scoring for search results.
//!
//! `compute_confidence` is pure: live dispatch and the rescore pass must get
//! identical answers for identical inputs.

use crate::models::Confidence;
use crate::normalize::{normalize, QueryParts};

/// Which halves of the query were found in the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchFlags {
    /// Normalized artist appears in the channel or the title
    pub artist: bool,
    /// Normalized song appears in the title
    pub song: bool,
}

impl MatchFlags {
    pub fn confidence(self) -> Confidence {
        match (self.artist, self.song) {
            (true, true) => Confidence::High,
            (true, false) | (false, true) => Confidence::Medium,
            (false, false) => Confidence::Low,
        }
    }
}

/// Compare the query's artist/song halves against a candidate title and
/// channel. Empty halves never match.
pub fn match_flags(query: &str, title: Option<&str>, channel: Option<&str>) -> MatchFlags {
    let parts = QueryParts::parse(query);
    let title_norm = normalize(title.unwrap_or(""));
    let channel_norm = normalize(channel.unwrap_or(""));

    let artist = !parts.artist.is_empty()
        && (channel_norm.contains(&parts.artist) || title_norm.contains(&parts.artist));
    let song = !parts.song.is_empty() && title_norm.contains(&parts.song);

    MatchFlags { artist, song }
}

/// Classify a candidate against its query.
///
/// Returns `None` when there is neither a title nor a channel (empty strings
/// count as absent), otherwise High/Medium/Low by how many of artist and song
/// matched.
pub fn compute_confidence(query: &str, title: Option<&str>, channel: Option<&str>) -> Confidence {
    let title = title.filter(|t| !t.is_empty());
    let channel = channel.filter(|c| !c.is_empty());
    if title.is_none() && channel.is_none() {
        return Confidence::None;
    }

    match_flags(query, title, channel).confidence()
}
