//! Human-readable summaries printed at the end of each run.

use std::path::Path;
use std::time::Duration;

use crate::dispatch::DispatchSummary;
use crate::models::{Confidence, ConfidenceTally, ResultRecord};
use crate::progress::format_duration;
use crate::rescore::RescoreOutcome;

/// Low-confidence entries listed before eliding the rest
const LOW_PREVIEW: usize = 10;

/// First `max` characters of `s` (not bytes)
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn print_tally(tally: &ConfidenceTally) {
    for tier in Confidence::ALL {
        let label = format!("{}:", capitalize(tier.as_str()));
        println!("  {:<8}{}", label, tally.count(tier));
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Tally, then the records that need a human look: low-confidence matches
/// (first few, with their candidate title) and every record with no match.
pub fn print_dispatch_summary(summary: &DispatchSummary, store_path: &Path, elapsed: Duration) {
    println!("\n{:=<60}", "");
    println!(
        "Done: {} processed, {} skipped, {} in range ({})",
        summary.processed(),
        summary.skipped,
        summary.requested,
        format_duration(elapsed)
    );
    print_tally(&summary.tally);
    println!("  Errors: {}", summary.tally.errors);
    if summary.append_failures > 0 {
        println!("  Not written: {}", summary.append_failures);
    }

    print_review_lists(&summary.records);

    println!("\nResults written to {}", store_path.display());
    println!("{:=<60}", "");
}

fn print_review_lists(records: &[ResultRecord]) {
    let low: Vec<&ResultRecord> = records
        .iter()
        .filter(|r| r.confidence == Confidence::Low)
        .collect();
    if !low.is_empty() {
        println!("\nLow confidence ({}):", low.len());
        for r in low.iter().take(LOW_PREVIEW) {
            println!("  [{}] {}", r.index, truncate_chars(&r.query, 40));
            println!(
                "       -> {}",
                r.title.as_deref().map_or("N/A".to_string(), |t| truncate_chars(t, 50))
            );
        }
        if low.len() > LOW_PREVIEW {
            println!("  ... and {} more", low.len() - LOW_PREVIEW);
        }
    }

    let none: Vec<&ResultRecord> = records
        .iter()
        .filter(|r| r.confidence == Confidence::None)
        .collect();
    if !none.is_empty() {
        println!("\nNo match ({}):", none.len());
        for r in none {
            match &r.error {
                Some(err) => println!("  [{}] {} ({})", r.index, r.query, truncate_chars(err, 60)),
                None => println!("  [{}] {}", r.index, r.query),
            }
        }
    }
}

pub fn print_rescore_summary(outcome: &RescoreOutcome, output: &Path, show_changes: bool) {
    println!("Re-scored {} results -> {}", outcome.records.len(), output.display());
    print_tally(&outcome.tally);
    if outcome.malformed > 0 {
        println!("  Skipped {} malformed lines", outcome.malformed);
    }
    if outcome.duplicates > 0 {
        println!("  Collapsed {} duplicate indices (last write kept)", outcome.duplicates);
    }

    if outcome.changes.is_empty() {
        return;
    }
    println!("\n{} confidence changes", outcome.changes.len());
    if show_changes {
        for change in &outcome.changes {
            let arrow = if change.is_upgrade() { "↑" } else { "↓" };
            println!(
                "  [{}] {} -> {} {} {}",
                change.index,
                change.old,
                change.new,
                arrow,
                truncate_chars(&change.query, 50)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("Motörhead - Ace of Spades", 5), "Motör");
        assert_eq!(truncate_chars("short", 50), "short");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("medium"), "Medium");
        assert_eq!(capitalize(""), "");
    }
}
