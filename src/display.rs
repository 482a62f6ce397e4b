//! Colored report output for the administrative commands.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::cleanup::CleanupReport;
use crate::directory::ImportStats;
use crate::sync::SyncResult;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Most error lines printed before summarizing the rest.
const MAX_LISTED_ERRORS: usize = 10;

/// Truncate a string to at most `max_len` characters, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

/// Lines describing per-record errors, capped at [`MAX_LISTED_ERRORS`].
#[must_use]
pub fn error_lines(errors: &[String]) -> Vec<String> {
    let mut lines: Vec<String> = errors
        .iter()
        .take(MAX_LISTED_ERRORS)
        .map(|e| truncate(e, 160))
        .collect();
    if errors.len() > MAX_LISTED_ERRORS {
        lines.push(format!("... and {} more", errors.len() - MAX_LISTED_ERRORS));
    }
    lines
}

fn print_errors(errors: &[String]) {
    for line in error_lines(errors) {
        println!("  {} {}", "-".red(), line);
    }
}

/// Print the outcome of importing one file.
pub fn print_import_stats(label: &str, stats: &ImportStats) {
    println!(
        "{} {} {} processed={} added={} updated={} credits={} awards={}",
        timestamp().dimmed(),
        "[IMPORT]".blue().bold(),
        label.cyan(),
        stats.editors_processed,
        stats.editors_added.green(),
        stats.editors_updated.yellow(),
        stats.credits_added,
        stats.awards_added
    );
    if !stats.errors.is_empty() {
        println!(
            "{} {} skipped",
            "[WARN]".yellow().bold(),
            stats.errors.len()
        );
        print_errors(&stats.errors);
    }
    let _ = io::stdout().flush();
}

/// Print the aggregated result of a sync run.
pub fn print_sync_result(source: &str, result: &SyncResult) {
    println!(
        "{} {} {} processed={} added={} updated={} credits={} awards={}",
        timestamp().dimmed(),
        "[SYNC]".magenta().bold(),
        source.cyan(),
        result.editors_processed,
        result.editors_added.green(),
        result.editors_updated.yellow(),
        result.credits_added,
        result.awards_added
    );
    if !result.errors.is_empty() {
        println!(
            "{} {} source error(s)",
            "[WARN]".yellow().bold(),
            result.errors.len()
        );
        print_errors(&result.errors);
    }
    let _ = io::stdout().flush();
}

/// Print a cleanup report with every candidate and its reason.
pub fn print_cleanup_report(report: &CleanupReport) {
    for candidate in &report.candidates {
        let name = candidate.name.as_deref().unwrap_or("<unnamed>");
        println!(
            "{} {} ({}) - {}",
            if report.dry_run {
                "[MATCH]".yellow().bold().to_string()
            } else {
                "[DELETE]".red().bold().to_string()
            },
            truncate(name, 40),
            candidate.id.dimmed(),
            candidate.reason.description().dimmed()
        );
    }

    let ts = timestamp();
    if report.dry_run {
        println!(
            "{} {} Dry run: {} of {} editors would be deleted",
            ts.dimmed(),
            "[CLEANUP]".blue().bold(),
            report.candidates.len().yellow(),
            report.scanned
        );
    } else {
        println!(
            "{} {} Deleted {} of {} editors and {} credit/award records in {} batch(es)",
            ts.dimmed(),
            "[CLEANUP]".blue().bold(),
            report.deleted.red(),
            report.scanned,
            report.subrecords_deleted,
            report.batches_committed
        );
    }
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stderr().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_very_short_max() {
        assert_eq!(truncate("hello", 3), "...");
        assert_eq!(truncate("hello", 0), "...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("Almodóvar Pérez", 9), "Almodó...");
    }

    #[test]
    fn test_error_lines_capped() {
        let errors: Vec<String> = (0..13).map(|i| format!("entry {i}: bad")).collect();
        let lines = error_lines(&errors);

        assert_eq!(lines.len(), MAX_LISTED_ERRORS + 1);
        assert_eq!(lines[0], "entry 0: bad");
        assert_eq!(lines.last().unwrap(), "... and 3 more");
    }

    #[test]
    fn test_error_lines_short_list() {
        let errors = vec!["tmdb: not configured".to_string()];
        assert_eq!(error_lines(&errors), errors);
    }
}
