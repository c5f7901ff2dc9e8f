//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Progress (one line per finished item, in completion order)
//!
//! ```text
//! Resizing 3 photos → out/
//! 001/003 beach.jpg → beach_resized.jpg (1080x1080)
//! 003/003 notes.txt FAILED unsupported format: notes.txt: ...
//! 002/003 dusk.jpg skipped, dusk_resized.jpg exists
//! ```
//!
//! ## Report (after the batch, in input order)
//!
//! ```text
//! 2 written, 1 failed, 0 skipped
//! Failures:
//!     notes.txt: unsupported format: notes.txt: ...
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function returns `Vec<String>` for testability and has a
//! `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::batch::{BatchEvent, BatchReport, JobOutcome, JobResult};
use std::path::Path;

/// Format a 1-based position as `NNN/TTT`, zero-padded to the total's width
/// (minimum 3 digits).
fn format_position(index: usize, total: usize) -> String {
    let width = total.to_string().len().max(3);
    format!("{index:0>width$}/{total:0>width$}")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn result_line(result: &JobResult) -> String {
    let input = file_name(&result.input);
    match &result.outcome {
        JobOutcome::Success { output, dimensions } => {
            format!("{input} → {} ({dimensions})", file_name(output))
        }
        JobOutcome::Failure { message, .. } => format!("{input} FAILED {message}"),
        JobOutcome::Skipped { output } => {
            format!("{input} skipped, {} exists", file_name(output))
        }
        JobOutcome::NotAttempted => format!("{input} not attempted (cancelled)"),
    }
}

pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total, output_dir } => {
            let noun = if *total == 1 { "photo" } else { "photos" };
            vec![format!(
                "Resizing {total} {noun} → {}",
                output_dir.display()
            )]
        }
        BatchEvent::ItemFinished {
            index,
            total,
            result,
        } => vec![format!(
            "{} {}",
            format_position(*index, *total),
            result_line(result)
        )],
    }
}

pub fn print_batch_event(event: &BatchEvent) {
    for line in format_batch_event(event) {
        println!("{}", line);
    }
}

pub fn format_report(report: &BatchReport) -> Vec<String> {
    let mut lines = vec![report.summary.to_string()];
    let failures: Vec<&JobResult> = report.failures().collect();
    if !failures.is_empty() {
        lines.push("Failures:".to_string());
        for r in failures {
            if let JobOutcome::Failure { message, .. } = &r.outcome {
                lines.push(format!("    {}: {}", r.input.display(), message));
            }
        }
    }
    lines
}

pub fn print_report(report: &BatchReport) {
    for line in format_report(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::types::ErrorKind;
    use std::path::PathBuf;

    fn success(input: &str, output: &str) -> JobResult {
        JobResult {
            input: PathBuf::from(input),
            outcome: JobOutcome::Success {
                output: PathBuf::from(output),
                dimensions: Dimensions {
                    width: 1080,
                    height: 1350,
                },
            },
        }
    }

    fn failure(input: &str, message: &str) -> JobResult {
        JobResult {
            input: PathBuf::from(input),
            outcome: JobOutcome::Failure {
                kind: ErrorKind::DecodeError,
                message: message.to_string(),
            },
        }
    }

    #[test]
    fn position_is_zero_padded() {
        assert_eq!(format_position(1, 3), "001/003");
        assert_eq!(format_position(42, 1200), "0042/1200");
    }

    #[test]
    fn started_event_pluralizes() {
        let one = BatchEvent::Started {
            total: 1,
            output_dir: PathBuf::from("out"),
        };
        assert_eq!(format_batch_event(&one), vec!["Resizing 1 photo → out"]);
        let many = BatchEvent::Started {
            total: 5,
            output_dir: PathBuf::from("out"),
        };
        assert_eq!(format_batch_event(&many), vec!["Resizing 5 photos → out"]);
    }

    #[test]
    fn success_line_shows_output_and_size() {
        let event = BatchEvent::ItemFinished {
            index: 2,
            total: 10,
            result: success("/photos/beach.jpg", "/out/beach_resized.jpg"),
        };
        assert_eq!(
            format_batch_event(&event),
            vec!["002/010 beach.jpg → beach_resized.jpg (1080x1350)"]
        );
    }

    #[test]
    fn other_outcomes_have_lines() {
        assert_eq!(
            result_line(&failure("/p/x.jpg", "cannot decode")),
            "x.jpg FAILED cannot decode"
        );
        let skipped = JobResult {
            input: PathBuf::from("/p/y.jpg"),
            outcome: JobOutcome::Skipped {
                output: PathBuf::from("/out/y_resized.jpg"),
            },
        };
        assert_eq!(result_line(&skipped), "y.jpg skipped, y_resized.jpg exists");
        let cancelled = JobResult {
            input: PathBuf::from("/p/z.jpg"),
            outcome: JobOutcome::NotAttempted,
        };
        assert_eq!(result_line(&cancelled), "z.jpg not attempted (cancelled)");
    }

    #[test]
    fn report_lists_failures_with_full_paths() {
        let report = BatchReport::new(vec![
            success("/p/a.jpg", "/out/a_resized.jpg"),
            failure("/p/b.jpg", "cannot decode"),
        ]);
        assert_eq!(
            format_report(&report),
            vec![
                "1 written, 1 failed, 0 skipped",
                "Failures:",
                "    /p/b.jpg: cannot decode",
            ]
        );
    }

    #[test]
    fn clean_report_is_one_line() {
        let report = BatchReport::new(vec![success("/p/a.jpg", "/out/a_resized.jpg")]);
        assert_eq!(format_report(&report), vec!["1 written, 0 failed, 0 skipped"]);
    }
}
