//! Plain and JSON report printing.

use anyhow::Result;
use fakescan_media::dataset::BatchReport;
use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Summary of a batch run; item errors go to stderr.
pub fn print_batch_report(what: &str, report: &BatchReport) {
    println!(
        "{what}: {} processed, {} saved, {} skipped, {} failed",
        report.processed,
        report.saved,
        report.skipped,
        report.errors.len()
    );
    for error in &report.errors {
        eprintln!("WARN: {}: {}", error.path.display(), error.message);
    }
}
