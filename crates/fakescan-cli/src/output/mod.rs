//! Output formatting for CLI.

mod progress;
mod report;

pub use progress::ProgressBar;
pub use report::{print_batch_report, print_json};
