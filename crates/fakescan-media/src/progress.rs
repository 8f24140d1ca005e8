//! Video analysis progress reporting.

use serde::{Deserialize, Serialize};

/// Snapshot of a running video analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisProgress {
    /// Frames decoded so far
    pub frames_read: u64,
    /// Frames handed to the locator so far
    pub frames_sampled: u64,
    /// Container frame count, when known
    pub total_frames_hint: Option<u64>,
    pub real_votes: u64,
    pub fake_votes: u64,
}

impl AnalysisProgress {
    /// Completion percentage, when the total frame count is known.
    pub fn percentage(&self) -> Option<f64> {
        match self.total_frames_hint {
            Some(total) if total > 0 => {
                Some(((self.frames_read as f64 / total as f64) * 100.0).min(100.0))
            }
            _ => None,
        }
    }
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(AnalysisProgress) + Send + 'static>;
