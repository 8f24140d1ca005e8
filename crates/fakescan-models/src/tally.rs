//! REAL/FAKE vote accumulation for video verdicts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::verdict::{verdict_for_fake_fraction, Classification, Verdict};

/// Per-video vote counters.
///
/// Created when sampling starts, incremented once per sampled frame that had
/// a face, read once when the stream ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VoteTally {
    pub real_votes: u64,
    pub fake_votes: u64,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one frame's classification.
    pub fn record(&mut self, classification: &Classification) -> Verdict {
        let verdict = classification.verdict();
        match verdict {
            Verdict::Real => self.real_votes += 1,
            Verdict::Fake => self.fake_votes += 1,
        }
        verdict
    }

    pub fn total(&self) -> u64 {
        self.real_votes + self.fake_votes
    }

    /// `fake_votes / total`, or `None` before any vote.
    pub fn fake_fraction(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some(self.fake_votes as f64 / total as f64)
    }

    /// Reduce the tally to a verdict. `None` when no vote was cast.
    pub fn verdict(&self) -> Option<VideoVerdict> {
        let fake_fraction = self.fake_fraction()?;
        let verdict = verdict_for_fake_fraction(fake_fraction);
        let confidence = match verdict {
            Verdict::Fake => fake_fraction,
            Verdict::Real => 1.0 - fake_fraction,
        };

        Some(VideoVerdict {
            verdict,
            confidence,
            fake_fraction,
            real_votes: self.real_votes,
            fake_votes: self.fake_votes,
        })
    }
}

/// Aggregate verdict for a whole video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoVerdict {
    pub verdict: Verdict,
    /// `fake_fraction` when FAKE, `1 - fake_fraction` when REAL.
    pub confidence: f64,
    pub fake_fraction: f64,
    pub real_votes: u64,
    pub fake_votes: u64,
}

impl VideoVerdict {
    /// Percentage of analyzed faces voted REAL.
    pub fn real_percent(&self) -> f64 {
        (1.0 - self.fake_fraction) * 100.0
    }

    /// Percentage of analyzed faces voted FAKE.
    pub fn fake_percent(&self) -> f64 {
        self.fake_fraction * 100.0
    }
}
