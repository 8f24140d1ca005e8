//! Per-face classification and REAL/FAKE verdicts.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A face is REAL when the classifier score is strictly above this value.
pub const REAL_SCORE_THRESHOLD: f64 = 0.5;

/// A video is FAKE when its fake-vote fraction is strictly above this value.
///
/// Independent of [`REAL_SCORE_THRESHOLD`]; the two values must not be unified.
pub const VIDEO_FAKE_FRACTION_THRESHOLD: f64 = 0.4;

/// Final label for an image, a face, or a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Real,
    Fake,
}

impl Verdict {
    /// Verdict for a single classifier score ("probability real").
    pub fn from_score(score: f64) -> Self {
        if score > REAL_SCORE_THRESHOLD {
            Verdict::Real
        } else {
            Verdict::Fake
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Real => "REAL",
            Verdict::Fake => "FAKE",
        }
    }

    pub fn is_fake(&self) -> bool {
        matches!(self, Verdict::Fake)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Video-level verdict for a given fake-vote fraction (strict `>`).
pub fn verdict_for_fake_fraction(fake_fraction: f64) -> Verdict {
    if fake_fraction > VIDEO_FAKE_FRACTION_THRESHOLD {
        Verdict::Fake
    } else {
        Verdict::Real
    }
}

/// Format a 0..=1 ratio the way responses report confidence ("71.43%").
pub fn format_percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

/// Output of the binary classifier for one face crop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Classification {
    /// Probability that the face is real, in [0, 1].
    pub score: f64,
}

impl Classification {
    /// Create a classification, clamping the score into [0, 1].
    ///
    /// Non-finite scores become 0.0.
    pub fn new(score: f64) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self { score }
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_score(self.score)
    }

    /// `score` when REAL, `1 - score` when FAKE.
    pub fn confidence(&self) -> f64 {
        match self.verdict() {
            Verdict::Real => self.score,
            Verdict::Fake => 1.0 - self.score,
        }
    }

    /// Overlay label, e.g. `"REAL 97.3%"`.
    pub fn label(&self) -> String {
        format!("{} {:.1}%", self.verdict(), self.confidence() * 100.0)
    }
}
