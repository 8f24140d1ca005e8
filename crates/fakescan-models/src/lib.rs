//! Shared data models for FakeScan.
//!
//! This crate provides Serde-serializable types for:
//! - Face detections and primary-face selection
//! - Per-face classifications and verdicts
//! - The REAL/FAKE vote tally used for video verdicts
//! - HTTP request/response schemas

pub mod api;
pub mod detection;
pub mod tally;
pub mod verdict;

// Re-export common types
pub use api::{ErrorResponse, PredictionResponse, VideoPredictionResponse};
pub use detection::{select_primary_face, BoundingBox, Detection};
pub use tally::{VideoVerdict, VoteTally};
pub use verdict::{
    format_percent, verdict_for_fake_fraction, Classification, Verdict, REAL_SCORE_THRESHOLD,
    VIDEO_FAKE_FRACTION_THRESHOLD,
};
