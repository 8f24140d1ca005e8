//! HTTP response schemas shared by the API server and its clients.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tally::VideoVerdict;
use crate::verdict::{format_percent, Classification, Verdict};

/// Response of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PredictionResponse {
    pub verdict: Verdict,
    /// Confidence formatted as a percentage, e.g. `"97.30%"`.
    pub confidence: String,
    /// Raw classifier score ("probability real").
    pub score: f64,
}

impl From<&Classification> for PredictionResponse {
    fn from(classification: &Classification) -> Self {
        Self {
            verdict: classification.verdict(),
            confidence: format_percent(classification.confidence()),
            score: classification.score,
        }
    }
}

/// Response of `POST /predict_video`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoPredictionResponse {
    pub verdict: Verdict,
    /// Confidence formatted as a percentage, e.g. `"71.43%"`.
    pub confidence: String,
    pub real_votes: u64,
    pub fake_votes: u64,
    /// Number of sampled frames the locator ran on.
    pub frames_analyzed: u64,
}

impl VideoPredictionResponse {
    pub fn new(verdict: &VideoVerdict, frames_analyzed: u64) -> Self {
        Self {
            verdict: verdict.verdict,
            confidence: format_percent(verdict.confidence),
            real_votes: verdict.real_votes,
            fake_votes: verdict.fake_votes,
            frames_analyzed,
        }
    }
}

/// Error body returned with 4xx/5xx statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::VoteTally;

    #[test]
    fn test_prediction_response_from_classification() {
        let response = PredictionResponse::from(&Classification::new(0.25));
        assert_eq!(response.verdict, Verdict::Fake);
        assert_eq!(response.confidence, "75.00%");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["verdict"], "FAKE");
        assert_eq!(json["confidence"], "75.00%");
    }

    #[test]
    fn test_video_response_from_verdict() {
        let tally = VoteTally {
            real_votes: 15,
            fake_votes: 6,
        };
        let response = VideoPredictionResponse::new(&tally.verdict().unwrap(), 21);
        assert_eq!(response.verdict, Verdict::Real);
        assert_eq!(response.confidence, "71.43%");
        assert_eq!(response.frames_analyzed, 21);
    }

    #[test]
    fn test_error_response_shape() {
        let json = serde_json::to_string(&ErrorResponse::new("No face detected")).unwrap();
        assert_eq!(json, r#"{"error":"No face detected"}"#);
    }

    #[test]
    fn test_response_schema_lists_fields() {
        let schema = schemars::schema_for!(VideoPredictionResponse);
        let json = serde_json::to_value(&schema).unwrap();
        let properties = json["properties"].as_object().unwrap();
        assert!(properties.contains_key("verdict"));
        assert!(properties.contains_key("frames_analyzed"));
    }
}
