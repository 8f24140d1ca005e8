//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use fakescan_media::{FailurePolicy, ModelPaths, VideoAnalysisOptions, DEFAULT_FRAME_STRIDE};
use tracing::warn;

/// Default classifier model location, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "models/deepfake_detector.onnx";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Classifier model
    pub model_path: PathBuf,
    /// Preset name or JSON path; falls back to the sidecar next to the model
    pub model_profile: Option<String>,
    /// Face detector model; the default search list is used when unset
    pub detector_model_path: Option<PathBuf>,
    pub video_frame_stride: usize,
    pub frame_failure_policy: FailurePolicy,
    /// Where uploaded videos are spooled; system temp dir when unset
    pub upload_dir: Option<PathBuf>,
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(300),
            max_body_size: 256 * 1024 * 1024, // 256MB
            environment: "development".to_string(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            model_profile: None,
            detector_model_path: None,
            video_frame_stride: DEFAULT_FRAME_STRIDE,
            frame_failure_policy: FailurePolicy::FailFast,
            upload_dir: None,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            request_timeout: env_parse("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            model_path: std::env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            model_profile: non_empty_var("MODEL_PROFILE"),
            detector_model_path: non_empty_var("DETECTOR_MODEL_PATH").map(PathBuf::from),
            video_frame_stride: env_parse("VIDEO_FRAME_STRIDE").unwrap_or(defaults.video_frame_stride),
            frame_failure_policy: match std::env::var("FRAME_FAILURE_POLICY") {
                Ok(raw) => raw.parse().unwrap_or_else(|e| {
                    warn!(value = %raw, error = %e, "Ignoring FRAME_FAILURE_POLICY");
                    defaults.frame_failure_policy
                }),
                Err(_) => defaults.frame_failure_policy,
            },
            upload_dir: non_empty_var("UPLOAD_DIR").map(PathBuf::from),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Model locations for building the detection service.
    pub fn model_paths(&self) -> ModelPaths {
        ModelPaths::new(&self.model_path)
            .with_profile(self.model_profile.clone())
            .with_detector(self.detector_model_path.clone())
    }

    pub fn analysis_options(&self) -> VideoAnalysisOptions {
        VideoAnalysisOptions::default()
            .with_stride(self.video_frame_stride)
            .with_failure_policy(self.frame_failure_policy)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_body_size, 256 * 1024 * 1024);
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert!(!config.is_production());
    }

    #[test]
    fn test_analysis_options_follow_config() {
        let config = ApiConfig {
            video_frame_stride: 3,
            frame_failure_policy: FailurePolicy::IsolatePerItem,
            ..ApiConfig::default()
        };
        let options = config.analysis_options();
        assert_eq!(options.stride, 3);
        assert_eq!(options.failure_policy, FailurePolicy::IsolatePerItem);
    }

    #[test]
    fn test_model_paths_carry_overrides() {
        let config = ApiConfig {
            model_profile: Some("baseline_128".into()),
            detector_model_path: Some(PathBuf::from("yunet.onnx")),
            ..ApiConfig::default()
        };
        let paths = config.model_paths();
        assert_eq!(paths.classifier, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(paths.profile.as_deref(), Some("baseline_128"));
        assert_eq!(paths.detector, Some(PathBuf::from("yunet.onnx")));
    }
}
