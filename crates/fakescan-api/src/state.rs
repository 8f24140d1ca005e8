//! Application state.

use std::sync::Arc;

use fakescan_media::{build_service, DetectionService, MediaResult};
use tracing::info;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub service: Arc<DetectionService>,
}

impl AppState {
    /// Load the models named by the config and build the detection service.
    pub fn new(config: ApiConfig) -> MediaResult<Self> {
        let paths = config.model_paths();
        info!(
            model = %paths.classifier.display(),
            profile = paths.profile.as_deref().unwrap_or("<sidecar>"),
            "Loading models"
        );
        let service = build_service(&paths, config.analysis_options())?;
        Ok(Self::with_service(config, service))
    }

    /// State over an already built service.
    pub fn with_service(config: ApiConfig, service: DetectionService) -> Self {
        Self {
            config,
            service: Arc::new(service),
        }
    }
}
