//! Model-backed collaborators and service construction.
//!
//! Native backends are feature gated: `opencv` provides video I/O and the
//! YuNet locator, `onnx` the ONNX Runtime classifier. Without them the
//! builders fail with [`MediaError::ModelUnavailable`] naming the feature.

#[cfg(feature = "onnx")]
pub mod onnx;
#[cfg(feature = "opencv")]
pub mod opencv;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::classifier::FaceClassifier;
use crate::error::{MediaError, MediaResult};
use crate::locator::{FaceLocator, LocatorFactory};
use crate::profile::ModelProfile;
use crate::service::{DetectionService, VideoBackend};
use crate::video::VideoAnalysisOptions;

/// Where the models live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelPaths {
    /// ONNX binary classifier
    pub classifier: PathBuf,
    /// Preset name or profile JSON path; the sidecar is used when unset
    pub profile: Option<String>,
    /// YuNet model; the search list is used when unset
    pub detector: Option<PathBuf>,
}

impl ModelPaths {
    pub fn new(classifier: impl Into<PathBuf>) -> Self {
        Self {
            classifier: classifier.into(),
            ..Default::default()
        }
    }

    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_detector(mut self, detector: Option<PathBuf>) -> Self {
        self.detector = detector;
        self
    }
}

#[allow(dead_code)]
fn feature_missing(feature: &str, what: &str) -> MediaError {
    MediaError::model_unavailable(format!(
        "{what} requires fakescan-media to be built with the `{feature}` feature"
    ))
}

/// Load the classifier at `model_path` with its resolved profile.
pub fn load_classifier(model_path: &Path, profile: Option<&str>) -> MediaResult<Arc<dyn FaceClassifier>> {
    if !model_path.exists() {
        return Err(MediaError::model_unavailable(format!(
            "Classifier model not found at {}",
            model_path.display()
        )));
    }
    let profile = ModelProfile::resolve(profile, model_path)?;

    #[cfg(feature = "onnx")]
    {
        Ok(Arc::new(self::onnx::OrtFaceClassifier::load(model_path, profile)?))
    }
    #[cfg(not(feature = "onnx"))]
    {
        let _ = profile;
        Err(feature_missing("onnx", "The ONNX face classifier"))
    }
}

/// Load one face locator.
pub fn load_locator(detector: Option<&Path>) -> MediaResult<Arc<dyn FaceLocator>> {
    #[cfg(feature = "opencv")]
    {
        Ok(Arc::new(self::opencv::YuNetLocator::load(detector)?))
    }
    #[cfg(not(feature = "opencv"))]
    {
        let _ = detector;
        Err(feature_missing("opencv", "The YuNet face locator"))
    }
}

/// Factory producing one locator per batch worker.
pub fn locator_factory(detector: Option<PathBuf>) -> LocatorFactory {
    #[cfg(feature = "opencv")]
    {
        self::opencv::YuNetLocator::factory(detector)
    }
    #[cfg(not(feature = "opencv"))]
    {
        let _ = detector;
        Arc::new(|| -> MediaResult<Box<dyn FaceLocator>> {
            Err(feature_missing("opencv", "The YuNet face locator"))
        })
    }
}

/// Video reader/writer backend.
pub fn video_backend() -> MediaResult<Arc<dyn VideoBackend>> {
    #[cfg(feature = "opencv")]
    {
        Ok(Arc::new(self::opencv::OpenCvVideoBackend))
    }
    #[cfg(not(feature = "opencv"))]
    {
        Err(feature_missing("opencv", "Video decoding"))
    }
}

/// Build the detection service from model files.
pub fn build_service(paths: &ModelPaths, options: VideoAnalysisOptions) -> MediaResult<DetectionService> {
    options.validate()?;
    let classifier = load_classifier(&paths.classifier, paths.profile.as_deref())?;
    let locator = load_locator(paths.detector.as_deref())?;
    let video = video_backend()?;

    info!(classifier = %paths.classifier.display(), "Models loaded");
    DetectionService::new(locator, classifier, video, options)
}
