//! Detection service: the explicitly constructed bundle of collaborators that
//! request handlers and CLI commands share.

use std::path::Path;
use std::sync::Arc;

use image::RgbImage;
use tracing::{info, instrument};

use crate::analyzer::{FaceAnalysis, FaceAnalyzer};
use crate::classifier::FaceClassifier;
use crate::error::{MediaError, MediaResult};
use crate::frame::{FrameSink, FrameSource, VideoProperties};
use crate::locator::FaceLocator;
use crate::progress::ProgressCallback;
use crate::video::{analyze_video, VideoAnalysisOptions, VideoReport};

/// Opens videos for reading and creates annotated outputs.
pub trait VideoBackend: Send + Sync {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>>;

    /// Create a writer with the same geometry and frame rate as the source.
    fn create_sink(&self, path: &Path, properties: &VideoProperties) -> MediaResult<Box<dyn FrameSink>>;
}

/// Image and video prediction over injected collaborators.
///
/// Built once at startup and shared read-only.
#[derive(Clone)]
pub struct DetectionService {
    analyzer: FaceAnalyzer,
    video: Arc<dyn VideoBackend>,
    options: VideoAnalysisOptions,
}

impl DetectionService {
    pub fn new(
        locator: Arc<dyn FaceLocator>,
        classifier: Arc<dyn FaceClassifier>,
        video: Arc<dyn VideoBackend>,
        options: VideoAnalysisOptions,
    ) -> MediaResult<Self> {
        options.validate()?;
        info!(
            locator = locator.name(),
            profile = %classifier.profile().name,
            stride = options.stride,
            failure_policy = options.failure_policy.as_str(),
            "Detection service ready"
        );
        Ok(Self {
            analyzer: FaceAnalyzer::new(locator, classifier),
            video,
            options,
        })
    }

    pub fn analyzer(&self) -> &FaceAnalyzer {
        &self.analyzer
    }

    pub fn options(&self) -> &VideoAnalysisOptions {
        &self.options
    }

    /// Copy of this service with a different sampling stride.
    pub fn with_stride(&self, stride: usize) -> MediaResult<Self> {
        let options = self.options.with_stride(stride);
        options.validate()?;
        Ok(Self {
            options,
            ..self.clone()
        })
    }

    pub fn predict_image(&self, image: &RgbImage) -> MediaResult<FaceAnalysis> {
        self.analyzer.analyze_image(image)
    }

    /// Decode an uploaded image and classify its primary face.
    pub fn predict_image_bytes(&self, bytes: &[u8]) -> MediaResult<FaceAnalysis> {
        let image = image::load_from_memory(bytes)?.to_rgb8();
        self.predict_image(&image)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn predict_image_path(&self, path: &Path) -> MediaResult<FaceAnalysis> {
        if !path.is_file() {
            return Err(MediaError::source_unreadable(path, "file does not exist"));
        }
        let image = image::open(path)
            .map_err(|e| MediaError::source_unreadable(path, e.to_string()))?
            .to_rgb8();
        self.predict_image(&image)
    }

    /// Run the voting pipeline over a video file.
    ///
    /// With `annotate_to`, every input frame is written to that path, sampled
    /// frames carrying the face box and label.
    #[instrument(skip(self, progress), fields(path = %path.display(), stride = self.options.stride))]
    pub fn predict_video(
        &self,
        path: &Path,
        annotate_to: Option<&Path>,
        progress: Option<&ProgressCallback>,
    ) -> MediaResult<VideoReport> {
        let mut source = self.video.open(path)?;
        let mut sink = match annotate_to {
            Some(out) => Some(self.video.create_sink(out, &source.properties())?),
            None => None,
        };

        let sink = sink.as_mut().map(|s| s.as_mut() as &mut dyn FrameSink);
        analyze_video(source.as_mut(), &self.analyzer, self.options, sink, progress)
    }
}
