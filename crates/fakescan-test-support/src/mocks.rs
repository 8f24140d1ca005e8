//! Scripted implementations of the collaborator traits.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use fakescan_media::{
    FaceClassifier, FaceLocator, Frame, FrameAnnotation, FrameSink, FrameSource, LocatorFactory, MediaError,
    MediaResult, ModelProfile, VideoBackend, VideoProperties,
};
use fakescan_models::{Classification, Detection};
use image::{Rgb, RgbImage};

/// One scripted locator answer.
#[derive(Debug, Clone)]
pub enum LocatorStep {
    Faces(Vec<Detection>),
    Fail(String),
}

/// Face locator answering from a script, one step per call.
///
/// Once the script is used up every call returns the fallback detections.
pub struct ScriptedLocator {
    steps: Mutex<VecDeque<LocatorStep>>,
    fallback: Vec<Detection>,
    calls: Mutex<usize>,
}

impl ScriptedLocator {
    #[must_use]
    pub fn new(steps: Vec<LocatorStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback: Vec::new(),
            calls: Mutex::new(0),
        }
    }

    /// Returns the same detections on every call.
    #[must_use]
    pub fn always(detections: Vec<Detection>) -> Self {
        Self {
            fallback: detections,
            ..Self::new(Vec::new())
        }
    }

    /// Never finds a face.
    #[must_use]
    pub fn no_faces() -> Self {
        Self::always(Vec::new())
    }

    #[must_use]
    pub fn with_fallback(mut self, detections: Vec<Detection>) -> Self {
        self.fallback = detections;
        self
    }

    /// Number of `locate` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Factory handing out independent locators that always return `detections`.
    #[must_use]
    pub fn factory(detections: Vec<Detection>) -> LocatorFactory {
        Arc::new(move || -> MediaResult<Box<dyn FaceLocator>> {
            Ok(Box::new(ScriptedLocator::always(detections.clone())))
        })
    }
}

impl FaceLocator for ScriptedLocator {
    fn locate(&self, _image: &RgbImage) -> MediaResult<Vec<Detection>> {
        *self.calls.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        let step = self
            .steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match step {
            Some(LocatorStep::Faces(detections)) => Ok(detections),
            Some(LocatorStep::Fail(message)) => Err(MediaError::detection_failed(message)),
            None => Ok(self.fallback.clone()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Classifier returning scripted scores in call order.
///
/// A `None` entry fails that call. After the script the fallback score is
/// returned.
pub struct ScriptedClassifier {
    scores: Mutex<VecDeque<Option<f64>>>,
    fallback: f64,
    profile: ModelProfile,
    seen: Mutex<Vec<(u32, u32)>>,
}

impl ScriptedClassifier {
    #[must_use]
    pub fn new(scores: Vec<Option<f64>>) -> Self {
        Self {
            scores: Mutex::new(scores.into()),
            fallback: 0.9,
            profile: ModelProfile::baseline_128(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Scores every face with `score`.
    #[must_use]
    pub fn constant(score: f64) -> Self {
        Self {
            fallback: score,
            ..Self::new(Vec::new())
        }
    }

    /// Scores faces from a list, in order.
    #[must_use]
    pub fn sequence(scores: &[f64]) -> Self {
        Self::new(scores.iter().copied().map(Some).collect())
    }

    #[must_use]
    pub fn with_profile(mut self, profile: ModelProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Dimensions of every crop classified so far.
    #[must_use]
    pub fn seen(&self) -> Vec<(u32, u32)> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl FaceClassifier for ScriptedClassifier {
    fn classify(&self, face: &RgbImage) -> MediaResult<Classification> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(face.dimensions());
        let next = self
            .scores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(Some(score)) => Ok(Classification::new(score)),
            Some(None) => Err(MediaError::classification_failed("scripted failure")),
            None => Ok(Classification::new(self.fallback)),
        }
    }

    fn profile(&self) -> &ModelProfile {
        &self.profile
    }
}

/// In-memory frame source of solid gray frames.
pub struct SyntheticFrameSource {
    properties: VideoProperties,
    total: u64,
    next: u64,
    fail_at: Option<u64>,
}

impl SyntheticFrameSource {
    #[must_use]
    pub fn new(total: u64, width: u32, height: u32) -> Self {
        Self {
            properties: VideoProperties {
                width,
                height,
                fps: 25.0,
                frame_count: Some(total),
            },
            total,
            next: 0,
            fail_at: None,
        }
    }

    /// Decoding fails when frame `index` is reached.
    #[must_use]
    pub fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Report `hint` as the container frame count instead of the real total.
    #[must_use]
    pub fn with_frame_count_hint(mut self, hint: Option<u64>) -> Self {
        self.properties.frame_count = hint;
        self
    }
}

impl FrameSource for SyntheticFrameSource {
    fn properties(&self) -> VideoProperties {
        self.properties
    }

    fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        if self.next >= self.total {
            return Ok(None);
        }
        if self.fail_at == Some(self.next) {
            return Err(MediaError::internal(format!("decode error at frame {}", self.next)));
        }
        let image = RgbImage::from_pixel(self.properties.width, self.properties.height, Rgb([128, 128, 128]));
        let frame = Frame::new(self.next, image);
        self.next += 1;
        Ok(Some(frame))
    }
}

/// What a [`RecordingSink`] saw.
#[derive(Debug, Clone, Default)]
pub struct SinkRecord {
    pub frames: Vec<(u64, Option<FrameAnnotation>)>,
    pub finished: bool,
}

impl SinkRecord {
    /// Frames that carried an annotation.
    #[must_use]
    pub fn annotated(&self) -> Vec<&FrameAnnotation> {
        self.frames.iter().filter_map(|(_, a)| a.as_ref()).collect()
    }
}

/// Frame sink recording every write into a shared [`SinkRecord`].
#[derive(Clone, Default)]
pub struct RecordingSink {
    record: Arc<Mutex<SinkRecord>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn record(&self) -> SinkRecord {
        self.record.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl FrameSink for RecordingSink {
    fn write(&mut self, frame: &Frame, annotation: Option<&FrameAnnotation>) -> MediaResult<()> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .frames
            .push((frame.index, annotation.cloned()));
        Ok(())
    }

    fn finish(&mut self) -> MediaResult<()> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner).finished = true;
        Ok(())
    }
}

/// Video backend serving [`SyntheticFrameSource`]s and [`RecordingSink`]s.
///
/// Paths that do not exist on disk are reported unreadable, so tests can
/// exercise the temporary-file handling of callers.
pub struct MockVideoBackend {
    frames: u64,
    width: u32,
    height: u32,
    require_existing: bool,
    opened: Mutex<Vec<PathBuf>>,
    sinks: Mutex<Vec<(PathBuf, RecordingSink)>>,
}

impl MockVideoBackend {
    #[must_use]
    pub fn new(frames: u64, width: u32, height: u32) -> Self {
        Self {
            frames,
            width,
            height,
            require_existing: true,
            opened: Mutex::new(Vec::new()),
            sinks: Mutex::new(Vec::new()),
        }
    }

    /// Open any path, existing or not.
    #[must_use]
    pub fn ignoring_paths(mut self) -> Self {
        self.require_existing = false;
        self
    }

    /// Paths opened so far.
    #[must_use]
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Sinks created so far, by output path.
    #[must_use]
    pub fn sinks(&self) -> Vec<(PathBuf, RecordingSink)> {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl VideoBackend for MockVideoBackend {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>> {
        if self.require_existing && !path.is_file() {
            return Err(MediaError::source_unreadable(path, "file does not exist"));
        }
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_path_buf());
        Ok(Box::new(SyntheticFrameSource::new(self.frames, self.width, self.height)))
    }

    fn create_sink(&self, path: &Path, _properties: &VideoProperties) -> MediaResult<Box<dyn FrameSink>> {
        let sink = RecordingSink::new();
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((path.to_path_buf(), sink.clone()));
        Ok(Box::new(sink))
    }
}
