//! Face deepfake screening: frame sampling, per-face classification, vote
//! aggregation and dataset preparation.
//!
//! The face locator, the classifier and video I/O are traits
//! ([`FaceLocator`], [`FaceClassifier`], [`VideoBackend`]); native
//! implementations live in [`backends`] behind the `opencv` and `onnx`
//! features.

pub mod analyzer;
pub mod backends;
pub mod classifier;
pub mod crop;
pub mod dataset;
pub mod error;
pub mod frame;
pub mod fs_utils;
pub mod locator;
pub mod profile;
pub mod progress;
pub mod service;
pub mod video;

pub use analyzer::{FaceAnalysis, FaceAnalyzer};
pub use backends::{build_service, load_classifier, load_locator, locator_factory, video_backend, ModelPaths};
pub use classifier::FaceClassifier;
pub use crop::{crop_face, is_large_enough, MIN_SAVED_FACE_SIDE};
pub use error::{MediaError, MediaResult};
pub use frame::{Frame, FrameAnnotation, FrameSink, FrameSource, VideoProperties};
pub use locator::{FaceLocator, LocatorFactory};
pub use profile::{InputTensor, ModelProfile, Normalization, TensorLayout};
pub use progress::{AnalysisProgress, ProgressCallback};
pub use service::{DetectionService, VideoBackend};
pub use video::{
    analyze_video, expected_samples, FailurePolicy, FrameOutcome, VideoAnalysisOptions, VideoReport,
    VotingSession, DEFAULT_FRAME_STRIDE,
};
