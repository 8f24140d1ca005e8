//! Frame sampler and vote aggregator.
//!
//! Every `stride`-th frame of a video (frames 0, N, 2N, ...) goes through the
//! face analyzer. Each sampled frame with a face casts one REAL or FAKE vote;
//! the video verdict is derived from the fake-vote fraction once the stream
//! ends. All frames, sampled or not, are forwarded in order to the optional
//! output sink, sampled frames carrying the face box and label.
//!
//! A [`VotingSession`] is the per-video state: it is created in the sampling
//! state, fed frames with [`VotingSession::push_frame`] and consumed by
//! [`VotingSession::finish`], which is the only way to read a verdict.

use std::str::FromStr;

use fakescan_models::{Classification, VideoVerdict, Verdict, VoteTally};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analyzer::FaceAnalyzer;
use crate::error::{MediaError, MediaResult};
use crate::frame::{Frame, FrameAnnotation, FrameSink, FrameSource};
use crate::progress::{AnalysisProgress, ProgressCallback};

/// Default sampling stride (every 5th frame).
pub const DEFAULT_FRAME_STRIDE: usize = 5;

/// What happens when the locator or classifier fails on a single item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The first failure aborts the whole run.
    #[default]
    FailFast,
    /// The failure is logged and the item skipped without a vote.
    IsolatePerItem,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::FailFast => "fail_fast",
            FailurePolicy::IsolatePerItem => "isolate",
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_fast" | "fail-fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "isolate" | "isolate_per_item" | "isolate-per-item" => Ok(FailurePolicy::IsolatePerItem),
            other => Err(MediaError::internal(format!(
                "unknown failure policy '{}' (expected fail_fast or isolate)",
                other
            ))),
        }
    }
}

/// Tuning of a video analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysisOptions {
    /// Analyze frames whose position is a multiple of this value
    pub stride: usize,
    pub failure_policy: FailurePolicy,
    /// Report progress every this many frames read (0 disables)
    pub progress_every: u64,
}

impl Default for VideoAnalysisOptions {
    fn default() -> Self {
        Self {
            stride: DEFAULT_FRAME_STRIDE,
            failure_policy: FailurePolicy::default(),
            progress_every: 25,
        }
    }
}

impl VideoAnalysisOptions {
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn validate(&self) -> MediaResult<()> {
        if self.stride == 0 {
            return Err(MediaError::InvalidStride(self.stride));
        }
        Ok(())
    }
}

/// Outcome of one analyzed video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoReport {
    pub verdict: VideoVerdict,
    pub frames_read: u64,
    /// Frames handed to the locator
    pub frames_sampled: u64,
    /// Sampled frames that produced a vote
    pub frames_with_face: u64,
    /// Sampled frames skipped because of an isolated failure
    pub frames_failed: u64,
    pub total_frames_hint: Option<u64>,
}

/// What the session did with a pushed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Not on the sampling grid; forwarded untouched
    PassedThrough,
    /// Sampled, no face found
    NoFace,
    /// Sampled, the primary face voted
    Voted {
        verdict: Verdict,
        classification: Classification,
    },
    /// Sampled, analysis failed and was isolated
    Failed,
}

/// Per-video voting state.
pub struct VotingSession<'a> {
    analyzer: &'a FaceAnalyzer,
    options: VideoAnalysisOptions,
    sink: Option<&'a mut dyn FrameSink>,
    progress: Option<&'a ProgressCallback>,
    tally: VoteTally,
    frames_read: u64,
    frames_sampled: u64,
    frames_failed: u64,
    total_frames_hint: Option<u64>,
}

impl<'a> VotingSession<'a> {
    /// Start a session. Fails with [`MediaError::InvalidStride`] for stride 0.
    pub fn new(analyzer: &'a FaceAnalyzer, options: VideoAnalysisOptions) -> MediaResult<Self> {
        options.validate()?;
        Ok(Self {
            analyzer,
            options,
            sink: None,
            progress: None,
            tally: VoteTally::new(),
            frames_read: 0,
            frames_sampled: 0,
            frames_failed: 0,
            total_frames_hint: None,
        })
    }

    pub fn with_sink(mut self, sink: &'a mut dyn FrameSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_progress(mut self, progress: &'a ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_total_frames_hint(mut self, hint: Option<u64>) -> Self {
        self.total_frames_hint = hint.filter(|&n| n > 0);
        self
    }

    pub fn tally(&self) -> &VoteTally {
        &self.tally
    }

    pub fn progress(&self) -> AnalysisProgress {
        AnalysisProgress {
            frames_read: self.frames_read,
            frames_sampled: self.frames_sampled,
            total_frames_hint: self.total_frames_hint,
            real_votes: self.tally.real_votes,
            fake_votes: self.tally.fake_votes,
        }
    }

    /// Feed the next frame of the stream.
    ///
    /// Sampling follows the session's own frame counter, so frames must be
    /// pushed in stream order and exactly once.
    pub fn push_frame(&mut self, frame: &Frame) -> MediaResult<FrameOutcome> {
        let position = self.frames_read;
        self.frames_read += 1;

        let sampled = position % self.options.stride as u64 == 0;
        let (outcome, annotation) = if sampled {
            self.frames_sampled += 1;
            self.analyze(frame)?
        } else {
            (FrameOutcome::PassedThrough, None)
        };

        if let Some(sink) = self.sink.as_deref_mut() {
            sink.write(frame, annotation.as_ref())?;
        }

        if let Some(progress) = self.progress {
            let every = self.options.progress_every;
            if every > 0 && self.frames_read % every == 0 {
                progress(self.progress());
            }
        }

        Ok(outcome)
    }

    fn analyze(&mut self, frame: &Frame) -> MediaResult<(FrameOutcome, Option<FrameAnnotation>)> {
        let analysis = match self.analyzer.analyze_primary_face(&frame.image) {
            Ok(analysis) => analysis,
            Err(e) => match self.options.failure_policy {
                FailurePolicy::FailFast => return Err(e),
                FailurePolicy::IsolatePerItem => {
                    warn!(frame = frame.index, error = %e, "Frame analysis failed, skipping");
                    self.frames_failed += 1;
                    return Ok((FrameOutcome::Failed, None));
                }
            },
        };

        let Some(analysis) = analysis else {
            debug!(frame = frame.index, "No face on sampled frame");
            return Ok((FrameOutcome::NoFace, None));
        };

        let classification = analysis.classification;
        let verdict = self.tally.record(&classification);
        debug!(
            frame = frame.index,
            score = classification.score,
            verdict = %verdict,
            "Frame voted"
        );

        let annotation = FrameAnnotation::new(analysis.detection.bbox, classification.label(), verdict);
        Ok((
            FrameOutcome::Voted {
                verdict,
                classification,
            },
            Some(annotation),
        ))
    }

    /// End of stream: close the sink and reduce the tally.
    ///
    /// Fails with [`MediaError::NoFaceDetected`] when no sampled frame voted.
    pub fn finish(mut self) -> MediaResult<VideoReport> {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.finish()?;
        }
        if let Some(progress) = self.progress {
            progress(self.progress());
        }

        let verdict = self.tally.verdict().ok_or(MediaError::NoFaceDetected)?;
        let report = VideoReport {
            verdict,
            frames_read: self.frames_read,
            frames_sampled: self.frames_sampled,
            frames_with_face: self.tally.total(),
            frames_failed: self.frames_failed,
            total_frames_hint: self.total_frames_hint,
        };

        info!(
            verdict = %report.verdict.verdict,
            confidence = report.verdict.confidence,
            real_votes = report.verdict.real_votes,
            fake_votes = report.verdict.fake_votes,
            frames_read = report.frames_read,
            frames_sampled = report.frames_sampled,
            frames_failed = report.frames_failed,
            "Video analyzed"
        );
        Ok(report)
    }
}

/// Run a whole video through a [`VotingSession`].
pub fn analyze_video(
    source: &mut dyn FrameSource,
    analyzer: &FaceAnalyzer,
    options: VideoAnalysisOptions,
    sink: Option<&mut dyn FrameSink>,
    progress: Option<&ProgressCallback>,
) -> MediaResult<VideoReport> {
    let properties = source.properties();
    debug!(
        width = properties.width,
        height = properties.height,
        fps = properties.fps,
        frame_count = ?properties.frame_count,
        stride = options.stride,
        "Starting video analysis"
    );

    let mut session = VotingSession::new(analyzer, options)?.with_total_frames_hint(properties.frame_count);
    if let Some(sink) = sink {
        session = session.with_sink(sink);
    }
    if let Some(progress) = progress {
        session = session.with_progress(progress);
    }

    while let Some(frame) = source.next_frame()? {
        session.push_frame(&frame)?;
    }

    session.finish()
}

/// Number of frames the sampler analyzes in a `total`-frame video.
pub fn expected_samples(total: u64, stride: usize) -> u64 {
    if stride == 0 {
        return 0;
    }
    total.div_ceil(stride as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_samples() {
        assert_eq!(expected_samples(101, 5), 21);
        assert_eq!(expected_samples(100, 5), 20);
        assert_eq!(expected_samples(1, 5), 1);
        assert_eq!(expected_samples(0, 5), 0);
        assert_eq!(expected_samples(7, 1), 7);
    }

    #[test]
    fn test_zero_stride_rejected() {
        let err = VideoAnalysisOptions::default().with_stride(0).validate().unwrap_err();
        assert!(matches!(err, MediaError::InvalidStride(0)));
    }

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!("fail_fast".parse::<FailurePolicy>().unwrap(), FailurePolicy::FailFast);
        assert_eq!("ISOLATE".parse::<FailurePolicy>().unwrap(), FailurePolicy::IsolatePerItem);
        assert!("retry".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn test_default_options() {
        let options = VideoAnalysisOptions::default();
        assert_eq!(options.stride, 5);
        assert_eq!(options.failure_policy, FailurePolicy::FailFast);
    }
}
