//! Decoded frames and the video reader/writer seams.

use fakescan_models::{BoundingBox, Verdict};
use image::RgbImage;

use crate::error::MediaResult;

/// One decoded video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based position in the stream
    pub index: u64,
    /// RGB pixels
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Stream properties reported when a video is opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProperties {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Container frame count. Only a hint: some containers report 0 or lie.
    pub frame_count: Option<u64>,
}

/// Sequential reader of decoded frames.
pub trait FrameSource {
    fn properties(&self) -> VideoProperties;

    /// Next frame in stream order, `None` at end of stream.
    fn next_frame(&mut self) -> MediaResult<Option<Frame>>;
}

/// Box plus label drawn on an annotated frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnnotation {
    pub bbox: BoundingBox,
    pub label: String,
    pub verdict: Verdict,
}

impl FrameAnnotation {
    pub fn new(bbox: BoundingBox, label: impl Into<String>, verdict: Verdict) -> Self {
        Self {
            bbox,
            label: label.into(),
            verdict,
        }
    }

    /// Overlay color as RGB: green for REAL, red for FAKE.
    pub fn color_rgb(&self) -> [u8; 3] {
        match self.verdict {
            Verdict::Real => [0, 255, 0],
            Verdict::Fake => [255, 0, 0],
        }
    }
}

/// Writer of the annotated output video.
///
/// Receives every frame of the input in order, sampled or not.
pub trait FrameSink {
    fn write(&mut self, frame: &Frame, annotation: Option<&FrameAnnotation>) -> MediaResult<()>;

    /// Flush and close the output.
    fn finish(&mut self) -> MediaResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_colors() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(FrameAnnotation::new(bbox, "REAL 90.0%", Verdict::Real).color_rgb(), [0, 255, 0]);
        assert_eq!(FrameAnnotation::new(bbox, "FAKE 90.0%", Verdict::Fake).color_rgb(), [255, 0, 0]);
    }

    #[test]
    fn test_frame_dimensions() {
        let frame = Frame::new(3, RgbImage::new(64, 48));
        assert_eq!((frame.width(), frame.height()), (64, 48));
        assert_eq!(frame.index, 3);
    }
}
