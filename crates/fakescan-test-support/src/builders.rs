//! Builders for detections, images and services used across test suites.

use std::io::Cursor;
use std::sync::Arc;

use fakescan_media::{DetectionService, FaceClassifier, FaceLocator, VideoAnalysisOptions, VideoBackend};
use fakescan_models::{BoundingBox, Detection};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

/// Detection with confidence 0.9.
#[must_use]
pub fn face(x: f64, y: f64, width: f64, height: f64) -> Detection {
    Detection::new(BoundingBox::new(x, y, width, height), 0.9)
}

/// Uniform RGB image.
#[must_use]
pub fn solid_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([120, 110, 100]))
}

/// PNG-encoded uniform image, as an upload body.
#[must_use]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(solid_image(width, height))
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .expect("encoding an in-memory PNG cannot fail");
    bytes
}

/// Service over the given doubles with default options.
#[must_use]
pub fn mock_service(
    locator: impl FaceLocator + 'static,
    classifier: impl FaceClassifier + 'static,
    video: impl VideoBackend + 'static,
) -> DetectionService {
    mock_service_with(locator, classifier, video, VideoAnalysisOptions::default())
}

/// Service over the given doubles.
#[must_use]
pub fn mock_service_with(
    locator: impl FaceLocator + 'static,
    classifier: impl FaceClassifier + 'static,
    video: impl VideoBackend + 'static,
    options: VideoAnalysisOptions,
) -> DetectionService {
    DetectionService::new(Arc::new(locator), Arc::new(classifier), Arc::new(video), options)
        .expect("valid analysis options")
}
