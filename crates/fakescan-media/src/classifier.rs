//! Binary REAL/FAKE face classifier seam.

use std::sync::Arc;

use fakescan_models::Classification;
use image::RgbImage;

use crate::error::MediaResult;
use crate::profile::ModelProfile;

/// Scores a face crop with the probability that it is real.
///
/// The classifier resizes and normalizes the crop itself, according to its
/// pinned [`ModelProfile`]; callers pass the raw crop.
pub trait FaceClassifier: Send + Sync {
    fn classify(&self, face: &RgbImage) -> MediaResult<Classification>;

    /// Input contract this classifier was built with.
    fn profile(&self) -> &ModelProfile;
}

impl<T: FaceClassifier + ?Sized> FaceClassifier for Arc<T> {
    fn classify(&self, face: &RgbImage) -> MediaResult<Classification> {
        (**self).classify(face)
    }

    fn profile(&self) -> &ModelProfile {
        (**self).profile()
    }
}
