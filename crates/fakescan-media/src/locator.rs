//! Face locator seam.

use std::sync::Arc;

use fakescan_models::Detection;
use image::RgbImage;

use crate::error::MediaResult;

/// Finds faces in an RGB image.
///
/// Implementations wrapping native sessions serialize access internally, so a
/// locator can be shared between request handlers behind an `Arc`.
pub trait FaceLocator: Send + Sync {
    /// Bounding boxes of all faces found, in detector order.
    fn locate(&self, image: &RgbImage) -> MediaResult<Vec<Detection>>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "locator"
    }
}

impl<T: FaceLocator + ?Sized> FaceLocator for Arc<T> {
    fn locate(&self, image: &RgbImage) -> MediaResult<Vec<Detection>> {
        (**self).locate(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Builds independent locator instances, one per batch worker.
pub type LocatorFactory = Arc<dyn Fn() -> MediaResult<Box<dyn FaceLocator>> + Send + Sync>;
