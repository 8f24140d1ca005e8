//! Face crop batch over an image folder.

use std::fs;
use std::path::Path;

use fakescan_models::select_primary_face;
use image::RgbImage;
use tracing::{debug, info, warn};

use super::batch::{run_batch, warn_on_collision, BatchOptions, BatchReport, ItemCallback, ItemOutcome};
use super::scan::{scan_media, MediaKind};
use crate::crop::{crop_face, is_large_enough};
use crate::error::{MediaError, MediaResult};
use crate::locator::{FaceLocator, LocatorFactory};

/// Largest face of `image` if both its sides exceed the saving minimum.
pub fn primary_face_crop(locator: &dyn FaceLocator, image: &RgbImage) -> MediaResult<Option<RgbImage>> {
    let detections = locator.locate(image)?;
    let Some(primary) = select_primary_face(&detections) else {
        return Ok(None);
    };
    if !is_large_enough(&primary.bbox) {
        debug!(width = primary.bbox.width, height = primary.bbox.height, "Face too small");
        return Ok(None);
    }
    Ok(crop_face(image, &primary.bbox))
}

/// Crop the primary face of every image directly inside `input_dir` into
/// `output_dir`, keeping the input file name.
///
/// Images that cannot be decoded or hold no large enough face are skipped.
pub fn crop_faces_in_dir(
    input_dir: &Path,
    output_dir: &Path,
    factory: &LocatorFactory,
    options: &BatchOptions,
    on_item: Option<&ItemCallback>,
) -> MediaResult<BatchReport> {
    fs::create_dir_all(output_dir)
        .map_err(|e| MediaError::output_failed(output_dir, e.to_string()))?;

    let images = scan_media(input_dir, MediaKind::Image, false);
    if images.is_empty() {
        warn!(dir = %input_dir.display(), "No images found");
        return Ok(BatchReport::default());
    }
    info!(dir = %input_dir.display(), images = images.len(), "Cropping faces");

    run_batch(&images, options, factory, on_item, |locator, path| {
        let image = match image::open(path) {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable image, skipping");
                return Ok(ItemOutcome::Skipped);
            }
        };

        let Some(face) = primary_face_crop(locator, &image)? else {
            return Ok(ItemOutcome::Skipped);
        };

        let Some(name) = path.file_name() else {
            return Ok(ItemOutcome::Skipped);
        };
        let out = output_dir.join(name);
        warn_on_collision(&out);
        face.save(&out)
            .map_err(|e| MediaError::output_failed(&out, e.to_string()))?;
        Ok(ItemOutcome::Saved(1))
    })
}
