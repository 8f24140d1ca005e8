//! Face extraction from video folders.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::batch::{run_batch, warn_on_collision, BatchOptions, BatchReport, ItemCallback, ItemOutcome};
use super::faces::primary_face_crop;
use super::scan::{scan_media, MediaKind};
use crate::error::{MediaError, MediaResult};
use crate::locator::{FaceLocator, LocatorFactory};
use crate::service::VideoBackend;

/// Default cap of saved faces per video.
pub const DEFAULT_MAX_FACES_PER_VIDEO: u64 = 5;

/// Output name of a face taken from frame `index` of `video`.
pub fn face_file_name(video: &Path, index: u64) -> String {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    format!("{}_frame{}.jpg", stem, index)
}

/// Scan `video` frame by frame and save up to `max_faces` primary face crops.
pub fn extract_faces_from_video(
    backend: &dyn VideoBackend,
    locator: &dyn FaceLocator,
    video: &Path,
    output_dir: &Path,
    max_faces: u64,
) -> MediaResult<u64> {
    let mut source = backend.open(video)?;
    let mut saved = 0u64;
    let mut index = 0u64;

    while saved < max_faces {
        let Some(frame) = source.next_frame()? else {
            break;
        };

        if let Some(face) = primary_face_crop(locator, &frame.image)? {
            let out = output_dir.join(face_file_name(video, index));
            warn_on_collision(&out);
            face.save(&out)
                .map_err(|e| MediaError::output_failed(&out, e.to_string()))?;
            saved += 1;
        }
        index += 1;
    }

    debug!(video = %video.display(), frames = index, saved, "Video scanned");
    Ok(saved)
}

/// Run [`extract_faces_from_video`] over every video under `input_dir`.
pub fn extract_faces_from_videos(
    input_dir: &Path,
    output_dir: &Path,
    backend: &dyn VideoBackend,
    factory: &LocatorFactory,
    max_faces: u64,
    options: &BatchOptions,
    on_item: Option<&ItemCallback>,
) -> MediaResult<BatchReport> {
    fs::create_dir_all(output_dir)
        .map_err(|e| MediaError::output_failed(output_dir, e.to_string()))?;

    let videos: Vec<PathBuf> = scan_media(input_dir, MediaKind::Video, true);
    if videos.is_empty() {
        warn!(dir = %input_dir.display(), "No videos found");
        return Ok(BatchReport::default());
    }
    info!(dir = %input_dir.display(), videos = videos.len(), max_faces, "Extracting faces from videos");

    run_batch(&videos, options, factory, on_item, |locator, path| {
        match extract_faces_from_video(backend, locator, path, output_dir, max_faces)? {
            0 => Ok(ItemOutcome::Skipped),
            n => Ok(ItemOutcome::Saved(n)),
        }
    })
}
