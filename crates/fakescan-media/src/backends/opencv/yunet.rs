//! OpenCV YuNet face locator.
//!
//! Wraps `FaceDetectorYN`. The detector input size follows each image, so one
//! locator serves images and video frames of any resolution.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fakescan_models::{BoundingBox, Detection};
use image::RgbImage;
use opencv::core::{Mat, Ptr, Size};
use opencv::dnn::{DNN_BACKEND_DEFAULT, DNN_BACKEND_OPENCV, DNN_TARGET_CPU};
use opencv::objdetect::FaceDetectorYN;
use opencv::prelude::*;
use tracing::{debug, info, warn};

use super::convert::rgb_to_bgr_mat;
use crate::error::{MediaError, MediaResult};
use crate::locator::{FaceLocator, LocatorFactory};

/// Model locations tried when no explicit path is configured, in order.
pub const YUNET_MODEL_PATHS: &[&str] = &[
    "./models/face_detection_yunet_2023mar.onnx",
    "./models/face_detection_yunet_2023mar_int8.onnx",
    "./models/face_detection_yunet_2022mar.onnx",
    "/app/models/face_detection_yunet_2023mar.onnx",
    "/app/models/face_detection_yunet_2022mar.onnx",
    "/usr/share/opencv/models/face_detection_yunet_2023mar.onnx",
    "/usr/share/opencv/models/face_detection_yunet_2022mar.onnx",
];

const SCORE_THRESHOLD: f32 = 0.6;
const NMS_THRESHOLD: f32 = 0.3;
const TOP_K: i32 = 50;

/// Files smaller than this are treated as truncated downloads.
const MIN_MODEL_BYTES: u64 = 50_000;

/// First existing entry of [`YUNET_MODEL_PATHS`].
pub fn find_model_path() -> Option<PathBuf> {
    YUNET_MODEL_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

pub struct YuNetLocator {
    detector: Mutex<Ptr<FaceDetectorYN>>,
    model_path: PathBuf,
}

impl YuNetLocator {
    /// Load from `model_path`, or from the first model found on the search list.
    pub fn load(model_path: Option<&Path>) -> MediaResult<Self> {
        let model_path = match model_path {
            Some(path) => path.to_path_buf(),
            None => find_model_path().ok_or_else(|| {
                MediaError::model_unavailable(format!(
                    "No YuNet model found; searched {}",
                    YUNET_MODEL_PATHS.join(", ")
                ))
            })?,
        };

        let metadata = std::fs::metadata(&model_path).map_err(|e| {
            MediaError::model_unavailable(format!(
                "Cannot read YuNet model {}: {}",
                model_path.display(),
                e
            ))
        })?;
        if metadata.len() < MIN_MODEL_BYTES {
            return Err(MediaError::model_unavailable(format!(
                "YuNet model file appears corrupted (size: {} bytes)",
                metadata.len()
            )));
        }

        let detector = Self::create_detector(&model_path)?;
        info!(model = %model_path.display(), "YuNet face locator initialized");

        Ok(Self {
            detector: Mutex::new(detector),
            model_path,
        })
    }

    /// Factory building one independent locator per caller.
    pub fn factory(model_path: Option<PathBuf>) -> LocatorFactory {
        Arc::new(move || -> MediaResult<Box<dyn FaceLocator>> {
            Ok(Box::new(YuNetLocator::load(model_path.as_deref())?))
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn create_detector(model_path: &Path) -> MediaResult<Ptr<FaceDetectorYN>> {
        let model = model_path.to_string_lossy();
        let backends = [
            (DNN_BACKEND_DEFAULT, DNN_TARGET_CPU, "default"),
            (DNN_BACKEND_OPENCV, DNN_TARGET_CPU, "opencv"),
        ];

        let mut last_error = String::new();
        for (backend_id, target_id, backend_name) in backends {
            match FaceDetectorYN::create(
                &model,
                "",
                Size::new(320, 320),
                SCORE_THRESHOLD,
                NMS_THRESHOLD,
                TOP_K,
                backend_id,
                target_id,
            ) {
                Ok(detector) => {
                    debug!("YuNet created with {} backend", backend_name);
                    return Ok(detector);
                }
                Err(e) => {
                    warn!("YuNet {} backend failed: {}", backend_name, e);
                    last_error = e.to_string();
                }
            }
        }

        Err(MediaError::model_unavailable(format!(
            "Failed to create YuNet detector with any backend: {}",
            last_error
        )))
    }
}

/// Rows of `[x, y, w, h, 10 landmark coords, score]`.
fn parse_faces(faces: &Mat) -> Vec<Detection> {
    let rows = faces.rows();
    if rows <= 0 || faces.cols() < 15 {
        return Vec::new();
    }

    let mut detections = Vec::with_capacity(rows as usize);
    for i in 0..rows {
        let value = |col: i32| faces.at_2d::<f32>(i, col).map(|v| *v as f64);
        let (Ok(x), Ok(y), Ok(w), Ok(h), Ok(score)) = (value(0), value(1), value(2), value(3), value(14)) else {
            continue;
        };
        if w <= 0.0 || h <= 0.0 {
            continue;
        }
        detections.push(Detection::new(BoundingBox::new(x, y, w, h), score));
    }
    detections
}

impl FaceLocator for YuNetLocator {
    fn locate(&self, image: &RgbImage) -> MediaResult<Vec<Detection>> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(Vec::new());
        }
        let bgr = rgb_to_bgr_mat(image)?;

        let mut detector = self
            .detector
            .lock()
            .map_err(|_| MediaError::detection_failed("YuNet detector poisoned"))?;

        detector
            .set_input_size(Size::new(image.width() as i32, image.height() as i32))
            .map_err(|e| MediaError::detection_failed(format!("YuNet input size: {e}")))?;

        let mut faces = Mat::default();
        detector
            .detect(&bgr, &mut faces)
            .map_err(|e| MediaError::detection_failed(format!("YuNet detection failed: {e}")))?;

        let detections = parse_faces(&faces);
        debug!(faces = detections.len(), "YuNet located faces");
        Ok(detections)
    }

    fn name(&self) -> &str {
        "yunet"
    }
}
