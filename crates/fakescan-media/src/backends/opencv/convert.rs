//! `RgbImage` <-> BGR `Mat` conversion.

use image::RgbImage;
use opencv::core::{AlgorithmHint, Mat, Scalar, CV_8UC3};
use opencv::imgproc;
use opencv::prelude::*;

use crate::error::{MediaError, MediaResult};

pub(crate) fn cv_error(context: &'static str) -> impl Fn(opencv::Error) -> MediaError {
    move |e| MediaError::internal(format!("{context}: {e}"))
}

/// Copy an RGB buffer into a new BGR `Mat`.
pub fn rgb_to_bgr_mat(image: &RgbImage) -> MediaResult<Mat> {
    let (w, h) = (image.width() as i32, image.height() as i32);
    let mut rgb = Mat::new_rows_cols_with_default(h, w, CV_8UC3, Scalar::all(0.0))
        .map_err(cv_error("Allocate frame"))?;
    rgb.data_bytes_mut()
        .map_err(cv_error("Frame data"))?
        .copy_from_slice(image.as_raw());

    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0, AlgorithmHint::ALGO_HINT_DEFAULT)
        .map_err(cv_error("RGB to BGR"))?;
    Ok(bgr)
}

/// Convert a decoded BGR `Mat` into an owned RGB buffer.
pub fn bgr_mat_to_rgb(frame: &Mat) -> MediaResult<RgbImage> {
    if frame.channels() != 3 {
        return Err(MediaError::internal(format!(
            "Expected 3-channel frame, got {}",
            frame.channels()
        )));
    }

    let mut rgb = Mat::default();
    imgproc::cvt_color(frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0, AlgorithmHint::ALGO_HINT_DEFAULT)
        .map_err(cv_error("BGR to RGB"))?;

    let (w, h) = (rgb.cols() as u32, rgb.rows() as u32);
    let bytes = rgb.data_bytes().map_err(cv_error("Frame data"))?.to_vec();
    RgbImage::from_raw(w, h, bytes).ok_or_else(|| MediaError::internal("Frame buffer size mismatch"))
}
