//! OpenCV-backed video I/O and face location.

mod capture;
mod convert;
mod yunet;

pub use capture::{OpenCvFrameSink, OpenCvFrameSource, OpenCvVideoBackend};
pub use convert::{bgr_mat_to_rgb, rgb_to_bgr_mat};
pub use yunet::{find_model_path, YuNetLocator, YUNET_MODEL_PATHS};
