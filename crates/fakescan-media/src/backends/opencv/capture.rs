//! OpenCV video reading and annotated video writing.

use std::path::{Path, PathBuf};

use opencv::core::{Point, Rect, Scalar, Size};
use opencv::imgproc;
use opencv::prelude::*;
use opencv::videoio::{
    VideoCapture, VideoWriter, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT, CAP_PROP_FRAME_HEIGHT,
    CAP_PROP_FRAME_WIDTH,
};
use tracing::{debug, info};

use super::convert::{bgr_mat_to_rgb, cv_error, rgb_to_bgr_mat};
use crate::error::{MediaError, MediaResult};
use crate::frame::{Frame, FrameAnnotation, FrameSink, FrameSource, VideoProperties};
use crate::service::VideoBackend;

/// Frame rate assumed when the container reports none.
const FALLBACK_FPS: f64 = 30.0;

/// Decodes frames with `VideoCapture`, converting BGR to RGB.
pub struct OpenCvFrameSource {
    capture: VideoCapture,
    properties: VideoProperties,
    next_index: u64,
}

impl OpenCvFrameSource {
    pub fn open(path: &Path) -> MediaResult<Self> {
        if !path.is_file() {
            return Err(MediaError::source_unreadable(path, "file does not exist"));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| MediaError::source_unreadable(path, "path is not valid UTF-8"))?;

        let capture = VideoCapture::from_file(path_str, CAP_ANY)
            .map_err(|e| MediaError::source_unreadable(path, format!("open video: {e}")))?;
        if !capture.is_opened().unwrap_or(false) {
            return Err(MediaError::source_unreadable(path, "could not open video"));
        }

        let get = |prop: i32| capture.get(prop).unwrap_or(0.0);
        let frame_count = get(CAP_PROP_FRAME_COUNT);
        let properties = VideoProperties {
            width: get(CAP_PROP_FRAME_WIDTH).max(0.0) as u32,
            height: get(CAP_PROP_FRAME_HEIGHT).max(0.0) as u32,
            fps: get(CAP_PROP_FPS),
            frame_count: (frame_count > 0.0).then_some(frame_count as u64),
        };

        info!(
            path = %path.display(),
            width = properties.width,
            height = properties.height,
            fps = properties.fps,
            frame_count = ?properties.frame_count,
            "Video opened"
        );

        Ok(Self {
            capture,
            properties,
            next_index: 0,
        })
    }
}

impl FrameSource for OpenCvFrameSource {
    fn properties(&self) -> VideoProperties {
        self.properties
    }

    fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        let mut mat = Mat::default();
        let ok = self.capture.read(&mut mat).map_err(cv_error("Read frame"))?;
        if !ok || mat.empty() {
            return Ok(None);
        }

        let image = bgr_mat_to_rgb(&mat)?;
        let frame = Frame::new(self.next_index, image);
        self.next_index += 1;
        Ok(Some(frame))
    }
}

/// Writes `mp4v` video at the source geometry, drawing face boxes and labels.
pub struct OpenCvFrameSink {
    writer: VideoWriter,
    path: PathBuf,
    size: (u32, u32),
    frames_written: u64,
}

impl OpenCvFrameSink {
    pub fn create(path: &Path, properties: &VideoProperties) -> MediaResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| MediaError::output_failed(path, e.to_string()))?;
            }
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| MediaError::output_failed(path, "path is not valid UTF-8"))?;

        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v').map_err(cv_error("fourcc"))?;
        let fps = if properties.fps > 0.0 { properties.fps } else { FALLBACK_FPS };
        let size = Size::new(properties.width as i32, properties.height as i32);

        let writer = VideoWriter::new(path_str, fourcc, fps, size, true)
            .map_err(|e| MediaError::output_failed(path, e.to_string()))?;
        if !writer.is_opened().unwrap_or(false) {
            return Err(MediaError::output_failed(path, "could not open video writer"));
        }

        debug!(path = %path.display(), fps, "Annotated output opened");
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            size: (properties.width, properties.height),
            frames_written: 0,
        })
    }
}

fn draw_annotation(mat: &mut Mat, annotation: &FrameAnnotation, width: u32, height: u32) -> MediaResult<()> {
    let Some((x, y, w, h)) = annotation.bbox.to_pixel_rect(width, height) else {
        return Ok(());
    };
    let [r, g, b] = annotation.color_rgb();
    let color = Scalar::new(b as f64, g as f64, r as f64, 0.0);

    imgproc::rectangle(
        mat,
        Rect::new(x as i32, y as i32, w as i32, h as i32),
        color,
        2,
        imgproc::LINE_8,
        0,
    )
    .map_err(cv_error("Draw box"))?;

    imgproc::put_text(
        mat,
        &annotation.label,
        Point::new(x as i32, (y as i32 - 10).max(12)),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.9,
        color,
        2,
        imgproc::LINE_8,
        false,
    )
    .map_err(cv_error("Draw label"))?;
    Ok(())
}

impl FrameSink for OpenCvFrameSink {
    fn write(&mut self, frame: &Frame, annotation: Option<&FrameAnnotation>) -> MediaResult<()> {
        let mut mat = rgb_to_bgr_mat(&frame.image)?;
        if let Some(annotation) = annotation {
            draw_annotation(&mut mat, annotation, frame.width(), frame.height())?;
        }
        if (frame.width(), frame.height()) != self.size {
            debug!(frame = frame.index, "Frame size differs from output size");
        }

        self.writer
            .write(&mat)
            .map_err(|e| MediaError::output_failed(&self.path, e.to_string()))?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> MediaResult<()> {
        self.writer
            .release()
            .map_err(|e| MediaError::output_failed(&self.path, e.to_string()))?;
        info!(path = %self.path.display(), frames = self.frames_written, "Annotated video written");
        Ok(())
    }
}

/// [`VideoBackend`] over OpenCV `videoio`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCvVideoBackend;

impl VideoBackend for OpenCvVideoBackend {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>> {
        Ok(Box::new(OpenCvFrameSource::open(path)?))
    }

    fn create_sink(&self, path: &Path, properties: &VideoProperties) -> MediaResult<Box<dyn FrameSink>> {
        Ok(Box::new(OpenCvFrameSink::create(path, properties)?))
    }
}
