//! Face detections and primary-face selection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    /// Left edge x-coordinate
    pub x: f64,
    /// Top edge y-coordinate
    pub y: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge x-coordinate.
    #[inline]
    pub fn x2(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge y-coordinate.
    #[inline]
    pub fn y2(&self) -> f64 {
        self.y + self.height
    }

    /// Box area in pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Intersect the box with a `frame_width` x `frame_height` frame and round
    /// to whole pixels.
    ///
    /// Returns `(x, y, width, height)`, or `None` when nothing of the box lies
    /// inside the frame.
    pub fn to_pixel_rect(&self, frame_width: u32, frame_height: u32) -> Option<(u32, u32, u32, u32)> {
        let fw = frame_width as f64;
        let fh = frame_height as f64;

        let x1 = self.x.max(0.0).min(fw).floor();
        let y1 = self.y.max(0.0).min(fh).floor();
        let x2 = self.x2().max(0.0).min(fw).ceil();
        let y2 = self.y2().max(0.0).min(fh).ceil();

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some((x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32))
    }
}

/// One face found by the locator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Detection {
    /// Face bounding box
    pub bbox: BoundingBox,
    /// Detector confidence (0.0-1.0)
    pub confidence: f64,
}

impl Detection {
    pub fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self { bbox, confidence }
    }
}

/// Pick "the" face when a single subject is assumed: the detection with the
/// largest box area.
///
/// Ties are won by the detection seen first (comparison is strict `>`).
pub fn select_primary_face(detections: &[Detection]) -> Option<&Detection> {
    let mut best: Option<&Detection> = None;
    for detection in detections {
        match best {
            Some(current) if detection.bbox.area() > current.bbox.area() => best = Some(detection),
            None => best = Some(detection),
            _ => {}
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f64, y: f64, w: f64, h: f64) -> Detection {
        Detection::new(BoundingBox::new(x, y, w, h), 0.9)
    }

    #[test]
    fn test_select_largest_area() {
        let detections = vec![det(0.0, 0.0, 10.0, 10.0), det(50.0, 50.0, 30.0, 20.0), det(5.0, 5.0, 20.0, 20.0)];
        let primary = select_primary_face(&detections).unwrap();
        assert_eq!(primary.bbox.x, 50.0);
    }

    #[test]
    fn test_equal_area_first_seen_wins() {
        let detections = vec![
            det(100.0, 0.0, 20.0, 10.0),
            det(0.0, 0.0, 10.0, 20.0),
            det(200.0, 0.0, 20.0, 10.0),
        ];
        let primary = select_primary_face(&detections).unwrap();
        assert_eq!(primary.bbox.x, 100.0);
    }

    #[test]
    fn test_select_empty() {
        assert!(select_primary_face(&[]).is_none());
    }

    #[test]
    fn test_pixel_rect_inside_frame() {
        let bbox = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(bbox.to_pixel_rect(100, 100), Some((10, 20, 30, 40)));
    }

    #[test]
    fn test_pixel_rect_clamped_to_frame() {
        let bbox = BoundingBox::new(-10.0, 90.0, 30.0, 40.0);
        assert_eq!(bbox.to_pixel_rect(100, 100), Some((0, 90, 20, 10)));
    }

    #[test]
    fn test_pixel_rect_outside_frame() {
        let bbox = BoundingBox::new(150.0, 150.0, 30.0, 40.0);
        assert_eq!(bbox.to_pixel_rect(100, 100), None);
    }

    #[test]
    fn test_area() {
        assert_eq!(BoundingBox::new(0.0, 0.0, 4.0, 5.0).area(), 20.0);
    }
}
