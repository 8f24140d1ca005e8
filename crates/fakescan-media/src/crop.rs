//! Face cropping.

use fakescan_models::BoundingBox;
use image::{imageops, RgbImage};

/// Minimum side, in pixels, a face must exceed to be saved by the dataset tools.
pub const MIN_SAVED_FACE_SIDE: f64 = 50.0;

/// Crop `bbox` out of `image`, clamping the box to the image bounds.
///
/// Returns `None` when the box lies entirely outside the image.
pub fn crop_face(image: &RgbImage, bbox: &BoundingBox) -> Option<RgbImage> {
    let (x, y, w, h) = bbox.to_pixel_rect(image.width(), image.height())?;
    Some(imageops::crop_imm(image, x, y, w, h).to_image())
}

/// True when both sides of the box are strictly larger than
/// [`MIN_SAVED_FACE_SIDE`].
pub fn is_large_enough(bbox: &BoundingBox) -> bool {
    bbox.width > MIN_SAVED_FACE_SIDE && bbox.height > MIN_SAVED_FACE_SIDE
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_crop_inside() {
        let mut img = RgbImage::new(100, 80);
        img.put_pixel(20, 10, Rgb([9, 9, 9]));
        let face = crop_face(&img, &BoundingBox::new(20.0, 10.0, 30.0, 40.0)).unwrap();
        assert_eq!(face.dimensions(), (30, 40));
        assert_eq!(face.get_pixel(0, 0), &Rgb([9, 9, 9]));
    }

    #[test]
    fn test_crop_clamped_at_edges() {
        let img = RgbImage::new(100, 80);
        let face = crop_face(&img, &BoundingBox::new(-10.0, 60.0, 40.0, 40.0)).unwrap();
        assert_eq!(face.dimensions(), (30, 20));
    }

    #[test]
    fn test_crop_outside_is_none() {
        let img = RgbImage::new(100, 80);
        assert!(crop_face(&img, &BoundingBox::new(200.0, 0.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn test_minimum_face_size_is_strict() {
        assert!(!is_large_enough(&BoundingBox::new(0.0, 0.0, 50.0, 80.0)));
        assert!(!is_large_enough(&BoundingBox::new(0.0, 0.0, 80.0, 50.0)));
        assert!(is_large_enough(&BoundingBox::new(0.0, 0.0, 51.0, 51.0)));
    }
}
