//! Single-image face analysis: locate, pick the primary face, classify.

use std::sync::Arc;

use fakescan_models::{select_primary_face, Classification, Detection};
use image::RgbImage;
use tracing::debug;

use crate::classifier::FaceClassifier;
use crate::crop::crop_face;
use crate::error::{MediaError, MediaResult};
use crate::locator::FaceLocator;

/// Result of analyzing the primary face of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceAnalysis {
    /// The face that was classified
    pub detection: Detection,
    pub classification: Classification,
    /// Number of faces the locator returned
    pub faces_found: usize,
}

/// Locator and classifier pair, constructed once and shared.
#[derive(Clone)]
pub struct FaceAnalyzer {
    locator: Arc<dyn FaceLocator>,
    classifier: Arc<dyn FaceClassifier>,
}

impl FaceAnalyzer {
    pub fn new(locator: Arc<dyn FaceLocator>, classifier: Arc<dyn FaceClassifier>) -> Self {
        Self { locator, classifier }
    }

    pub fn locator(&self) -> &Arc<dyn FaceLocator> {
        &self.locator
    }

    pub fn classifier(&self) -> &Arc<dyn FaceClassifier> {
        &self.classifier
    }

    /// Classify the largest face of `image`.
    ///
    /// `Ok(None)` when no usable face is found.
    pub fn analyze_primary_face(&self, image: &RgbImage) -> MediaResult<Option<FaceAnalysis>> {
        let detections = self.locator.locate(image)?;
        let Some(primary) = select_primary_face(&detections).copied() else {
            return Ok(None);
        };

        let Some(face) = crop_face(image, &primary.bbox) else {
            debug!(bbox = ?primary.bbox, "Primary face lies outside the image");
            return Ok(None);
        };

        let classification = self.classifier.classify(&face)?;
        Ok(Some(FaceAnalysis {
            detection: primary,
            classification,
            faces_found: detections.len(),
        }))
    }

    /// Classify the largest face of `image`, failing with
    /// [`MediaError::NoFaceDetected`] when there is none.
    pub fn analyze_image(&self, image: &RgbImage) -> MediaResult<FaceAnalysis> {
        let analysis = self
            .analyze_primary_face(image)?
            .ok_or(MediaError::NoFaceDetected)?;

        debug!(
            faces = analysis.faces_found,
            score = analysis.classification.score,
            verdict = %analysis.classification.verdict(),
            "Image analyzed"
        );
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ModelProfile;
    use fakescan_models::{BoundingBox, Verdict};
    use std::sync::Mutex;

    struct FixedLocator(Vec<Detection>);

    impl FaceLocator for FixedLocator {
        fn locate(&self, _image: &RgbImage) -> MediaResult<Vec<Detection>> {
            Ok(self.0.clone())
        }
    }

    /// Scores by crop width so tests can tell which face was classified.
    struct WidthClassifier {
        profile: ModelProfile,
        seen: Mutex<Vec<(u32, u32)>>,
    }

    impl FaceClassifier for WidthClassifier {
        fn classify(&self, face: &RgbImage) -> MediaResult<Classification> {
            self.seen.lock().unwrap().push(face.dimensions());
            Ok(Classification::new(face.width() as f64 / 100.0))
        }

        fn profile(&self) -> &ModelProfile {
            &self.profile
        }
    }

    fn analyzer(detections: Vec<Detection>) -> (FaceAnalyzer, Arc<WidthClassifier>) {
        let classifier = Arc::new(WidthClassifier {
            profile: ModelProfile::baseline_128(),
            seen: Mutex::new(Vec::new()),
        });
        let analyzer = FaceAnalyzer::new(Arc::new(FixedLocator(detections)), classifier.clone());
        (analyzer, classifier)
    }

    fn det(x: f64, w: f64, h: f64) -> Detection {
        Detection::new(BoundingBox::new(x, 0.0, w, h), 0.9)
    }

    #[test]
    fn test_no_face_is_error() {
        let (analyzer, _) = analyzer(vec![]);
        let err = analyzer.analyze_image(&RgbImage::new(100, 100)).unwrap_err();
        assert!(matches!(err, MediaError::NoFaceDetected));
    }

    #[test]
    fn test_largest_face_is_classified() {
        let (analyzer, classifier) = analyzer(vec![det(0.0, 20.0, 20.0), det(30.0, 70.0, 60.0)]);
        let analysis = analyzer.analyze_image(&RgbImage::new(200, 100)).unwrap();
        assert_eq!(analysis.faces_found, 2);
        assert_eq!(analysis.detection.bbox.x, 30.0);
        assert_eq!(analysis.classification.verdict(), Verdict::Real);
        assert_eq!(classifier.seen.lock().unwrap().as_slice(), &[(70, 60)]);
    }

    #[test]
    fn test_face_outside_image_counts_as_no_face() {
        let (analyzer, _) = analyzer(vec![det(500.0, 20.0, 20.0)]);
        assert!(analyzer
            .analyze_primary_face(&RgbImage::new(100, 100))
            .unwrap()
            .is_none());
    }
}
