//! Detection service over mock collaborators.

use fakescan_media::{MediaError, VideoAnalysisOptions};
use fakescan_models::Verdict;
use fakescan_test_support::{
    face, mock_service, mock_service_with, png_bytes, solid_image, MockVideoBackend, ScriptedClassifier,
    ScriptedLocator,
};

#[test]
fn test_predict_image_bytes() {
    let service = mock_service(
        ScriptedLocator::always(vec![face(5.0, 5.0, 40.0, 40.0)]),
        ScriptedClassifier::constant(0.973),
        MockVideoBackend::new(0, 8, 8),
    );

    let analysis = service.predict_image_bytes(&png_bytes(64, 64)).unwrap();
    assert_eq!(analysis.classification.verdict(), Verdict::Real);
    assert_eq!(analysis.classification.label(), "REAL 97.3%");
}

#[test]
fn test_predict_image_bytes_rejects_garbage() {
    let service = mock_service(
        ScriptedLocator::no_faces(),
        ScriptedClassifier::constant(0.5),
        MockVideoBackend::new(0, 8, 8),
    );
    let err = service.predict_image_bytes(b"definitely not an image").unwrap_err();
    assert!(matches!(err, MediaError::Image(_)));
    assert!(err.is_user_correctable());
}

#[test]
fn test_predict_image_without_face() {
    let service = mock_service(
        ScriptedLocator::no_faces(),
        ScriptedClassifier::constant(0.5),
        MockVideoBackend::new(0, 8, 8),
    );
    let err = service.predict_image(&solid_image(32, 32)).unwrap_err();
    assert!(matches!(err, MediaError::NoFaceDetected));
}

#[test]
fn test_predict_image_path_missing() {
    let service = mock_service(
        ScriptedLocator::no_faces(),
        ScriptedClassifier::constant(0.5),
        MockVideoBackend::new(0, 8, 8),
    );
    let err = service
        .predict_image_path(std::path::Path::new("/no/such/face.jpg"))
        .unwrap_err();
    assert!(matches!(err, MediaError::SourceUnreadable { .. }));
}

#[test]
fn test_predict_image_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("face.png");
    solid_image(80, 80).save(&path).unwrap();

    let service = mock_service(
        ScriptedLocator::always(vec![face(10.0, 10.0, 60.0, 60.0)]),
        ScriptedClassifier::constant(0.1),
        MockVideoBackend::new(0, 8, 8),
    );
    let analysis = service.predict_image_path(&path).unwrap();
    assert_eq!(analysis.classification.verdict(), Verdict::Fake);
}

#[test]
fn test_predict_video_with_annotation() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    std::fs::write(&input, b"video").unwrap();
    let output = dir.path().join("clip_annotated.mp4");

    let backend = std::sync::Arc::new(MockVideoBackend::new(12, 32, 32));
    let service = fakescan_media::DetectionService::new(
        std::sync::Arc::new(ScriptedLocator::always(vec![face(0.0, 0.0, 16.0, 16.0)])),
        std::sync::Arc::new(ScriptedClassifier::constant(0.2)),
        backend.clone(),
        VideoAnalysisOptions::default(),
    )
    .unwrap();

    let report = service.predict_video(&input, Some(&output), None).unwrap();
    assert_eq!(report.frames_sampled, 3);
    assert_eq!(report.verdict.verdict, Verdict::Fake);

    let sinks = backend.sinks();
    assert_eq!(sinks.len(), 1);
    assert_eq!(sinks[0].0, output);
    let record = sinks[0].1.record();
    assert!(record.finished);
    assert_eq!(record.frames.len(), 12);
}

#[test]
fn test_predict_video_unreadable_source() {
    let service = mock_service(
        ScriptedLocator::no_faces(),
        ScriptedClassifier::constant(0.5),
        MockVideoBackend::new(10, 8, 8),
    );
    let err = service
        .predict_video(std::path::Path::new("/no/such/clip.mp4"), None, None)
        .unwrap_err();
    assert!(matches!(err, MediaError::SourceUnreadable { .. }));
}

#[test]
fn test_with_stride_overrides_sampling() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    std::fs::write(&input, b"video").unwrap();

    let service = mock_service_with(
        ScriptedLocator::always(vec![face(0.0, 0.0, 16.0, 16.0)]),
        ScriptedClassifier::constant(0.9),
        MockVideoBackend::new(10, 32, 32),
        VideoAnalysisOptions::default(),
    );

    let report = service.with_stride(1).unwrap().predict_video(&input, None, None).unwrap();
    assert_eq!(report.frames_sampled, 10);
    assert!(matches!(service.with_stride(0).err(), Some(MediaError::InvalidStride(0))));
}
