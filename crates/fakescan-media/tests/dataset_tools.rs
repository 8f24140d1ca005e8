//! Face crop batches and video face extraction over scripted locators.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use fakescan_media::dataset::{
    crop_faces_in_dir, extract_faces_from_videos, run_crop_jobs, BatchOptions, CropJob, JobManifest,
};
use fakescan_media::{FaceLocator, FailurePolicy, LocatorFactory, MediaResult};
use fakescan_test_support::{face, solid_image, LocatorStep, MockVideoBackend, ScriptedLocator};

fn options() -> BatchOptions {
    BatchOptions {
        workers: 2,
        failure_policy: FailurePolicy::IsolatePerItem,
    }
}

fn write_images(dir: &Path, names: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for name in names {
        solid_image(120, 120).save(dir.join(name)).unwrap();
    }
}

#[test]
fn test_crop_faces_keeps_basename() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("raw");
    let output = dir.path().join("processed");
    write_images(&input, &["a.jpg", "b.png"]);
    fs::write(input.join("notes.txt"), b"ignored").unwrap();

    let factory = ScriptedLocator::factory(vec![face(10.0, 10.0, 60.0, 70.0)]);
    let report = crop_faces_in_dir(&input, &output, &factory, &options(), None).unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.saved, 2);
    let crop = image::open(output.join("a.jpg")).unwrap();
    assert_eq!((crop.width(), crop.height()), (60, 70));
    assert!(output.join("b.png").exists());
}

#[test]
fn test_small_faces_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("raw");
    let output = dir.path().join("processed");
    write_images(&input, &["a.jpg"]);

    let factory = ScriptedLocator::factory(vec![face(0.0, 0.0, 50.0, 90.0)]);
    let report = crop_faces_in_dir(&input, &output, &factory, &options(), None).unwrap();

    assert_eq!(report.saved, 0);
    assert_eq!(report.skipped, 1);
    assert!(!output.join("a.jpg").exists());
}

#[test]
fn test_undecodable_image_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("raw");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("broken.jpg"), b"nope").unwrap();

    let factory = ScriptedLocator::factory(vec![face(0.0, 0.0, 60.0, 60.0)]);
    let report = crop_faces_in_dir(&input, &dir.path().join("out"), &factory, &options(), None).unwrap();
    assert_eq!(report.skipped, 1);
    assert!(report.errors.is_empty());
}

#[test]
fn test_fail_fast_crop_stops_at_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("raw");
    let output = dir.path().join("processed");
    write_images(&input, &["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg", "f.jpg"]);

    let locator = Arc::new(
        ScriptedLocator::new(vec![LocatorStep::Fail("detector crashed".into())])
            .with_fallback(vec![face(10.0, 10.0, 80.0, 80.0)]),
    );
    let shared = Arc::clone(&locator);
    let factory: LocatorFactory =
        Arc::new(move || -> MediaResult<Box<dyn FaceLocator>> { Ok(Box::new(Arc::clone(&shared))) });
    let options = BatchOptions {
        workers: 1,
        failure_policy: FailurePolicy::FailFast,
    };

    let result = crop_faces_in_dir(&input, &output, &factory, &options, None);

    assert!(result.unwrap_err().to_string().contains("detector crashed"));
    assert_eq!(locator.calls(), 1);
    assert_eq!(fs::read_dir(&output).unwrap().count(), 0);
}

#[test]
fn test_isolated_crop_failure_does_not_stop_batch() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("raw");
    let output = dir.path().join("processed");
    write_images(&input, &["a.jpg", "b.jpg", "c.jpg"]);

    let locator = Arc::new(
        ScriptedLocator::new(vec![LocatorStep::Fail("detector crashed".into())])
            .with_fallback(vec![face(10.0, 10.0, 80.0, 80.0)]),
    );
    let shared = Arc::clone(&locator);
    let factory: LocatorFactory =
        Arc::new(move || -> MediaResult<Box<dyn FaceLocator>> { Ok(Box::new(Arc::clone(&shared))) });
    let options = BatchOptions {
        workers: 1,
        failure_policy: FailurePolicy::IsolatePerItem,
    };

    let report = crop_faces_in_dir(&input, &output, &factory, &options, None).unwrap();

    assert_eq!(locator.calls(), 3);
    assert_eq!(report.saved, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(fs::read_dir(&output).unwrap().count(), 2);
}

#[test]
fn test_video_faces_capped_per_video() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("videos");
    fs::create_dir_all(input.join("nested")).unwrap();
    fs::write(input.join("one.mp4"), b"v").unwrap();
    fs::write(input.join("nested/two.avi"), b"v").unwrap();
    let output = dir.path().join("faces");

    let backend = MockVideoBackend::new(40, 128, 128);
    let factory = ScriptedLocator::factory(vec![face(4.0, 4.0, 80.0, 80.0)]);
    let report = extract_faces_from_videos(&input, &output, &backend, &factory, 5, &options(), None).unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.saved, 10);
    for i in 0..5 {
        assert!(output.join(format!("one_frame{i}.jpg")).exists());
        assert!(output.join(format!("two_frame{i}.jpg")).exists());
    }
    assert!(!output.join("one_frame5.jpg").exists());
}

#[test]
fn test_video_without_faces_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("videos");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("empty.mkv"), b"v").unwrap();

    let backend = MockVideoBackend::new(10, 64, 64);
    let factory = ScriptedLocator::factory(Vec::new());
    let report =
        extract_faces_from_videos(&input, &dir.path().join("faces"), &backend, &factory, 5, &options(), None)
            .unwrap();
    assert_eq!(report.skipped, 1);
}

#[test]
fn test_crop_jobs_run_in_order() {
    let dir = tempfile::tempdir().unwrap();
    write_images(&dir.path().join("utk"), &["1.jpg"]);
    write_images(&dir.path().join("celeba"), &["2.jpg", "3.jpg"]);

    let manifest = JobManifest {
        jobs: vec![
            CropJob {
                name: "utk".into(),
                input: dir.path().join("utk"),
                output: dir.path().join("processed"),
            },
            CropJob {
                name: "celeba".into(),
                input: dir.path().join("celeba"),
                output: dir.path().join("processed_celeba"),
            },
        ],
    };

    let factory = ScriptedLocator::factory(vec![face(0.0, 0.0, 64.0, 64.0)]);
    let reports = run_crop_jobs(&manifest, &factory, &options()).unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].name, "utk");
    assert_eq!(reports[1].report.saved, 2);
    assert!(dir.path().join("processed_celeba/3.jpg").exists());
}
