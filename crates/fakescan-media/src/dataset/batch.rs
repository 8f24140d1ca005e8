//! Parallel per-item batch runner shared by the face extraction tools.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{MediaError, MediaResult};
use crate::locator::{FaceLocator, LocatorFactory};
use crate::video::FailurePolicy;

/// Called once per finished item (progress bars).
pub type ItemCallback = dyn Fn() + Send + Sync;

/// What happened to one batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// `count` face crops were written
    Saved(u64),
    /// Nothing usable in the item
    Skipped,
}

/// An isolated per-item failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    pub path: PathBuf,
    pub message: String,
}

/// Totals of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Items attempted
    pub processed: u64,
    /// Face crops written
    pub saved: u64,
    /// Items that produced nothing
    pub skipped: u64,
    pub errors: Vec<ItemError>,
}

impl BatchReport {
    fn record(&mut self, path: &Path, result: MediaResult<ItemOutcome>) {
        self.processed += 1;
        match result {
            Ok(ItemOutcome::Saved(count)) => self.saved += count,
            Ok(ItemOutcome::Skipped) => self.skipped += 1,
            Err(e) => self.errors.push(ItemError {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Worker count for batch pools: all cores but one, at least one.
pub fn default_worker_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus.saturating_sub(1).max(1)
}

/// Options common to the batch tools.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOptions {
    pub workers: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: default_worker_count(),
            failure_policy: FailurePolicy::IsolatePerItem,
        }
    }
}

/// Run `work` over `items` on a dedicated pool, one locator per worker.
///
/// Under `FailFast` no item is started after the first failure; items already
/// in flight on other workers still finish.
pub(crate) fn run_batch<F>(
    items: &[PathBuf],
    options: &BatchOptions,
    factory: &LocatorFactory,
    on_item: Option<&ItemCallback>,
    work: F,
) -> MediaResult<BatchReport>
where
    F: Fn(&dyn FaceLocator, &Path) -> MediaResult<ItemOutcome> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .build()
        .map_err(|e| MediaError::internal(format!("Failed to build worker pool: {}", e)))?;

    info!(items = items.len(), workers = options.workers, "Starting batch");

    let fail_fast = options.failure_policy == FailurePolicy::FailFast;
    let aborted = AtomicBool::new(false);

    // None marks items never started because the batch was aborted
    let results: Vec<Option<MediaResult<ItemOutcome>>> = pool.install(|| {
        items
            .par_iter()
            .map_init(
                || factory(),
                |locator, path| {
                    if aborted.load(Ordering::Acquire) {
                        return None;
                    }
                    let result = match locator {
                        Ok(locator) => work(&**locator, path),
                        Err(e) => Err(MediaError::detection_failed(format!(
                            "locator unavailable in worker: {}",
                            e
                        ))),
                    };
                    if fail_fast && result.is_err() {
                        aborted.store(true, Ordering::Release);
                    }
                    if let Some(cb) = on_item {
                        cb();
                    }
                    Some(result)
                },
            )
            .collect()
    });

    let mut report = BatchReport::default();
    let mut first_error = None;
    let mut not_started = 0usize;
    for (path, result) in items.iter().zip(results) {
        let Some(result) = result else {
            not_started += 1;
            continue;
        };
        match result {
            Err(e) if fail_fast => {
                warn!(path = %path.display(), error = %e, "Item failed, aborting batch");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            Err(ref e) => {
                warn!(path = %path.display(), error = %e, "Item failed");
                report.record(path, result);
            }
            Ok(_) => report.record(path, result),
        }
    }

    if let Some(e) = first_error {
        warn!(
            completed = report.processed,
            saved = report.saved,
            not_started,
            "Batch aborted"
        );
        return Err(e);
    }

    info!(
        processed = report.processed,
        saved = report.saved,
        skipped = report.skipped,
        errors = report.errors.len(),
        "Batch finished"
    );
    Ok(report)
}

/// Warn when `path` is about to be overwritten by a batch output.
pub(crate) fn warn_on_collision(path: &Path) {
    if path.exists() {
        warn!(path = %path.display(), "Output already exists and will be overwritten");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fakescan_models::Detection;
    use image::RgbImage;
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;

    struct NoFaces;

    impl FaceLocator for NoFaces {
        fn locate(&self, _image: &RgbImage) -> MediaResult<Vec<Detection>> {
            Ok(Vec::new())
        }
    }

    fn factory() -> LocatorFactory {
        Arc::new(|| -> MediaResult<Box<dyn FaceLocator>> { Ok(Box::new(NoFaces)) })
    }

    fn items(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("item{i}.jpg"))).collect()
    }

    #[test]
    fn test_isolated_errors_are_collected() {
        let options = BatchOptions {
            workers: 2,
            failure_policy: FailurePolicy::IsolatePerItem,
        };
        let report = run_batch(&items(6), &options, &factory(), None, |_, path| {
            if path.to_string_lossy().contains('3') {
                Err(MediaError::detection_failed("boom"))
            } else if path.to_string_lossy().contains('0') {
                Ok(ItemOutcome::Skipped)
            } else {
                Ok(ItemOutcome::Saved(1))
            }
        })
        .unwrap();

        assert_eq!(report.processed, 6);
        assert_eq!(report.saved, 4);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, PathBuf::from("item3.jpg"));
    }

    #[test]
    fn test_fail_fast_aborts() {
        let options = BatchOptions {
            workers: 1,
            failure_policy: FailurePolicy::FailFast,
        };
        let result = run_batch(&items(3), &options, &factory(), None, |_, _| {
            Err(MediaError::detection_failed("boom"))
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_fail_fast_starts_no_item_after_failure() {
        let options = BatchOptions {
            workers: 1,
            failure_policy: FailurePolicy::FailFast,
        };
        let calls = AtomicU64::new(0);
        let finished = std::sync::Arc::new(AtomicU64::new(0));
        let finished_cb = finished.clone();
        let cb: &ItemCallback = &move || {
            finished_cb.fetch_add(1, Ordering::SeqCst);
        };
        let result = run_batch(&items(6), &options, &factory(), Some(cb), |_, _| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(MediaError::detection_failed("boom"))
            } else {
                Ok(ItemOutcome::Saved(1))
            }
        });

        let err = result.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_isolate_keeps_going_after_failure() {
        let options = BatchOptions {
            workers: 1,
            failure_policy: FailurePolicy::IsolatePerItem,
        };
        let calls = AtomicU64::new(0);
        let report = run_batch(&items(6), &options, &factory(), None, |_, _| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(MediaError::detection_failed("boom"))
            } else {
                Ok(ItemOutcome::Saved(1))
            }
        })
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert_eq!(report.saved, 5);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_callback_runs_per_item() {
        let counter = std::sync::Arc::new(AtomicU64::new(0));
        let counter_cb = counter.clone();
        let cb: &ItemCallback = &move || {
            counter_cb.fetch_add(1, Ordering::SeqCst);
        };
        let report = run_batch(&items(5), &BatchOptions::default(), &factory(), Some(cb), |_, _| {
            Ok(ItemOutcome::Skipped)
        })
        .unwrap();
        assert_eq!(report.skipped, 5);
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_failing_factory_reports_every_item() {
        let factory: LocatorFactory =
            Arc::new(|| -> MediaResult<Box<dyn FaceLocator>> { Err(MediaError::model_unavailable("no model")) });
        let report = run_batch(&items(2), &BatchOptions::default(), &factory, None, |_, _| {
            Ok(ItemOutcome::Skipped)
        })
        .unwrap();
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_default_worker_count_positive() {
        assert!(default_worker_count() >= 1);
    }
}
