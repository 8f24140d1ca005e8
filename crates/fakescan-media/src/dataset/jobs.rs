//! Sequential crop jobs from a JSON manifest.
//!
//! ```json
//! { "jobs": [ { "name": "celeba", "input": "data/celeba", "output": "data/processed_celeba" } ] }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::batch::{BatchOptions, BatchReport};
use super::faces::crop_faces_in_dir;
use crate::error::{MediaError, MediaResult};
use crate::locator::LocatorFactory;

/// One folder-to-folder face crop job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropJob {
    pub name: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobManifest {
    pub jobs: Vec<CropJob>,
}

impl JobManifest {
    pub fn load(path: &Path) -> MediaResult<Self> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let manifest: JobManifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }
}

/// Report of a finished job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub name: String,
    pub report: BatchReport,
}

/// Run every job in order. The first job that fails stops the run.
pub fn run_crop_jobs(
    manifest: &JobManifest,
    factory: &LocatorFactory,
    options: &BatchOptions,
) -> MediaResult<Vec<JobReport>> {
    let mut reports = Vec::with_capacity(manifest.jobs.len());

    for (i, job) in manifest.jobs.iter().enumerate() {
        info!(
            job = %job.name,
            step = i + 1,
            total = manifest.jobs.len(),
            input = %job.input.display(),
            output = %job.output.display(),
            "Running crop job"
        );

        let report = crop_faces_in_dir(&job.input, &job.output, factory, options, None).map_err(|e| {
            error!(job = %job.name, error = %e, "Crop job failed, stopping");
            MediaError::internal(format!("job '{}' failed: {}", job.name, e))
        })?;

        reports.push(JobReport {
            name: job.name.clone(),
            report,
        });
    }

    info!(jobs = reports.len(), "All crop jobs finished");
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(
            &path,
            r#"{"jobs":[{"name":"utk","input":"data/utk","output":"data/processed"}]}"#,
        )
        .unwrap();

        let manifest = JobManifest::load(&path).unwrap();
        assert_eq!(manifest.jobs.len(), 1);
        assert_eq!(manifest.jobs[0].output, PathBuf::from("data/processed"));
    }

    #[test]
    fn test_manifest_missing() {
        let err = JobManifest::load(Path::new("/definitely/missing.json")).unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
