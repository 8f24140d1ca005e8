//! Image command - classify the primary face of images.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use fakescan_media::dataset::{scan_media, MediaKind};
use fakescan_media::{build_service, DetectionService, MediaError, VideoAnalysisOptions};
use fakescan_models::PredictionResponse;
use serde::Serialize;
use tracing::{info, warn};

use super::{ExitCode, ModelArgs};
use crate::output::{print_json, ProgressBar};

#[derive(Args, Clone, Debug)]
pub struct ImageArgs {
    /// Image files or folders of images
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Recurse into subfolders
    #[arg(short, long)]
    pub recursive: bool,

    /// Stop at the first image that fails
    #[arg(long)]
    pub fail_fast: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Suppress the progress bar
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub models: ModelArgs,
}

/// Outcome for one image.
#[derive(Debug, Serialize)]
struct ImageResult {
    path: PathBuf,
    #[serde(flatten)]
    prediction: Option<PredictionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn run(args: &ImageArgs) -> Result<ExitCode> {
    let paths = args.models.checked_paths()?;
    let images = expand_inputs(&args.paths, args.recursive)?;
    if images.is_empty() {
        bail!("No images found in the given paths");
    }

    let service = build_service(&paths, VideoAnalysisOptions::default()).context("Cannot load the models")?;
    info!(images = images.len(), "Classifying images");

    let progress = ProgressBar::new(Some(images.len() as u64), args.quiet || images.len() == 1);
    let mut results = Vec::with_capacity(images.len());
    let mut exit = ExitCode::Success;

    for path in images {
        let (result, code) = classify(&service, &path);
        progress.inc();
        if code == ExitCode::Error && args.fail_fast {
            progress.abandon();
            bail!(
                "Failed on {}: {}",
                path.display(),
                result.error.unwrap_or_default()
            );
        }
        exit = exit.worst(code);
        results.push(result);
    }
    progress.finish("done");

    if args.json {
        print_json(&results)?;
    } else {
        for result in &results {
            print_result(result);
        }
    }
    Ok(exit)
}

fn classify(service: &DetectionService, path: &Path) -> (ImageResult, ExitCode) {
    match service.predict_image_path(path) {
        Ok(analysis) => {
            info!(
                path = %path.display(),
                faces = analysis.faces_found,
                score = analysis.classification.score,
                "Image classified"
            );
            let result = ImageResult {
                path: path.to_path_buf(),
                prediction: Some(PredictionResponse::from(&analysis.classification)),
                error: None,
            };
            (result, ExitCode::Success)
        }
        Err(e) => {
            let code = if matches!(e, MediaError::NoFaceDetected) {
                ExitCode::NoFace
            } else {
                warn!(path = %path.display(), error = %e, "Image failed");
                ExitCode::Error
            };
            let result = ImageResult {
                path: path.to_path_buf(),
                prediction: None,
                error: Some(e.to_string()),
            };
            (result, code)
        }
    }
}

fn print_result(result: &ImageResult) {
    match (&result.prediction, &result.error) {
        (Some(prediction), _) => println!(
            "{}: {} {} (raw score {:.6})",
            result.path.display(),
            prediction.verdict,
            prediction.confidence,
            prediction.score
        ),
        (None, Some(error)) => println!("{}: {}", result.path.display(), error),
        (None, None) => {}
    }
}

/// Files as given, folders expanded to the images inside them.
fn expand_inputs(inputs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for input in inputs {
        if input.is_dir() {
            images.extend(scan_media(input, MediaKind::Image, recursive));
        } else if input.is_file() {
            images.push(input.clone());
        } else {
            bail!("Image not found at {}", input.display());
        }
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_inputs_mixes_files_and_folders() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("b.png"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        let single = dir.path().join("a.jpg");

        let images = expand_inputs(&[dir.path().to_path_buf(), single.clone()], false).unwrap();
        assert_eq!(images.len(), 3);
        assert_eq!(images[2], single);
    }

    #[test]
    fn test_expand_inputs_rejects_missing_path() {
        let err = expand_inputs(&[PathBuf::from("/no/such/face.jpg")], false).unwrap_err();
        assert!(err.to_string().contains("Image not found"));
    }

    #[test]
    fn test_result_json_flattens_prediction() {
        let result = ImageResult {
            path: PathBuf::from("face.jpg"),
            prediction: Some(PredictionResponse::from(&fakescan_models::Classification::new(0.9))),
            error: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["verdict"], "REAL");
        assert_eq!(json["confidence"], "90.00%");
        assert!(json.get("error").is_none());
    }
}
