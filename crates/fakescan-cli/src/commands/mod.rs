//! CLI command definitions and handlers.

pub mod dataset;
pub mod image;
pub mod video;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use fakescan_media::dataset::{default_worker_count, BatchOptions};
use fakescan_media::{locator_factory, FailurePolicy, LocatorFactory, MediaError, ModelPaths};

/// FakeScan - deepfake screening for face images and videos
#[derive(Parser)]
#[command(name = "fakescan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Classify the primary face of one or more images
    Image(image::ImageArgs),
    /// Screen a video by sampling frames and voting
    Video(video::VideoArgs),
    /// Crop the primary face of every image in a folder
    Crop(dataset::CropArgs),
    /// Extract face crops from every video under a folder
    VideoFaces(dataset::VideoFacesArgs),
    /// Shuffle a folder of images into train and validation folders
    Split(dataset::SplitArgs),
    /// Build a class-balanced train/validation dataset
    Balance(dataset::BalanceArgs),
    /// Record image fingerprints and report duplicates
    Dedup(dataset::DedupArgs),
    /// Run a JSON manifest of crop jobs in order
    Jobs(dataset::JobsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    /// No face in the image, or in any sampled video frame
    NoFace = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

impl ExitCode {
    /// Exit code for a failed command.
    pub fn for_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<MediaError>() {
            Some(MediaError::NoFaceDetected) => ExitCode::NoFace,
            _ => ExitCode::Error,
        }
    }

    /// The more severe of two outcomes: errors over missing faces over success.
    pub fn worst(self, other: Self) -> Self {
        match (self, other) {
            (ExitCode::Error, _) | (_, ExitCode::Error) => ExitCode::Error,
            (ExitCode::NoFace, _) | (_, ExitCode::NoFace) => ExitCode::NoFace,
            _ => ExitCode::Success,
        }
    }
}

/// Classifier and detector model locations.
#[derive(Args, Clone, Debug)]
pub struct ModelArgs {
    /// Binary classifier model (ONNX)
    #[arg(long, env = "FAKESCAN_MODEL", default_value = "models/deepfake_detector.onnx")]
    pub model: PathBuf,

    /// Model profile: preset name or JSON file (default: <model>.profile.json)
    #[arg(long, env = "FAKESCAN_PROFILE")]
    pub profile: Option<String>,

    #[command(flatten)]
    pub detector: DetectorArgs,
}

impl ModelArgs {
    /// Model paths, failing early when the classifier file is missing.
    pub fn checked_paths(&self) -> Result<ModelPaths> {
        if !self.model.is_file() {
            bail!(
                "Model not found at {}. Train or download a model first, or pass --model",
                self.model.display()
            );
        }
        Ok(ModelPaths::new(&self.model)
            .with_profile(self.profile.clone())
            .with_detector(self.detector.detector_model.clone()))
    }
}

/// Face detector model location.
#[derive(Args, Clone, Debug)]
pub struct DetectorArgs {
    /// YuNet face detector model (default: search the usual locations)
    #[arg(long, env = "FAKESCAN_DETECTOR_MODEL", value_name = "PATH")]
    pub detector_model: Option<PathBuf>,
}

impl DetectorArgs {
    /// Locator factory, probed once so a missing detector fails before any work.
    pub fn factory(&self) -> Result<LocatorFactory> {
        let factory = locator_factory(self.detector_model.clone());
        factory().context("Cannot load the face detector")?;
        Ok(factory)
    }
}

/// Worker pool and failure handling of batch commands.
#[derive(Args, Clone, Debug)]
pub struct BatchArgs {
    /// Worker threads (default: all cores but one)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Abort at the first failing item instead of recording it
    #[arg(long)]
    pub fail_fast: bool,

    /// Suppress the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

impl BatchArgs {
    pub fn options(&self) -> BatchOptions {
        BatchOptions {
            workers: self.workers.map_or_else(default_worker_count, usize::from),
            failure_policy: if self.fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::IsolatePerItem
            },
        }
    }
}

/// Parse a ratio in the open interval (0, 1).
pub fn parse_ratio(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{s}' is not a valid number"))?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not in the open interval (0, 1)"))
    }
}
