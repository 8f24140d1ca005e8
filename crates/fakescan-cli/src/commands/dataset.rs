//! Dataset commands - face cropping, splitting, balancing, dedup and job runs.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use fakescan_media::dataset::{
    balance_and_split, collect_images, crop_faces_in_dir, dataset_rng, dedup_dir, extract_faces_from_videos,
    materialize_balanced, run_crop_jobs, scan_media, split_files, BatchReport, HashStore, JobManifest, MediaKind,
    TransferMode, DEFAULT_MAX_FACES_PER_VIDEO,
};
use fakescan_media::video_backend;
use tracing::info;

use super::{parse_ratio, BatchArgs, DetectorArgs, ExitCode};
use crate::output::{print_batch_report, print_json, ProgressBar};

/// Default train share of `split`.
const SPLIT_RATIO: &str = "0.8";
/// Default train share of `balance`.
const BALANCED_SPLIT_RATIO: &str = "0.9";

#[derive(Args, Clone, Debug)]
pub struct CropArgs {
    /// Folder of images
    pub input: PathBuf,

    /// Folder receiving the face crops
    pub output: PathBuf,

    #[command(flatten)]
    pub detector: DetectorArgs,

    #[command(flatten)]
    pub batch: BatchArgs,
}

#[derive(Args, Clone, Debug)]
pub struct VideoFacesArgs {
    /// Folder searched recursively for videos
    pub input: PathBuf,

    /// Folder receiving the face crops
    pub output: PathBuf,

    /// Face crops saved per video
    #[arg(long, default_value_t = DEFAULT_MAX_FACES_PER_VIDEO)]
    pub max_faces: u64,

    #[command(flatten)]
    pub detector: DetectorArgs,

    #[command(flatten)]
    pub batch: BatchArgs,
}

#[derive(Args, Clone, Debug)]
pub struct SplitArgs {
    /// Folder of images to split
    pub source: PathBuf,

    /// Training folder
    #[arg(long)]
    pub train: PathBuf,

    /// Validation folder
    #[arg(long)]
    pub validation: PathBuf,

    /// Share of files going to training
    #[arg(long, default_value = SPLIT_RATIO, value_parser = parse_ratio)]
    pub ratio: f64,

    /// Move files instead of copying them
    #[arg(long = "move")]
    pub move_files: bool,

    /// Shuffle seed for a reproducible split
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Clone, Debug)]
pub struct BalanceArgs {
    /// Folders of REAL face images
    #[arg(long, required = true, num_args = 1..)]
    pub real: Vec<PathBuf>,

    /// Folders of FAKE face images
    #[arg(long, required = true, num_args = 1..)]
    pub fake: Vec<PathBuf>,

    /// Training root; receives real/ and fake/ subfolders
    #[arg(long)]
    pub train: PathBuf,

    /// Validation root; receives real/ and fake/ subfolders
    #[arg(long)]
    pub validation: PathBuf,

    /// Share of each class going to training
    #[arg(long, default_value = BALANCED_SPLIT_RATIO, value_parser = parse_ratio)]
    pub ratio: f64,

    /// Remove the training and validation roots first
    #[arg(long)]
    pub clean: bool,

    /// Move files instead of copying them
    #[arg(long = "move")]
    pub move_files: bool,

    /// Shuffle seed for a reproducible dataset
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Clone, Debug)]
pub struct DedupArgs {
    /// Folder searched recursively for images
    pub dir: PathBuf,

    /// Fingerprint store, one hex digest per line
    #[arg(long, default_value = "image_hashes.txt")]
    pub store: PathBuf,

    /// Delete duplicates from disk
    #[arg(long)]
    pub delete: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, Debug)]
pub struct JobsArgs {
    /// JSON manifest: {"jobs": [{"name", "input", "output"}]}
    pub manifest: PathBuf,

    #[command(flatten)]
    pub detector: DetectorArgs,

    #[command(flatten)]
    pub batch: BatchArgs,
}

fn transfer_mode(move_files: bool) -> TransferMode {
    if move_files {
        TransferMode::Move
    } else {
        TransferMode::Copy
    }
}

fn require_dir(dir: &Path, what: &str) -> Result<()> {
    if !dir.is_dir() {
        bail!("{what} folder not found at {}", dir.display());
    }
    Ok(())
}

fn batch_exit(report: &BatchReport) -> ExitCode {
    if report.has_errors() {
        ExitCode::Error
    } else {
        ExitCode::Success
    }
}

pub fn crop(args: &CropArgs) -> Result<ExitCode> {
    require_dir(&args.input, "Input")?;
    let factory = args.detector.factory()?;

    let total = scan_media(&args.input, MediaKind::Image, false).len() as u64;
    let progress = ProgressBar::new(Some(total), args.batch.quiet);
    let on_item = progress.item_callback();

    let report = crop_faces_in_dir(&args.input, &args.output, &factory, &args.batch.options(), Some(&on_item))
        .with_context(|| format!("Cropping faces in {} failed", args.input.display()))?;
    progress.finish("done");

    print_batch_report("Face crops", &report);
    Ok(batch_exit(&report))
}

pub fn video_faces(args: &VideoFacesArgs) -> Result<ExitCode> {
    require_dir(&args.input, "Input")?;
    let backend = video_backend()?;
    let factory = args.detector.factory()?;

    let total = scan_media(&args.input, MediaKind::Video, true).len() as u64;
    let progress = ProgressBar::new(Some(total), args.batch.quiet);
    let on_item = progress.item_callback();

    let report = extract_faces_from_videos(
        &args.input,
        &args.output,
        backend.as_ref(),
        &factory,
        args.max_faces,
        &args.batch.options(),
        Some(&on_item),
    )
    .with_context(|| format!("Extracting faces from {} failed", args.input.display()))?;
    progress.finish("done");

    print_batch_report("Video faces", &report);
    Ok(batch_exit(&report))
}

pub fn split(args: &SplitArgs) -> Result<ExitCode> {
    require_dir(&args.source, "Source")?;
    let files = scan_media(&args.source, MediaKind::Image, false);
    if files.is_empty() {
        println!("No images found in {}; nothing to do", args.source.display());
        return Ok(ExitCode::Success);
    }
    info!(files = files.len(), ratio = args.ratio, "Splitting images");

    let mut rng = dataset_rng(args.seed);
    let (train, validation) = split_files(
        files,
        args.ratio,
        &args.train,
        &args.validation,
        transfer_mode(args.move_files),
        &mut rng,
    )?;

    println!(
        "Split: {train} to {}, {validation} to {}",
        args.train.display(),
        args.validation.display()
    );
    Ok(ExitCode::Success)
}

pub fn balance(args: &BalanceArgs) -> Result<ExitCode> {
    let real = collect_images(&args.real);
    let fake = collect_images(&args.fake);

    let mut rng = dataset_rng(args.seed);
    let dataset = balance_and_split(real, fake, args.ratio, &mut rng)?;

    if args.clean {
        for root in [&args.train, &args.validation] {
            if root.exists() {
                std::fs::remove_dir_all(root).with_context(|| format!("Cannot clean {}", root.display()))?;
                info!(dir = %root.display(), "Removed previous dataset folder");
            }
        }
    }

    materialize_balanced(&dataset, &args.train, &args.validation, transfer_mode(args.move_files))?;

    println!(
        "Balanced dataset: {} per class; train {} + {}, validation {} + {} (real + fake)",
        dataset.per_class,
        dataset.real.train.len(),
        dataset.fake.train.len(),
        dataset.real.validation.len(),
        dataset.fake.validation.len()
    );
    Ok(ExitCode::Success)
}

pub fn dedup(args: &DedupArgs) -> Result<ExitCode> {
    require_dir(&args.dir, "Image")?;
    let mut store = HashStore::open(&args.store)
        .with_context(|| format!("Cannot open fingerprint store {}", args.store.display()))?;
    let known = store.len();

    let report = dedup_dir(&args.dir, &mut store, args.delete)?;

    if args.json {
        print_json(&report)?;
    } else {
        println!(
            "Dedup: {} scanned, {} new, {} duplicates{}, {} unreadable ({} fingerprints known before)",
            report.scanned,
            report.unique,
            report.duplicates.len(),
            if args.delete { " deleted" } else { "" },
            report.unreadable.len(),
            known
        );
        for duplicate in &report.duplicates {
            println!("duplicate: {}", duplicate.display());
        }
    }
    Ok(ExitCode::Success)
}

pub fn jobs(args: &JobsArgs) -> Result<ExitCode> {
    let manifest = JobManifest::load(&args.manifest)
        .with_context(|| format!("Cannot read job manifest {}", args.manifest.display()))?;
    if manifest.jobs.is_empty() {
        println!("Manifest has no jobs");
        return Ok(ExitCode::Success);
    }
    let factory = args.detector.factory()?;

    let reports = run_crop_jobs(&manifest, &factory, &args.batch.options())?;

    let mut exit = ExitCode::Success;
    for job in &reports {
        print_batch_report(&job.name, &job.report);
        exit = exit.worst(batch_exit(&job.report));
    }
    Ok(exit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fakescan_media::dataset::ItemError;

    #[test]
    fn test_batch_exit_flags_item_errors() {
        let mut report = BatchReport::default();
        assert_eq!(batch_exit(&report), ExitCode::Success);

        report.errors.push(ItemError {
            path: PathBuf::from("a.jpg"),
            message: "boom".into(),
        });
        assert_eq!(batch_exit(&report), ExitCode::Error);
    }

    #[test]
    fn test_transfer_mode() {
        assert_eq!(transfer_mode(true), TransferMode::Move);
        assert_eq!(transfer_mode(false), TransferMode::Copy);
    }
}
