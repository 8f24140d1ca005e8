//! Train/validation splitting and class balancing.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{copy_file, move_file};

/// Default train share when organizing a single folder.
pub const DEFAULT_SPLIT_RATIO: f64 = 0.8;

/// Default train share when building a balanced dataset.
pub const DEFAULT_BALANCED_SPLIT_RATIO: f64 = 0.9;

/// How files reach their destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Copy,
    Move,
}

/// Files assigned to each side of a split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitPlan {
    pub train: Vec<PathBuf>,
    pub validation: Vec<PathBuf>,
}

impl SplitPlan {
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// REAL and FAKE splits of equal size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BalancedDataset {
    pub real: SplitPlan,
    pub fake: SplitPlan,
    /// Samples kept per class
    pub per_class: usize,
}

/// Seeded RNG, or one seeded from the OS when `seed` is `None`.
pub fn dataset_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn validate_ratio(ratio: f64) -> MediaResult<()> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(MediaError::invalid_dataset(format!(
            "split ratio must be within [0, 1], got {}",
            ratio
        )));
    }
    Ok(())
}

/// Shuffle `files` and put the first `floor(len * ratio)` into train.
pub fn split_by_ratio(mut files: Vec<PathBuf>, ratio: f64, rng: &mut StdRng) -> MediaResult<SplitPlan> {
    validate_ratio(ratio)?;
    files.shuffle(rng);
    let split_point = (files.len() as f64 * ratio).floor() as usize;
    let validation = files.split_off(split_point);
    Ok(SplitPlan {
        train: files,
        validation,
    })
}

/// Undersample both classes to the smaller one, then split each by `ratio`.
///
/// Fails when either class has no files.
pub fn balance_and_split(
    mut real: Vec<PathBuf>,
    mut fake: Vec<PathBuf>,
    ratio: f64,
    rng: &mut StdRng,
) -> MediaResult<BalancedDataset> {
    validate_ratio(ratio)?;
    if real.is_empty() || fake.is_empty() {
        return Err(MediaError::invalid_dataset(format!(
            "both classes need images (real: {}, fake: {})",
            real.len(),
            fake.len()
        )));
    }

    let per_class = real.len().min(fake.len());
    info!(real = real.len(), fake = fake.len(), per_class, "Balancing classes");

    real.shuffle(rng);
    fake.shuffle(rng);
    real.truncate(per_class);
    fake.truncate(per_class);

    Ok(BalancedDataset {
        real: split_by_ratio(real, ratio, rng)?,
        fake: split_by_ratio(fake, ratio, rng)?,
        per_class,
    })
}

fn transfer(files: &[PathBuf], dest_dir: &Path, mode: TransferMode) -> MediaResult<usize> {
    std::fs::create_dir_all(dest_dir)
        .map_err(|e| MediaError::output_failed(dest_dir, e.to_string()))?;

    for file in files {
        let Some(name) = file.file_name() else {
            warn!(path = %file.display(), "Skipping path without a file name");
            continue;
        };
        let dest = dest_dir.join(name);
        match mode {
            TransferMode::Copy => copy_file(file, &dest)?,
            TransferMode::Move => move_file(file, &dest)?,
        }
    }
    Ok(files.len())
}

/// Place a plan's files into `train_dir` and `validation_dir`.
pub fn apply_split(
    plan: &SplitPlan,
    train_dir: &Path,
    validation_dir: &Path,
    mode: TransferMode,
) -> MediaResult<(usize, usize)> {
    let train = transfer(&plan.train, train_dir, mode)?;
    let validation = transfer(&plan.validation, validation_dir, mode)?;
    info!(
        train,
        validation,
        train_dir = %train_dir.display(),
        validation_dir = %validation_dir.display(),
        "Split applied"
    );
    Ok((train, validation))
}

/// Shuffle, split and place `files` in one call.
pub fn split_files(
    files: Vec<PathBuf>,
    ratio: f64,
    train_dir: &Path,
    validation_dir: &Path,
    mode: TransferMode,
    rng: &mut StdRng,
) -> MediaResult<(usize, usize)> {
    if files.is_empty() {
        warn!("No files to split");
        return Ok((0, 0));
    }
    let plan = split_by_ratio(files, ratio, rng)?;
    apply_split(&plan, train_dir, validation_dir, mode)
}

/// Copy a balanced dataset into `<train_root>/{real,fake}` and
/// `<validation_root>/{real,fake}`.
pub fn materialize_balanced(
    dataset: &BalancedDataset,
    train_root: &Path,
    validation_root: &Path,
    mode: TransferMode,
) -> MediaResult<()> {
    for (label, plan) in [("real", &dataset.real), ("fake", &dataset.fake)] {
        apply_split(plan, &train_root.join(label), &validation_root.join(label), mode)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    fn paths(prefix: &str, n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("{prefix}{i}.jpg"))).collect()
    }

    #[test]
    fn test_split_uses_floor() {
        let mut rng = dataset_rng(Some(7));
        let plan = split_by_ratio(paths("a", 10), 0.8, &mut rng).unwrap();
        assert_eq!((plan.train.len(), plan.validation.len()), (8, 2));

        let plan = split_by_ratio(paths("a", 7), 0.9, &mut rng).unwrap();
        assert_eq!((plan.train.len(), plan.validation.len()), (6, 1));
    }

    #[test]
    fn test_split_keeps_every_file_once() {
        let mut rng = dataset_rng(Some(1));
        let files = paths("f", 25);
        let plan = split_by_ratio(files.clone(), 0.8, &mut rng).unwrap();
        let all: HashSet<_> = plan.train.iter().chain(plan.validation.iter()).cloned().collect();
        assert_eq!(all.len(), 25);
        assert_eq!(all, files.into_iter().collect());
    }

    #[test]
    fn test_seeded_split_is_reproducible() {
        let a = split_by_ratio(paths("x", 30), 0.5, &mut dataset_rng(Some(42))).unwrap();
        let b = split_by_ratio(paths("x", 30), 0.5, &mut dataset_rng(Some(42))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_ratio() {
        assert!(split_by_ratio(paths("a", 3), 1.5, &mut dataset_rng(Some(0))).is_err());
    }

    #[test]
    fn test_balance_undersamples() {
        let mut rng = dataset_rng(Some(3));
        let dataset = balance_and_split(paths("r", 40), paths("f", 10), 0.9, &mut rng).unwrap();
        assert_eq!(dataset.per_class, 10);
        assert_eq!(dataset.real.len(), 10);
        assert_eq!(dataset.fake.len(), 10);
        assert_eq!(dataset.real.train.len(), 9);
        assert_eq!(dataset.fake.validation.len(), 1);
    }

    #[test]
    fn test_balance_empty_class_fails() {
        let err = balance_and_split(paths("r", 4), Vec::new(), 0.9, &mut dataset_rng(None)).unwrap_err();
        assert!(matches!(err, MediaError::InvalidDataset(_)));
    }

    #[test]
    fn test_split_files_moves() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        let mut files = Vec::new();
        for i in 0..5 {
            let f = src.join(format!("{i}.jpg"));
            fs::write(&f, b"x").unwrap();
            files.push(f);
        }

        let train = dir.path().join("train/fake");
        let validation = dir.path().join("validation/fake");
        let (t, v) = split_files(files, 0.8, &train, &validation, TransferMode::Move, &mut dataset_rng(Some(9))).unwrap();

        assert_eq!((t, v), (4, 1));
        assert_eq!(fs::read_dir(&train).unwrap().count(), 4);
        assert_eq!(fs::read_dir(&validation).unwrap().count(), 1);
        assert_eq!(fs::read_dir(&src).unwrap().count(), 0);
    }

    #[test]
    fn test_materialize_balanced_copies() {
        let dir = tempfile::tempdir().unwrap();
        let mut real = Vec::new();
        let mut fake = Vec::new();
        for i in 0..4 {
            let r = dir.path().join(format!("r{i}.jpg"));
            let f = dir.path().join(format!("f{i}.jpg"));
            fs::write(&r, b"r").unwrap();
            fs::write(&f, b"f").unwrap();
            real.push(r);
            fake.push(f);
        }

        let dataset = balance_and_split(real, fake, 0.5, &mut dataset_rng(Some(5))).unwrap();
        let train_root = dir.path().join("final_train");
        let validation_root = dir.path().join("final_validation");
        materialize_balanced(&dataset, &train_root, &validation_root, TransferMode::Copy).unwrap();

        assert_eq!(fs::read_dir(train_root.join("real")).unwrap().count(), 2);
        assert_eq!(fs::read_dir(validation_root.join("fake")).unwrap().count(), 2);
        assert!(dir.path().join("r0.jpg").exists());
    }
}
