//! Content fingerprints and the persistent hash store used to drop duplicate
//! images when collecting datasets.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::DynamicImage;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::scan::{scan_media, MediaKind};
use crate::error::{MediaError, MediaResult};

/// Side of the grayscale thumbnail that gets hashed.
pub const FINGERPRINT_SIZE: u32 = 128;

/// SHA-256 (lowercase hex) of the image as 8-bit grayscale, resized to
/// 128x128.
///
/// Re-encodes and small rescales of the same picture usually collide.
pub fn image_fingerprint(image: &DynamicImage) -> String {
    let gray = image.to_luma8();
    let thumb = imageops::resize(&gray, FINGERPRINT_SIZE, FINGERPRINT_SIZE, FilterType::Triangle);
    let digest = Sha256::digest(thumb.as_raw());
    format!("{:x}", digest)
}

pub fn fingerprint_file(path: &Path) -> MediaResult<String> {
    let image = image::open(path).map_err(|e| MediaError::source_unreadable(path, e.to_string()))?;
    Ok(image_fingerprint(&image))
}

/// Newline-separated hex digests of every image accepted so far.
#[derive(Debug)]
pub struct HashStore {
    path: PathBuf,
    hashes: HashSet<String>,
}

impl HashStore {
    /// Load the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> MediaResult<Self> {
        let path = path.into();
        let hashes = if path.exists() {
            fs::read_to_string(&path)?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            HashSet::new()
        };
        debug!(path = %path.display(), hashes = hashes.len(), "Hash store loaded");
        Ok(Self { path, hashes })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    /// Record `hash`, appending it to the file.
    ///
    /// Returns `false` without touching the file when it was already known.
    pub fn insert(&mut self, hash: &str) -> MediaResult<bool> {
        if self.hashes.contains(hash) {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", hash)?;
        self.hashes.insert(hash.to_string());
        Ok(true)
    }
}

/// Outcome of a dedup pass over a folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub scanned: u64,
    /// Images newly added to the store
    pub unique: u64,
    pub duplicates: Vec<PathBuf>,
    /// Images that could not be decoded
    pub unreadable: Vec<PathBuf>,
}

/// Fingerprint every image under `dir` against `store`.
///
/// New images are recorded in the store; known ones are reported and, with
/// `delete_duplicates`, removed from disk.
pub fn dedup_dir(dir: &Path, store: &mut HashStore, delete_duplicates: bool) -> MediaResult<DedupReport> {
    let mut report = DedupReport::default();

    for path in scan_media(dir, MediaKind::Image, true) {
        report.scanned += 1;
        let hash = match fingerprint_file(&path) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot fingerprint image");
                report.unreadable.push(path);
                continue;
            }
        };

        if store.insert(&hash)? {
            report.unique += 1;
            continue;
        }

        debug!(path = %path.display(), "Duplicate image");
        if delete_duplicates {
            fs::remove_file(&path)?;
        }
        report.duplicates.push(path);
    }

    info!(
        scanned = report.scanned,
        unique = report.unique,
        duplicates = report.duplicates.len(),
        store = %store.path().display(),
        "Dedup finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(w: u32, h: u32, shift: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, shift])
        }))
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let hash = image_fingerprint(&gradient(64, 64, 0));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_distinguishes_images() {
        assert_eq!(image_fingerprint(&gradient(64, 64, 0)), image_fingerprint(&gradient(64, 64, 0)));
        assert_ne!(image_fingerprint(&gradient(64, 64, 0)), image_fingerprint(&gradient(64, 32, 0)));
    }

    #[test]
    fn test_store_persists_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashes.txt");

        let mut store = HashStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert!(store.insert("abc").unwrap());
        assert!(!store.insert("abc").unwrap());
        assert!(store.insert("def").unwrap());

        assert_eq!(fs::read_to_string(&path).unwrap(), "abc\ndef\n");
        let reopened = HashStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert!(reopened.contains("def"));
    }

    #[test]
    fn test_dedup_dir_reports_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        fs::create_dir_all(&images).unwrap();
        gradient(40, 40, 1).save(images.join("a.png")).unwrap();
        gradient(40, 40, 1).save(images.join("b.png")).unwrap();
        gradient(40, 40, 200).save(images.join("c.png")).unwrap();
        fs::write(images.join("broken.jpg"), b"not an image").unwrap();

        let mut store = HashStore::open(dir.path().join("hashes.txt")).unwrap();
        let report = dedup_dir(&images, &mut store, true).unwrap();

        assert_eq!(report.scanned, 4);
        assert_eq!(report.unique, 2);
        assert_eq!(report.duplicates, vec![images.join("b.png")]);
        assert_eq!(report.unreadable.len(), 1);
        assert!(!images.join("b.png").exists());
        assert!(images.join("a.png").exists());
    }
}
