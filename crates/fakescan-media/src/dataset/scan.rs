//! Media file discovery.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

/// Image extensions accepted by the dataset tools (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Video extensions accepted by the dataset tools (lowercase).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    fn extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => IMAGE_EXTENSIONS,
            MediaKind::Video => VIDEO_EXTENSIONS,
        }
    }
}

/// Classify a path by its extension, case-insensitively.
pub fn media_kind(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Find files of `kind` under `dir`, sorted by path.
///
/// A missing directory yields an empty list and a warning. With
/// `recursive = false` only the direct children are listed.
pub fn scan_media(dir: &Path, kind: MediaKind, recursive: bool) -> Vec<PathBuf> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "Folder not found, skipping");
        return Vec::new();
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let extensions = kind.extensions();

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| extensions.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();

    files.sort();
    files
}

/// Images anywhere under each of `dirs`, concatenated in argument order.
pub fn collect_images(dirs: &[PathBuf]) -> Vec<PathBuf> {
    dirs.iter()
        .flat_map(|dir| scan_media(dir, MediaKind::Image, true))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_media_kind() {
        assert_eq!(media_kind(Path::new("a/b.JPG")), Some(MediaKind::Image));
        assert_eq!(media_kind(Path::new("clip.mkv")), Some(MediaKind::Video));
        assert_eq!(media_kind(Path::new("notes.txt")), None);
        assert_eq!(media_kind(Path::new("noext")), None);
    }

    #[test]
    fn test_scan_flat_and_recursive() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.jpg"));
        touch(&dir.path().join("b.PNG"));
        touch(&dir.path().join("c.txt"));
        touch(&dir.path().join("nested/d.jpeg"));
        touch(&dir.path().join("nested/e.mp4"));

        let flat = scan_media(dir.path(), MediaKind::Image, false);
        assert_eq!(flat.len(), 2);

        let deep = scan_media(dir.path(), MediaKind::Image, true);
        assert_eq!(deep.len(), 3);

        let videos = scan_media(dir.path(), MediaKind::Video, true);
        assert_eq!(videos, vec![dir.path().join("nested/e.mp4")]);
    }

    #[test]
    fn test_missing_folder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_media(&dir.path().join("missing"), MediaKind::Image, true).is_empty());
    }

    #[test]
    fn test_collect_images_skips_missing() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("one/a.jpg"));
        touch(&dir.path().join("two/b.jpg"));
        let files = collect_images(&[
            dir.path().join("one"),
            dir.path().join("missing"),
            dir.path().join("two"),
        ]);
        assert_eq!(files.len(), 2);
    }
}
