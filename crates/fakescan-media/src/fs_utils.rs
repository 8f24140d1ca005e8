//! Filesystem utilities for dataset tooling.
//!
//! Moves fall back to copy-and-delete when source and destination live on
//! different filesystems (EXDEV).

use std::fs;
use std::path::Path;

use crate::error::{MediaError, MediaResult};

/// Move a file from `src` to `dst`, creating the destination directory.
///
/// Tries a rename first; on a cross-device error copies to a temporary file
/// next to `dst`, renames it into place and removes `src`.
pub fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    ensure_parent(dst)?;

    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                "Cross-device rename detected, falling back to copy+delete: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_and_delete(src, dst)
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Copy a file from `src` to `dst`, creating the destination directory.
pub fn copy_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let dst = dst.as_ref();
    ensure_parent(dst)?;
    fs::copy(src.as_ref(), dst)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> MediaResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// EXDEV is error code 18 on Linux/macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

fn copy_and_delete(src: &Path, dst: &Path) -> MediaResult<()> {
    // Same directory as dst keeps the final rename on one filesystem
    let tmp_dst = dst.with_extension("tmp");

    fs::copy(src, &tmp_dst).map_err(|e| {
        tracing::error!(
            "Failed to copy file during cross-device move: {} -> {}: {}",
            src.display(),
            tmp_dst.display(),
            e
        );
        MediaError::from(e)
    })?;

    if let Err(e) = fs::rename(&tmp_dst, dst) {
        let _ = fs::remove_file(&tmp_dst);
        return Err(MediaError::from(e));
    }

    if let Err(e) = fs::remove_file(src) {
        tracing::warn!(
            "Moved {} but failed to remove the source: {}",
            src.display(),
            e
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_file_same_device() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.jpg");
        let dst = dir.path().join("train").join("real").join("a.jpg");
        fs::write(&src, b"pixels").unwrap();

        move_file(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).unwrap(), b"pixels");
    }

    #[test]
    fn test_copy_file_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("b.png");
        let dst = dir.path().join("out").join("b.png");
        fs::write(&src, b"data").unwrap();

        copy_file(&src, &dst).unwrap();

        assert!(src.exists());
        assert!(dst.exists());
    }

    #[test]
    fn test_move_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = move_file(dir.path().join("nope"), dir.path().join("x")).unwrap_err();
        assert!(matches!(err, MediaError::Io(_)));
    }

    #[test]
    fn test_cross_device_detection() {
        assert!(is_cross_device_error(&std::io::Error::from_raw_os_error(18)));
        assert!(!is_cross_device_error(&std::io::Error::from_raw_os_error(2)));
    }
}
