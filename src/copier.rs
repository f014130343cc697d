use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use indicatif::ProgressBar;
use walkdir::WalkDir;

use crate::error::DeployError;

/// ENOSPC on Unix
const DISK_FULL_OS_ERROR: i32 = 28;

fn is_disk_full(e: &io::Error) -> bool {
    e.raw_os_error() == Some(DISK_FULL_OS_ERROR)
}

/// Create a directory and its parents
pub fn create_dir(path: &Path) -> Result<(), DeployError> {
    fs::create_dir_all(path).map_err(|e| {
        if is_disk_full(&e) {
            return DeployError::DiskFull {
                path: path.to_path_buf(),
            };
        }
        DeployError::CreateDirFailed {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

/// Copy a single file from src to dst
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, DeployError> {
    if let Some(parent) = dst.parent() {
        if !parent.exists() {
            create_dir(parent)?;
        }
    }

    fs::copy(src, dst).map_err(|e| {
        if is_disk_full(&e) {
            return DeployError::DiskFull {
                path: dst.to_path_buf(),
            };
        }
        DeployError::CopyFailed {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            source: e,
        }
    })
}

/// Copy directory recursively, returns (files_copied, bytes_copied)
///
/// Every file is copied verbatim, including empty directories, so the
/// destination mirrors the source tree exactly.
pub fn copy_directory(
    src: &Path,
    dst: &Path,
    shutdown: &AtomicBool,
    progress: Option<&ProgressBar>,
) -> Result<(u64, u64), DeployError> {
    let mut files_copied = 0u64;
    let mut bytes_copied = 0u64;

    create_dir(dst)?;

    for entry in WalkDir::new(src).follow_links(true).min_depth(1) {
        if shutdown.load(Ordering::Relaxed) {
            return Err(DeployError::Cancelled);
        }

        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            DeployError::CopyFailed {
                src: path,
                dst: dst.to_path_buf(),
                source: e.into(),
            }
        })?;

        let src_path = entry.path();
        let relative = src_path.strip_prefix(src).unwrap_or(src_path);
        let dst_path = dst.join(relative);

        if entry.file_type().is_dir() {
            create_dir(&dst_path)?;
            continue;
        }

        if !entry.file_type().is_file() {
            continue;
        }

        let bytes = copy_file(src_path, &dst_path)?;
        files_copied += 1;
        bytes_copied += bytes;

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    Ok((files_copied, bytes_copied))
}

/// Remove a directory tree if it exists. Returns whether anything was removed.
pub fn remove_directory(path: &Path) -> Result<bool, DeployError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(DeployError::RemoveDirFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
