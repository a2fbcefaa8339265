//! Public directory scanning.
//!
//! Recursively walks a directory and produces one [`FileEntry`] per
//! regular file, with destination paths rooted at `/` and normalized to
//! forward slashes.

use std::io;
use std::path::Path;

use sitedeploy_transfer::{FileEntry, TransferError};
use tracing::warn;

/// Scans `root` recursively and returns entries sorted by destination path.
///
/// Symlinks to regular files are published under the link's path. Other
/// symlinks and special files are skipped with a warning.
pub fn scan_public_dir(root: &Path) -> Result<Vec<FileEntry>, TransferError> {
    let mut files = Vec::new();
    walk_dir(root, root, &mut files)?;
    files.sort_by(|a, b| a.destination_path.cmp(&b.destination_path));
    Ok(files)
}

fn walk_dir(root: &Path, current: &Path, files: &mut Vec<FileEntry>) -> Result<(), TransferError> {
    let io_err = |source: io::Error| TransferError::Io {
        path: current.to_path_buf(),
        source,
    };

    for entry in std::fs::read_dir(current).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_err)?;

        let is_file = if file_type.is_symlink() {
            match std::fs::metadata(&path) {
                Ok(target) if target.is_file() => true,
                Ok(_) => {
                    warn!(path = %path.display(), "skipping symlink to a non-regular file");
                    false
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping dangling symlink");
                    false
                }
            }
        } else if file_type.is_dir() {
            walk_dir(root, &path, files)?;
            false
        } else if file_type.is_file() {
            true
        } else {
            warn!(path = %path.display(), "skipping special file");
            false
        };

        if is_file {
            let rel_path = path.strip_prefix(root).map_err(|e| io_err(io::Error::other(e)))?;

            // Normalize to forward slashes.
            let rel_str = rel_path.to_string_lossy().replace('\\', "/");
            files.push(FileEntry::new(format!("/{rel_str}"), path));
        }
    }

    Ok(())
}
