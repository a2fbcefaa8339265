use std::path::Path;

use crate::TransferError;

/// Validates a site destination path.
///
/// Rejects:
/// - Empty paths or paths not starting with `/`
/// - Backslash separators
/// - Empty, `.` or `..` segments (`//`, `/./`, `/../`)
/// - A trailing `/` (destinations name files, not directories)
pub fn validate_destination_path(path: &str) -> Result<(), TransferError> {
    if path.is_empty() {
        return Err(TransferError::InvalidPath("empty path".into()));
    }

    if !path.starts_with('/') {
        return Err(TransferError::InvalidPath(format!(
            "path must start with '/': {path}"
        )));
    }

    if path.contains('\\') {
        return Err(TransferError::InvalidPath(format!(
            "backslash not allowed: {path}"
        )));
    }

    for segment in path[1..].split('/') {
        match segment {
            "" => {
                return Err(TransferError::InvalidPath(format!(
                    "empty path segment not allowed: {path}"
                )));
            }
            "." | ".." => {
                return Err(TransferError::InvalidPath(format!(
                    "relative segment not allowed: {path}"
                )));
            }
            _ => {}
        }
    }

    Ok(())
}

/// Checks that `source` exists and is a regular file.
pub fn validate_source_file(source: &Path) -> Result<(), TransferError> {
    match std::fs::metadata(source) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(TransferError::Validation(format!(
            "source is not a regular file: {}",
            source.display()
        ))),
        Err(_) => Err(TransferError::Validation(format!(
            "source file does not exist: {}",
            source.display()
        ))),
    }
}
