//! Content hashing, gzip encoding and manifest building.
//!
//! Everything here is local: no network access. The hosting API addresses
//! file content by the SHA-256 of its *gzip-compressed* bytes, so the
//! encoder parameters are pinned in [`digest`].

mod digest;
mod manifest;
mod types;
mod validation;

use std::path::PathBuf;

pub use digest::{
    GZIP_LEVEL, GZIP_OS_UNIX, compress_bytes, compress_file, content_digest, digest_bytes,
    hash_entries,
};
pub use manifest::Manifest;
pub use types::{FileEntry, HashedFile};
pub use validation::{validate_destination_path, validate_source_file};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("gzip encoding failed for {path}: {source}")]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid destination path: {0}")]
    InvalidPath(String),

    #[error("invalid manifest: {0}")]
    Validation(String),
}

impl TransferError {
    /// Returns true for errors caused by bad caller input rather than the filesystem.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidPath(_) | Self::Validation(_))
    }
}
