use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One deployable file: where it lands on the site and where its bytes live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Site path beginning with `/`, e.g. `/css/site.css`.
    pub destination_path: String,
    /// Local file holding the content.
    pub source_path: PathBuf,
}

impl FileEntry {
    pub fn new(destination_path: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            destination_path: destination_path.into(),
            source_path: source_path.into(),
        }
    }
}

/// A [`FileEntry`] with its content digest, computed once by the hasher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedFile {
    pub destination_path: String,
    pub source_path: PathBuf,
    /// Lowercase hex SHA-256 of the gzip-compressed content.
    pub digest: String,
}

impl HashedFile {
    pub fn new(entry: FileEntry, digest: String) -> Self {
        Self {
            destination_path: entry.destination_path,
            source_path: entry.source_path,
            digest,
        }
    }
}
