//! Deploy error types.

use std::fmt;

use sitedeploy_hosting::ApiError;
use sitedeploy_transfer::TransferError;

use crate::version::VersionPhase;

/// Pipeline step in which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeployPhase {
    Validate,
    Hash,
    Create,
    Populate,
    Upload,
    Finalize,
    Release,
    /// Read-only remote lookups: version status, release history.
    Inspect,
    Done,
}

impl DeployPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Hash => "hash",
            Self::Create => "create",
            Self::Populate => "populate",
            Self::Upload => "upload",
            Self::Finalize => "finalize",
            Self::Release => "release",
            Self::Inspect => "inspect",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for DeployPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file that could not be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub path: String,
    pub attempts: u32,
    pub error: String,
}

/// Errors produced during a site deployment.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("cannot {operation} a version in phase {phase}")]
    InvalidState {
        operation: DeployPhase,
        phase: VersionPhase,
    },

    #[error("{phase} failed: {source}")]
    Remote {
        phase: DeployPhase,
        #[source]
        source: ApiError,
    },

    #[error("upload failed for {} file(s): {}", failures.len(), summarize(failures))]
    UploadFailed { failures: Vec<UploadFailure> },

    #[error("I/O error: {0}")]
    Io(#[source] TransferError),

    #[error("encoding error: {0}")]
    Encoding(#[source] TransferError),

    #[error("background task failed: {0}")]
    Task(String),

    #[error("cancelled during {phase}")]
    Cancelled { phase: DeployPhase },
}

fn summarize(failures: &[UploadFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.path, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<TransferError> for DeployError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::InvalidPath(_) | TransferError::Validation(_) => {
                Self::Validation(err.to_string())
            }
            TransferError::Io { .. } => Self::Io(err),
            TransferError::Encoding { .. } => Self::Encoding(err),
        }
    }
}

impl DeployError {
    /// Pipeline step the error is attributed to.
    pub fn phase(&self) -> DeployPhase {
        match self {
            Self::Remote { phase, .. } | Self::Cancelled { phase } => *phase,
            Self::InvalidState { operation, .. } => *operation,
            Self::UploadFailed { .. } => DeployPhase::Upload,
            Self::Validation(_) => DeployPhase::Validate,
            Self::Io(_) | Self::Encoding(_) | Self::Task(_) => DeployPhase::Hash,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Destination paths that failed to upload, empty for other errors.
    pub fn failed_paths(&self) -> Vec<&str> {
        match self {
            Self::UploadFailed { failures } => failures.iter().map(|f| f.path.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}
