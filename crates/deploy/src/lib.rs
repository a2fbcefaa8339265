//! Site deploy flow: hash, populate, upload, finalize, release.
//!
//! This crate implements the **business logic** for publishing a set of
//! local files as a new hosting version. It has no transport of its own:
//! callers inject a [`HostingApi`](sitedeploy_hosting::HostingApi), usually
//! the reqwest-backed `HttpHostingClient`.
//!
//! # Pipeline
//!
//! 1. **Validate**: destination paths, duplicates, source files
//! 2. **Hash**: gzip each file with pinned settings and SHA-256 the result
//! 3. **Create**: open a new version, optionally with a serving config
//! 4. **Populate**: send the manifest; the server names the digests it lacks
//! 5. **Upload**: send only the missing content, bounded and retried
//! 6. **Finalize**: make the version immutable
//! 7. **Release**: point the site at the version

pub mod config;
pub mod deploy;
pub mod error;
pub mod scanner;
pub mod types;
pub mod upload;
pub mod version;

#[cfg(test)]
mod mock;

// Re-export primary types for convenience.
pub use config::{DeployOptions, RetryPolicy};
pub use deploy::Deployer;
pub use error::{DeployError, DeployPhase, UploadFailure};
pub use scanner::scan_public_dir;
pub use types::{
    DeployEvent, DeploymentResult, Release, UploadStatus, UploadSummary, UploadTask,
};
pub use upload::UploadOrchestrator;
pub use version::{Version, VersionLifecycle, VersionPhase};
