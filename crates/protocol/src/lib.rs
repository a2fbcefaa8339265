//! Wire types for the hosting REST API.
//!
//! Field names follow the API's camelCase JSON; enums use its
//! SCREAMING_SNAKE_CASE values.

pub mod envelope;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use envelope::{ApiErrorDetail, ErrorEnvelope};
pub use messages::{
    CreateReleaseRequest, CreateVersionRequest, ListReleasesResponse, PopulateFilesRequest,
    PopulateFilesResponse, ReleaseResource, SiteResource, UpdateVersionStatusRequest,
    VersionResource,
};
pub use types::{
    CloudRunRewrite, HeaderRule, RedirectRule, ReleaseType, RewriteRule, ServingConfig,
    TrailingSlashBehavior, VersionStatus,
};
