use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Server-side status of a hosting version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionStatus {
    VersionStatusUnspecified,
    Created,
    Finalized,
    Deleted,
    Abandoned,
    Expired,
    Cloning,
}

impl VersionStatus {
    /// Wire name of the status, as used in `updateMask=status` bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VersionStatusUnspecified => "VERSION_STATUS_UNSPECIFIED",
            Self::Created => "CREATED",
            Self::Finalized => "FINALIZED",
            Self::Deleted => "DELETED",
            Self::Abandoned => "ABANDONED",
            Self::Expired => "EXPIRED",
            Self::Cloning => "CLONING",
        }
    }
}

/// Why a release exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReleaseType {
    TypeUnspecified,
    Deploy,
    Rollback,
    SiteDisable,
}

/// How the edge treats a trailing slash on a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrailingSlashBehavior {
    TrailingSlashBehaviorUnspecified,
    Add,
    Remove,
}

/// Serving configuration attached to a version at creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServingConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HeaderRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirects: Vec<RedirectRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rewrites: Vec<RewriteRule>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub clean_urls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailing_slash_behavior: Option<TrailingSlashBehavior>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl ServingConfig {
    /// Returns true when no rule or flag is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Sets response headers for matching paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderRule {
    pub glob: String,
    pub headers: BTreeMap<String, String>,
}

/// Redirects matching paths to another location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectRule {
    pub glob: String,
    pub location: String,
    #[serde(default = "default_redirect_status")]
    pub status_code: u16,
}

fn default_redirect_status() -> u16 {
    301
}

/// Serves matching paths from another file, a function, or a Cloud Run service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub glob: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<CloudRunRewrite>,
}

/// Cloud Run target of a rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudRunRewrite {
    pub service_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}
