use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ReleaseType, ServingConfig, VersionStatus};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Body of `POST {site}/versions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateVersionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ServingConfig>,
}

/// Body of `POST {version}:populateFiles`: destination path to gzip digest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulateFilesRequest {
    pub files: BTreeMap<String, String>,
}

/// Body of `PATCH {version}?updateMask=status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateVersionStatusRequest {
    pub status: VersionStatus,
}

/// Body of `POST {site}/releases?versionName=...`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateReleaseRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Responses / resources
// ---------------------------------------------------------------------------

/// Reply to a populate call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulateFilesResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upload_required_hashes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
}

/// A hosting version as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResource {
    /// Full resource name, e.g. `sites/my-site/versions/abc123`.
    pub name: String,
    pub status: VersionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ServingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalize_time: Option<DateTime<Utc>>,
    /// int64 fields are encoded as JSON strings by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_bytes: Option<String>,
}

/// A release binding a version to a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseResource {
    /// Full resource name, e.g. `sites/my-site/releases/1700000000000000`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionResource>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub release_type: Option<ReleaseType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReleaseResource {
    /// Name of the released version, if the server included it.
    pub fn version_name(&self) -> Option<&str> {
        self.version.as_ref().map(|v| v.name.as_str())
    }
}

/// One page of `GET {site}/releases`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReleasesResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub releases: Vec<ReleaseResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// A hosting site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteResource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn populate_response_parses_required_hashes() {
        let json = r#"{"uploadRequiredHashes":["aa","bb"],"uploadUrl":"https://upload.example/v1"}"#;
        let resp: PopulateFilesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.upload_required_hashes, vec!["aa", "bb"]);
        assert_eq!(resp.upload_url.as_deref(), Some("https://upload.example/v1"));
    }

    #[test]
    fn populate_response_fully_cached() {
        let resp: PopulateFilesResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.upload_required_hashes.is_empty());
        assert!(resp.upload_url.is_none());
    }

    #[test]
    fn create_version_without_config_is_empty_object() {
        let json = serde_json::to_string(&CreateVersionRequest::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn release_exposes_version_name() {
        let json = r#"{
            "name": "sites/s/releases/1",
            "version": {"name": "sites/s/versions/v1", "status": "FINALIZED"},
            "type": "DEPLOY",
            "releaseTime": "2024-05-01T10:00:00Z"
        }"#;
        let release: ReleaseResource = serde_json::from_str(json).unwrap();
        assert_eq!(release.version_name(), Some("sites/s/versions/v1"));
        assert_eq!(release.release_type, Some(ReleaseType::Deploy));
        assert!(release.release_time.is_some());
    }

    #[test]
    fn status_update_body() {
        let body = UpdateVersionStatusRequest {
            status: VersionStatus::Finalized,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"status":"FINALIZED"}"#
        );
    }
}
