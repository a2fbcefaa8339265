use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://firebasehosting.googleapis.com/v1beta1";

/// Settings for [`HttpHostingClient`](crate::HttpHostingClient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API root without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// When set, site resources are addressed as `projects/{id}/sites/{site}`.
    #[serde(default)]
    pub project_id: Option<String>,

    /// Whole-request timeout in seconds (connect + body).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_id: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resource name of a site.
    pub fn site_resource(&self, site_id: &str) -> String {
        match &self.project_id {
            Some(project) => format!("projects/{project}/sites/{site_id}"),
            None => format!("sites/{site_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.site_resource("blog"), "sites/blog");
    }

    #[test]
    fn project_scoped_site() {
        let config = ClientConfig {
            project_id: Some("acme".into()),
            ..Default::default()
        };
        assert_eq!(config.site_resource("blog"), "projects/acme/sites/blog");
    }
}
