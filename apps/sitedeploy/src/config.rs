//! Deploy configuration file.
//!
//! Configuration is stored as TOML next to the site:
//!
//! ```toml
//! site_id = "blog"
//! public_dir = "public"
//!
//! [hosting]
//! cleanUrls = true
//!
//! [deploy]
//! concurrency = 8
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use sitedeploy_deploy::DeployOptions;
use sitedeploy_hosting::ClientConfig;
use sitedeploy_protocol::ServingConfig;

/// Deploy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Hosting site to deploy to.
    pub site_id: String,

    /// Directory whose files are published. Relative paths resolve against
    /// the config file's directory.
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,

    /// Release message, overridden by `--message`.
    #[serde(default)]
    pub message: Option<String>,

    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default)]
    pub client: ClientConfig,

    /// Serving rules attached to every new version.
    #[serde(default)]
    pub hosting: ServingConfig,

    #[serde(default)]
    pub deploy: DeployOptions,
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_token_env() -> String {
    "SITEDEPLOY_TOKEN".into()
}

impl Config {
    /// Loads and validates the config at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;

        if config.site_id.trim().is_empty() {
            bail!("site_id must not be empty");
        }
        if config.public_dir.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.public_dir = base.join(&config.public_dir);
        }

        tracing::debug!(path = %path.display(), site = %config.site_id, "configuration loaded");
        Ok(config)
    }

    /// Reads the bearer token from [`Config::token_env`].
    pub fn token(&self) -> anyhow::Result<String> {
        match std::env::var(&self.token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => bail!("environment variable {} is not set", self.token_env),
        }
    }

    /// Serving config to send, or none when no rule is set.
    pub fn serving_config(&self) -> Option<ServingConfig> {
        (!self.hosting.is_empty()).then(|| self.hosting.clone())
    }
}
