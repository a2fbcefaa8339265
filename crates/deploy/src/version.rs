//! Remote version lifecycle.
//!
//! ```text
//! create -> Created -> populate -> Populated -> finalize -> Finalized -> release -> Released
//! Created | Populated | Finalized -> abandon -> Abandoned
//! ```
//!
//! A [`Version`] changes phase only through [`VersionLifecycle`]. A failed
//! remote call leaves the phase where it was.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use sitedeploy_hosting::{ApiError, HostingApi};
use sitedeploy_protocol::{
    CreateReleaseRequest, CreateVersionRequest, PopulateFilesRequest, ServingConfig,
    VersionStatus,
};
use sitedeploy_transfer::Manifest;
use tracing::{debug, info, warn};

use crate::config::DeployOptions;
use crate::error::{DeployError, DeployPhase};
use crate::types::Release;

/// Local view of a version's position in the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionPhase {
    Created,
    Populated,
    Finalized,
    Released,
    Abandoned,
}

impl VersionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Populated => "POPULATED",
            Self::Finalized => "FINALIZED",
            Self::Released => "RELEASED",
            Self::Abandoned => "ABANDONED",
        }
    }

    /// No transition leaves a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Released | Self::Abandoned)
    }
}

impl fmt::Display for VersionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hosting version created by this process.
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    name: String,
    site_id: String,
    phase: VersionPhase,
    hosting_config: Option<ServingConfig>,
    upload_url: Option<String>,
    remote_status: VersionStatus,
}

impl Version {
    /// Server resource name, `sites/{site}/versions/{id}`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn phase(&self) -> VersionPhase {
        self.phase
    }

    pub fn hosting_config(&self) -> Option<&ServingConfig> {
        self.hosting_config.as_ref()
    }

    /// Upload endpoint learned from populate.
    pub fn upload_url(&self) -> Option<&str> {
        self.upload_url.as_deref()
    }

    /// Last status reported by the server.
    pub fn remote_status(&self) -> VersionStatus {
        self.remote_status
    }

    fn require(
        &self,
        operation: DeployPhase,
        allowed: &[VersionPhase],
    ) -> Result<(), DeployError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(DeployError::InvalidState {
                operation,
                phase: self.phase,
            })
        }
    }
}

/// Runs `fut` under `limit`; expiry becomes [`ApiError::Timeout`].
pub(crate) async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Timeout(limit)),
    }
}

fn remote(phase: DeployPhase) -> impl FnOnce(ApiError) -> DeployError {
    move |source| DeployError::Remote { phase, source }
}

/// Drives [`Version`] transitions against the hosting API.
pub struct VersionLifecycle<'a> {
    api: &'a dyn HostingApi,
    options: &'a DeployOptions,
}

impl<'a> VersionLifecycle<'a> {
    pub fn new(api: &'a dyn HostingApi, options: &'a DeployOptions) -> Self {
        Self { api, options }
    }

    /// Creates a version on `site_id`. One remote call, no retry.
    pub async fn create(
        &self,
        site_id: &str,
        hosting_config: Option<ServingConfig>,
    ) -> Result<Version, DeployError> {
        if site_id.trim().is_empty() {
            return Err(DeployError::Validation("site id is empty".into()));
        }

        let request = CreateVersionRequest {
            config: hosting_config.clone(),
        };
        let resource = with_timeout(
            self.options.call_timeout(),
            self.api.create_version(site_id, &request),
        )
        .await
        .map_err(remote(DeployPhase::Create))?;

        info!(site = %site_id, version = %resource.name, "version created");

        Ok(Version {
            name: resource.name,
            site_id: site_id.to_string(),
            phase: VersionPhase::Created,
            hosting_config,
            upload_url: None,
            remote_status: resource.status,
        })
    }

    /// Sends the manifest and returns the destination paths whose content
    /// the server lacks.
    ///
    /// Large manifests go out in batches of `populate_batch_size`; the
    /// needed sets are unioned. Allowed again after a successful populate.
    pub async fn populate(
        &self,
        version: &mut Version,
        manifest: &Manifest,
    ) -> Result<BTreeSet<String>, DeployError> {
        version.require(DeployPhase::Populate, &[VersionPhase::Created, VersionPhase::Populated])?;

        let mut required = BTreeSet::new();
        let mut upload_url = None;
        let batches = manifest.digest_batches(self.options.populate_batch_size);
        let batch_count = batches.len();

        for (i, files) in batches.into_iter().enumerate() {
            debug!(
                version = %version.name,
                batch = i + 1,
                of = batch_count,
                files = files.len(),
                "populating files"
            );
            let request = PopulateFilesRequest { files };
            let response = with_timeout(
                self.options.call_timeout(),
                self.api.populate_files(&version.name, &request),
            )
            .await
            .map_err(remote(DeployPhase::Populate))?;

            required.extend(response.upload_required_hashes);
            if response.upload_url.is_some() {
                upload_url = response.upload_url;
            }
        }

        let (needed, unknown) = manifest.paths_for_digests(&required);
        if !unknown.is_empty() {
            warn!(
                version = %version.name,
                count = unknown.len(),
                "server requested digests not in the manifest"
            );
        }
        if !needed.is_empty() && upload_url.is_none() {
            return Err(DeployError::Remote {
                phase: DeployPhase::Populate,
                source: ApiError::Unexpected("populate response is missing uploadUrl".into()),
            });
        }

        info!(
            version = %version.name,
            total = manifest.len(),
            needed = needed.len(),
            "version populated"
        );

        version.phase = VersionPhase::Populated;
        if upload_url.is_some() {
            version.upload_url = upload_url;
        }
        Ok(needed)
    }

    /// Marks a populated version immutable.
    pub async fn finalize(&self, version: &mut Version) -> Result<(), DeployError> {
        version.require(DeployPhase::Finalize, &[VersionPhase::Populated])?;

        let resource = with_timeout(
            self.options.call_timeout(),
            self.api
                .update_version_status(&version.name, VersionStatus::Finalized),
        )
        .await
        .map_err(remote(DeployPhase::Finalize))?;

        info!(version = %version.name, "version finalized");
        version.phase = VersionPhase::Finalized;
        version.remote_status = resource.status;
        Ok(())
    }

    /// Binds a finalized version to its site.
    pub async fn release(
        &self,
        version: &mut Version,
        message: Option<&str>,
    ) -> Result<Release, DeployError> {
        version.require(DeployPhase::Release, &[VersionPhase::Finalized])?;

        let request = CreateReleaseRequest {
            message: message.map(str::to_string),
        };
        let resource = with_timeout(
            self.options.call_timeout(),
            self.api
                .create_release(&version.site_id, &version.name, &request),
        )
        .await
        .map_err(remote(DeployPhase::Release))?;

        info!(
            site = %version.site_id,
            version = %version.name,
            release = %resource.name,
            "version released"
        );
        version.phase = VersionPhase::Released;
        Ok(Release::from_resource(resource, &version.name))
    }

    /// Best-effort abandon. Never fails; the local phase becomes
    /// `Abandoned` even when the server call does not succeed.
    pub async fn abandon(&self, version: &mut Version) {
        if version.phase.is_terminal() {
            warn!(
                version = %version.name,
                phase = %version.phase,
                "ignoring abandon of a terminal version"
            );
            return;
        }

        match with_timeout(
            self.options.call_timeout(),
            self.api
                .update_version_status(&version.name, VersionStatus::Abandoned),
        )
        .await
        {
            Ok(resource) => {
                info!(version = %version.name, "version abandoned");
                version.remote_status = resource.status;
            }
            Err(e) => {
                warn!(version = %version.name, error = %e, "failed to abandon version");
            }
        }
        version.phase = VersionPhase::Abandoned;
    }

    /// Re-reads the server status.
    ///
    /// A version the server reports as finalized moves to `Finalized`; one
    /// it reports as abandoned, deleted or expired moves to `Abandoned`.
    pub async fn refresh(&self, version: &mut Version) -> Result<VersionStatus, DeployError> {
        let resource = with_timeout(
            self.options.call_timeout(),
            self.api.get_version(&version.name),
        )
        .await
        .map_err(remote(DeployPhase::Inspect))?;

        version.remote_status = resource.status;
        match resource.status {
            VersionStatus::Finalized
                if matches!(version.phase, VersionPhase::Created | VersionPhase::Populated) =>
            {
                version.phase = VersionPhase::Finalized;
            }
            VersionStatus::Abandoned | VersionStatus::Deleted | VersionStatus::Expired
                if !version.phase.is_terminal() =>
            {
                version.phase = VersionPhase::Abandoned;
            }
            _ => {}
        }
        debug!(
            version = %version.name,
            status = resource.status.as_str(),
            phase = %version.phase,
            "version refreshed"
        );
        Ok(resource.status)
    }
}
