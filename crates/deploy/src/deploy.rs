//! Release coordinator.
//!
//! Runs hash, create, populate, upload, finalize and release in strict
//! order, reports progress events, and supports cancellation between
//! steps.

use std::path::Path;
use std::sync::Arc;

use sitedeploy_hosting::HostingApi;
use sitedeploy_protocol::{CreateReleaseRequest, ReleaseType, ServingConfig, VersionStatus};
use sitedeploy_transfer::{FileEntry, Manifest, hash_entries};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::DeployOptions;
use crate::error::{DeployError, DeployPhase};
use crate::scanner::scan_public_dir;
use crate::types::{
    DeployEvent, DeploymentResult, EVENT_CHANNEL_CAPACITY, Release, send_event,
};
use crate::upload::UploadOrchestrator;
use crate::version::{Version, VersionLifecycle, with_timeout};

/// Deploys local files to a hosting site.
///
/// One `Deployer` carries one cancellation token; use a fresh instance
/// per deployment that should be cancellable on its own.
pub struct Deployer {
    api: Arc<dyn HostingApi>,
    options: DeployOptions,
    events_tx: mpsc::Sender<DeployEvent>,
    events_rx: Option<mpsc::Receiver<DeployEvent>>,
    cancel: CancellationToken,
}

impl Deployer {
    pub fn new(api: Arc<dyn HostingApi>, options: DeployOptions) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            options,
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<DeployEvent>> {
        self.events_rx.take()
    }

    /// Returns a cancellation token for this deployer.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &DeployOptions {
        &self.options
    }

    /// Version transitions for callers driving the steps themselves.
    pub fn lifecycle(&self) -> VersionLifecycle<'_> {
        VersionLifecycle::new(self.api.as_ref(), &self.options)
    }

    /// Deploys every regular file under `root`.
    pub async fn deploy_dir(
        &self,
        site_id: &str,
        root: &Path,
        hosting_config: Option<ServingConfig>,
        message: Option<&str>,
    ) -> Result<DeploymentResult, DeployError> {
        let entries = scan_public_dir(root)?;
        info!(
            site = %site_id,
            root = %root.display(),
            files = entries.len(),
            "scanned public directory"
        );
        self.deploy(site_id, entries, hosting_config, message).await
    }

    /// Runs the full pipeline and releases the new version.
    ///
    /// The first unrecovered error is returned as is. A version left behind
    /// by a failure is not abandoned automatically.
    pub async fn deploy(
        &self,
        site_id: &str,
        entries: Vec<FileEntry>,
        hosting_config: Option<ServingConfig>,
        message: Option<&str>,
    ) -> Result<DeploymentResult, DeployError> {
        match self.run(site_id, entries, hosting_config, message).await {
            Ok(result) => {
                self.emit(DeployEvent::Completed {
                    version_name: result.version_name.clone(),
                    release_name: result.release_id.clone(),
                });
                info!(
                    site = %site_id,
                    version = %result.version_name,
                    uploaded = result.uploaded_files,
                    cached = result.cached_files,
                    url = %result.site_url,
                    "deploy completed"
                );
                Ok(result)
            }
            Err(DeployError::Cancelled { phase }) => {
                self.emit(DeployEvent::Cancelled { phase });
                info!(site = %site_id, %phase, "deploy cancelled");
                Err(DeployError::Cancelled { phase })
            }
            Err(e) => {
                let phase = e.phase();
                self.emit(DeployEvent::Failed {
                    phase,
                    error: e.to_string(),
                });
                error!(site = %site_id, %phase, error = %e, "deploy failed");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        site_id: &str,
        entries: Vec<FileEntry>,
        hosting_config: Option<ServingConfig>,
        message: Option<&str>,
    ) -> Result<DeploymentResult, DeployError> {
        // 1. Validate input before touching the network.
        self.enter(DeployPhase::Validate)?;
        Manifest::validate_entries(&entries)?;

        // 2. Hash
        self.enter(DeployPhase::Hash)?;
        let hashed = tokio::task::spawn_blocking(move || hash_entries(&entries))
            .await
            .map_err(|e| DeployError::Task(e.to_string()))??;
        let manifest = Manifest::build(hashed)?;

        // 3. Create
        self.enter(DeployPhase::Create)?;
        let lifecycle = self.lifecycle();
        let mut version = lifecycle.create(site_id, hosting_config).await?;

        // 4. Populate
        self.enter(DeployPhase::Populate)?;
        let needed = lifecycle.populate(&mut version, &manifest).await?;

        // 5. Upload
        self.enter(DeployPhase::Upload)?;
        let upload = UploadOrchestrator::new(self.api.as_ref(), &self.options)
            .with_cancel(self.cancel.clone())
            .with_events(self.events_tx.clone())
            .upload_all(&version, &needed, &manifest)
            .await?;

        // 6. Finalize
        self.enter(DeployPhase::Finalize)?;
        lifecycle.finalize(&mut version).await?;

        // 7. Release
        self.enter(DeployPhase::Release)?;
        let release = lifecycle.release(&mut version, message).await?;
        let site_url = self.resolve_site_url(site_id).await;

        self.emit(DeployEvent::PhaseChanged {
            phase: DeployPhase::Done,
        });

        Ok(DeploymentResult {
            site_id: site_id.to_string(),
            version_name: version.name().to_string(),
            release_id: release.release_id,
            site_url,
            total_files: manifest.len(),
            uploaded_files: needed.len(),
            cached_files: manifest.len() - needed.len(),
            success: true,
            upload,
        })
    }

    /// Releases a finalized version.
    pub async fn release(
        &self,
        version: &mut Version,
        message: Option<&str>,
    ) -> Result<Release, DeployError> {
        self.lifecycle().release(version, message).await
    }

    /// Every release of `site_id`, newest first, following pagination.
    pub async fn list_releases(&self, site_id: &str) -> Result<Vec<Release>, DeployError> {
        let mut releases = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = with_timeout(
                self.options.call_timeout(),
                self.api.list_releases(site_id, page_token.as_deref()),
            )
            .await
            .map_err(|source| DeployError::Remote {
                phase: DeployPhase::Inspect,
                source,
            })?;

            releases.extend(page.releases.into_iter().map(|r| {
                let version = r.version_name().unwrap_or_default().to_string();
                (r.release_type, Release::from_resource(r, &version))
            }));

            let next = page.next_page_token.filter(|t| !t.is_empty());
            if next.is_none() || next == page_token {
                break;
            }
            page_token = next;
        }
        Ok(releases
            .into_iter()
            .filter(|(kind, _)| *kind != Some(ReleaseType::SiteDisable))
            .map(|(_, release)| release)
            .collect())
    }

    /// Re-releases the version that was live before the current one.
    pub async fn rollback(
        &self,
        site_id: &str,
        message: Option<&str>,
    ) -> Result<Release, DeployError> {
        let releases = self.list_releases(site_id).await?;
        let Some(current) = releases.first() else {
            return Err(DeployError::Validation(format!(
                "site {site_id} has no releases"
            )));
        };
        let Some(previous) = releases
            .iter()
            .skip(1)
            .find(|r| !r.version_name.is_empty() && r.version_name != current.version_name)
        else {
            return Err(DeployError::Validation(format!(
                "site {site_id} has no earlier version to roll back to"
            )));
        };

        let version = with_timeout(
            self.options.call_timeout(),
            self.api.get_version(&previous.version_name),
        )
        .await
        .map_err(|source| DeployError::Remote {
            phase: DeployPhase::Inspect,
            source,
        })?;
        if version.status != VersionStatus::Finalized {
            return Err(DeployError::Validation(format!(
                "version {} is {}, not FINALIZED",
                version.name,
                version.status.as_str()
            )));
        }

        let request = CreateReleaseRequest {
            message: message.map(str::to_string),
        };
        let resource = with_timeout(
            self.options.call_timeout(),
            self.api
                .create_release(site_id, &previous.version_name, &request),
        )
        .await
        .map_err(|source| DeployError::Remote {
            phase: DeployPhase::Release,
            source,
        })?;

        info!(
            site = %site_id,
            from = %current.version_name,
            to = %previous.version_name,
            "rolled back"
        );
        Ok(Release::from_resource(resource, &previous.version_name))
    }

    /// The site's default URL, or the conventional `web.app` address when
    /// the site cannot be read.
    async fn resolve_site_url(&self, site_id: &str) -> String {
        let fallback = format!("https://{site_id}.web.app");
        match with_timeout(self.options.call_timeout(), self.api.get_site(site_id)).await {
            Ok(site) => match site.default_url {
                Some(url) if !url.is_empty() => url,
                _ => fallback,
            },
            Err(e) => {
                warn!(site = %site_id, error = %e, "could not read site, using default URL");
                fallback
            }
        }
    }

    fn enter(&self, phase: DeployPhase) -> Result<(), DeployError> {
        if self.cancel.is_cancelled() {
            return Err(DeployError::Cancelled { phase });
        }
        info!(%phase, "deploy phase");
        self.emit(DeployEvent::PhaseChanged { phase });
        Ok(())
    }

    fn emit(&self, event: DeployEvent) {
        send_event(&self.events_tx, event);
    }
}
