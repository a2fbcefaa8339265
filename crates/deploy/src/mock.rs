//! Scripted [`HostingApi`] used by the pipeline tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sitedeploy_hosting::{ApiError, ApiFuture, HostingApi};
use sitedeploy_protocol::{
    CreateReleaseRequest, CreateVersionRequest, ListReleasesResponse, PopulateFilesRequest,
    PopulateFilesResponse, ReleaseResource, ReleaseType, SiteResource, VersionResource,
    VersionStatus,
};
use tokio_util::sync::CancellationToken;

pub const UPLOAD_URL: &str = "https://upload.test/upload/sites/blog/versions/v1/files";

/// Non-2xx error with a standard envelope body.
pub fn api_error(status: u16) -> ApiError {
    ApiError::from_response(
        status,
        format!(r#"{{"error":{{"code":{status},"message":"scripted {status}","status":"X"}}}}"#),
    )
}

pub fn version_resource(name: &str, status: VersionStatus) -> VersionResource {
    VersionResource {
        name: name.into(),
        status,
        config: None,
        create_time: None,
        finalize_time: None,
        file_count: None,
        version_bytes: None,
    }
}

pub fn release_resource(
    name: &str,
    version_name: &str,
    release_type: ReleaseType,
) -> ReleaseResource {
    ReleaseResource {
        name: name.into(),
        version: Some(version_resource(version_name, VersionStatus::Finalized)),
        release_type: Some(release_type),
        release_time: None,
        message: None,
    }
}

/// Each queue is consumed front to back; an empty queue yields the default reply.
#[derive(Default)]
pub struct MockApi {
    pub create: Mutex<Vec<Result<VersionResource, ApiError>>>,
    pub populate: Mutex<Vec<Result<PopulateFilesResponse, ApiError>>>,
    /// Per-digest HTTP statuses; 200 succeeds.
    pub upload: Mutex<HashMap<String, Vec<u16>>>,
    pub status: Mutex<Vec<Result<VersionResource, ApiError>>>,
    pub release: Mutex<Vec<Result<ReleaseResource, ApiError>>>,
    pub version: Mutex<Vec<Result<VersionResource, ApiError>>>,
    pub site: Mutex<Vec<Result<SiteResource, ApiError>>>,
    pub releases: Mutex<Vec<Result<ListReleasesResponse, ApiError>>>,

    /// Cancelled when the first populate call arrives.
    pub cancel_on_populate: Mutex<Option<CancellationToken>>,
    /// Never answer create_version.
    pub hang_create: bool,
    pub upload_delay: Option<Duration>,

    pub calls: Mutex<Vec<String>>,
    pub uploaded: Mutex<Vec<(String, Vec<u8>)>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls whose label starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn script_populate(&self, response: Result<PopulateFilesResponse, ApiError>) {
        self.populate.lock().unwrap().push(response);
    }

    pub fn script_upload(&self, digest: &str, statuses: &[u16]) {
        self.upload
            .lock()
            .unwrap()
            .insert(digest.to_string(), statuses.to_vec());
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn next<T>(queue: &Mutex<Vec<Result<T, ApiError>>>) -> Option<Result<T, ApiError>> {
        let mut queue = queue.lock().unwrap();
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }
}

impl HostingApi for MockApi {
    fn create_version<'a>(
        &'a self,
        site_id: &'a str,
        request: &'a CreateVersionRequest,
    ) -> ApiFuture<'a, VersionResource> {
        Box::pin(async move {
            self.record(format!("create {site_id}"));
            if self.hang_create {
                std::future::pending::<()>().await;
            }
            Self::next(&self.create).unwrap_or_else(|| {
                let mut v = version_resource(
                    &format!("sites/{site_id}/versions/v1"),
                    VersionStatus::Created,
                );
                v.config = request.config.clone();
                Ok(v)
            })
        })
    }

    fn populate_files<'a>(
        &'a self,
        version_name: &'a str,
        request: &'a PopulateFilesRequest,
    ) -> ApiFuture<'a, PopulateFilesResponse> {
        Box::pin(async move {
            self.record(format!("populate {version_name} {}", request.files.len()));
            if let Some(token) = self.cancel_on_populate.lock().unwrap().take() {
                token.cancel();
            }
            Self::next(&self.populate).unwrap_or_else(|| {
                // Default: the server lacks everything.
                let hashes: BTreeSet<String> = request.files.values().cloned().collect();
                Ok(PopulateFilesResponse {
                    upload_required_hashes: hashes.into_iter().collect(),
                    upload_url: Some(UPLOAD_URL.into()),
                })
            })
        })
    }

    fn upload_file<'a>(
        &'a self,
        upload_url: &'a str,
        digest: &'a str,
        gzipped: Vec<u8>,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            self.record(format!("upload {digest}"));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.upload_delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            assert_eq!(upload_url, UPLOAD_URL);
            let status = {
                let mut scripts = self.upload.lock().unwrap();
                match scripts.get_mut(digest) {
                    Some(statuses) if !statuses.is_empty() => statuses.remove(0),
                    _ => 200,
                }
            };
            if status == 200 {
                self.uploaded
                    .lock()
                    .unwrap()
                    .push((digest.to_string(), gzipped));
                Ok(())
            } else {
                Err(api_error(status))
            }
        })
    }

    fn update_version_status<'a>(
        &'a self,
        version_name: &'a str,
        status: VersionStatus,
    ) -> ApiFuture<'a, VersionResource> {
        Box::pin(async move {
            self.record(format!("status {version_name} {}", status.as_str()));
            Self::next(&self.status).unwrap_or_else(|| Ok(version_resource(version_name, status)))
        })
    }

    fn create_release<'a>(
        &'a self,
        site_id: &'a str,
        version_name: &'a str,
        request: &'a CreateReleaseRequest,
    ) -> ApiFuture<'a, ReleaseResource> {
        Box::pin(async move {
            self.record(format!("release {site_id} {version_name}"));
            Self::next(&self.release).unwrap_or_else(|| {
                let mut release = release_resource(
                    &format!("sites/{site_id}/releases/r1"),
                    version_name,
                    ReleaseType::Deploy,
                );
                release.message = request.message.clone();
                Ok(release)
            })
        })
    }

    fn get_version<'a>(&'a self, version_name: &'a str) -> ApiFuture<'a, VersionResource> {
        Box::pin(async move {
            self.record(format!("get_version {version_name}"));
            Self::next(&self.version)
                .unwrap_or_else(|| Ok(version_resource(version_name, VersionStatus::Created)))
        })
    }

    fn get_site<'a>(&'a self, site_id: &'a str) -> ApiFuture<'a, SiteResource> {
        Box::pin(async move {
            self.record(format!("get_site {site_id}"));
            Self::next(&self.site).unwrap_or_else(|| {
                Ok(SiteResource {
                    name: format!("projects/demo/sites/{site_id}"),
                    default_url: Some(format!("https://{site_id}.example.app")),
                    app_id: None,
                })
            })
        })
    }

    fn list_releases<'a>(
        &'a self,
        site_id: &'a str,
        page_token: Option<&'a str>,
    ) -> ApiFuture<'a, ListReleasesResponse> {
        Box::pin(async move {
            self.record(format!(
                "list_releases {site_id} {}",
                page_token.unwrap_or("-")
            ));
            Self::next(&self.releases).unwrap_or_else(|| {
                Ok(ListReleasesResponse {
                    releases: Vec::new(),
                    next_page_token: None,
                })
            })
        })
    }
}
