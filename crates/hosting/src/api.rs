//! Transport trait consumed by the deploy pipeline.
//!
//! `HostingApi` is the seam between deploy logic and the network. The
//! reqwest-backed [`HttpHostingClient`](crate::HttpHostingClient) is the
//! production implementation; tests supply scripted mocks.

use std::future::Future;
use std::pin::Pin;

use sitedeploy_protocol::{
    CreateReleaseRequest, CreateVersionRequest, ListReleasesResponse, PopulateFilesRequest,
    PopulateFilesResponse, ReleaseResource, SiteResource, VersionResource, VersionStatus,
};

use crate::error::ApiError;

/// Boxed future returned by every [`HostingApi`] call.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Authenticated access to the hosting REST API.
pub trait HostingApi: Send + Sync {
    /// Creates a new version on `site_id` with an optional serving config.
    fn create_version<'a>(
        &'a self,
        site_id: &'a str,
        request: &'a CreateVersionRequest,
    ) -> ApiFuture<'a, VersionResource>;

    /// Sends a manifest batch; the reply lists digests the server lacks.
    fn populate_files<'a>(
        &'a self,
        version_name: &'a str,
        request: &'a PopulateFilesRequest,
    ) -> ApiFuture<'a, PopulateFilesResponse>;

    /// Uploads gzip-compressed content to `{upload_url}/{digest}`.
    fn upload_file<'a>(
        &'a self,
        upload_url: &'a str,
        digest: &'a str,
        gzipped: Vec<u8>,
    ) -> ApiFuture<'a, ()>;

    /// Sets the server-side status of a version (finalize / abandon).
    fn update_version_status<'a>(
        &'a self,
        version_name: &'a str,
        status: VersionStatus,
    ) -> ApiFuture<'a, VersionResource>;

    /// Releases `version_name` to the live site.
    fn create_release<'a>(
        &'a self,
        site_id: &'a str,
        version_name: &'a str,
        request: &'a CreateReleaseRequest,
    ) -> ApiFuture<'a, ReleaseResource>;

    /// Reads a version.
    fn get_version<'a>(&'a self, version_name: &'a str) -> ApiFuture<'a, VersionResource>;

    /// Reads a site.
    fn get_site<'a>(&'a self, site_id: &'a str) -> ApiFuture<'a, SiteResource>;

    /// Reads one page of a site's releases, newest first.
    fn list_releases<'a>(
        &'a self,
        site_id: &'a str,
        page_token: Option<&'a str>,
    ) -> ApiFuture<'a, ListReleasesResponse>;
}
