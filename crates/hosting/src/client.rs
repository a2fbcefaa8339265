//! Hosting REST client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.

use reqwest::RequestBuilder;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;

use sitedeploy_protocol::{
    CreateReleaseRequest, CreateVersionRequest, ListReleasesResponse, PopulateFilesRequest,
    PopulateFilesResponse, ReleaseResource, SiteResource, UpdateVersionStatusRequest,
    VersionResource, VersionStatus,
};

use crate::api::{ApiFuture, HostingApi};
use crate::config::ClientConfig;
use crate::error::ApiError;

/// Page size requested when listing releases.
const RELEASES_PAGE_SIZE: &str = "100";

/// reqwest-backed [`HostingApi`].
pub struct HttpHostingClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpHostingClient {
    /// Creates a client that sends `token` as a Bearer credential on every request.
    pub fn new(token: &str, config: ClientConfig) -> Result<Self, ApiError> {
        if token.trim().is_empty() {
            return Err(ApiError::InvalidToken);
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| ApiError::InvalidToken)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self { http, config })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, resource: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            resource.trim_start_matches('/')
        )
    }

    /// Sends a request and returns the body of a 2xx response.
    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let resp = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status.as_u16(), body));
        }

        Ok(resp
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?
            .to_vec())
    }

    /// Sends a request and decodes a JSON response body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.config.timeout())
        } else {
            ApiError::Http(e)
        }
    }
}

impl HostingApi for HttpHostingClient {
    fn create_version<'a>(
        &'a self,
        site_id: &'a str,
        request: &'a CreateVersionRequest,
    ) -> ApiFuture<'a, VersionResource> {
        Box::pin(async move {
            let url = self.url(&format!("{}/versions", self.config.site_resource(site_id)));
            debug!(site = site_id, %url, "creating version");
            self.send_json(self.http.post(&url).json(request)).await
        })
    }

    fn populate_files<'a>(
        &'a self,
        version_name: &'a str,
        request: &'a PopulateFilesRequest,
    ) -> ApiFuture<'a, PopulateFilesResponse> {
        Box::pin(async move {
            let url = self.url(&format!("{version_name}:populateFiles"));
            debug!(version = version_name, files = request.files.len(), "populating files");
            self.send_json(self.http.post(&url).json(request)).await
        })
    }

    fn upload_file<'a>(
        &'a self,
        upload_url: &'a str,
        digest: &'a str,
        gzipped: Vec<u8>,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let url = format!("{}/{digest}", upload_url.trim_end_matches('/'));
            debug!(%digest, bytes = gzipped.len(), "uploading file");
            self.send(
                self.http
                    .post(&url)
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(gzipped),
            )
            .await?;
            Ok(())
        })
    }

    fn update_version_status<'a>(
        &'a self,
        version_name: &'a str,
        status: VersionStatus,
    ) -> ApiFuture<'a, VersionResource> {
        Box::pin(async move {
            let url = self.url(version_name);
            debug!(version = version_name, status = status.as_str(), "updating version status");
            let body = UpdateVersionStatusRequest { status };
            self.send_json(
                self.http
                    .patch(&url)
                    .query(&[("updateMask", "status")])
                    .json(&body),
            )
            .await
        })
    }

    fn create_release<'a>(
        &'a self,
        site_id: &'a str,
        version_name: &'a str,
        request: &'a CreateReleaseRequest,
    ) -> ApiFuture<'a, ReleaseResource> {
        Box::pin(async move {
            let url = self.url(&format!("{}/releases", self.config.site_resource(site_id)));
            debug!(site = site_id, version = version_name, "creating release");
            self.send_json(
                self.http
                    .post(&url)
                    .query(&[("versionName", version_name)])
                    .json(request),
            )
            .await
        })
    }

    fn get_version<'a>(&'a self, version_name: &'a str) -> ApiFuture<'a, VersionResource> {
        Box::pin(async move {
            let url = self.url(version_name);
            self.send_json(self.http.get(&url)).await
        })
    }

    fn get_site<'a>(&'a self, site_id: &'a str) -> ApiFuture<'a, SiteResource> {
        Box::pin(async move {
            let url = self.url(&self.config.site_resource(site_id));
            self.send_json(self.http.get(&url)).await
        })
    }

    fn list_releases<'a>(
        &'a self,
        site_id: &'a str,
        page_token: Option<&'a str>,
    ) -> ApiFuture<'a, ListReleasesResponse> {
        Box::pin(async move {
            let url = self.url(&format!("{}/releases", self.config.site_resource(site_id)));
            let mut params = vec![("pageSize", RELEASES_PAGE_SIZE)];
            if let Some(token) = page_token {
                params.push(("pageToken", token));
            }
            self.send_json(self.http.get(&url).query(&params)).await
        })
    }
}
