//! Data types for the deploy flow.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sitedeploy_protocol::ReleaseResource;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::DeployPhase;

/// Capacity of the deploy event channel.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Progress events leave `1 / RESERVED_EVENT_SHARE` of the channel free,
/// so phase changes and the outcome still fit when the receiver is not
/// drained until the deploy returns.
const RESERVED_EVENT_SHARE: usize = 16;

/// Progress event emitted during deployment.
#[derive(Debug, Clone, PartialEq)]
pub enum DeployEvent {
    /// The pipeline entered a new step.
    PhaseChanged { phase: DeployPhase },
    /// Finished uploads (done or failed) out of the needed total.
    UploadProgress { done: usize, total: usize },
    /// A retryable upload failure; the next attempt starts after `delay`.
    UploadRetry {
        path: String,
        attempt: u32,
        delay: Duration,
        error: String,
    },
    /// The release is live.
    Completed {
        version_name: String,
        release_name: String,
    },
    /// The pipeline stopped on an error.
    Failed { phase: DeployPhase, error: String },
    /// The pipeline stopped on a cancellation request.
    Cancelled { phase: DeployPhase },
}

impl DeployEvent {
    /// Progress and retry notices; dropped first under backpressure.
    pub fn is_progress(&self) -> bool {
        matches!(self, Self::UploadProgress { .. } | Self::UploadRetry { .. })
    }
}

/// Sends without waiting. Progress events are dropped once the reserved
/// slots are reached; other events only when the channel is full or closed.
pub(crate) fn send_event(tx: &mpsc::Sender<DeployEvent>, event: DeployEvent) {
    let reserved = tx.max_capacity() / RESERVED_EVENT_SHARE;
    if event.is_progress() && tx.capacity() <= reserved {
        trace!(event = ?event, "event channel busy, dropping progress event");
        return;
    }
    if let Err(e) = tx.try_send(event) {
        trace!(error = %e, "deploy event dropped");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Pending,
    InFlight,
    Done,
    Failed,
}

/// Upload of one needed destination path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadTask {
    pub destination_path: String,
    pub digest: String,
    pub source_path: PathBuf,
    pub attempt_count: u32,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadTask {
    pub fn new(destination_path: String, digest: String, source_path: PathBuf) -> Self {
        Self {
            destination_path,
            digest,
            source_path,
            attempt_count: 0,
            status: UploadStatus::Pending,
            error: None,
        }
    }
}

/// Outcome of one `upload_all` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadSummary {
    pub total: usize,
    pub done: usize,
    pub failed: usize,
    pub tasks: Vec<UploadTask>,
}

impl UploadSummary {
    /// Attempts spent on `destination_path`, if it was uploaded.
    pub fn attempts_for(&self, destination_path: &str) -> Option<u32> {
        self.tasks
            .iter()
            .find(|t| t.destination_path == destination_path)
            .map(|t| t.attempt_count)
    }
}

/// A version bound to a site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Release {
    pub release_id: String,
    pub version_name: String,
    pub release_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Release {
    /// Converts the remote resource, using `fallback_version` when the
    /// response omits the embedded version.
    pub(crate) fn from_resource(resource: ReleaseResource, fallback_version: &str) -> Self {
        let version_name = resource
            .version_name()
            .map(str::to_string)
            .unwrap_or_else(|| fallback_version.to_string());
        Self {
            release_id: resource.name,
            version_name,
            release_time: resource.release_time,
            message: resource.message,
        }
    }
}

/// Result of a successful deployment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentResult {
    pub site_id: String,
    pub version_name: String,
    pub release_id: String,
    pub site_url: String,
    pub total_files: usize,
    pub uploaded_files: usize,
    pub cached_files: usize,
    pub success: bool,
    pub upload: UploadSummary,
}
