//! Bounded-concurrency upload of needed files.
//!
//! Only content the server reported missing is sent. Each file is
//! compressed with the same pinned gzip settings used for its digest, so
//! the uploaded bytes hash to the name they are stored under.

use std::collections::BTreeSet;
use std::path::PathBuf;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use sitedeploy_hosting::{ApiError, HostingApi};
use sitedeploy_transfer::{Manifest, compress_file};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DeployOptions;
use crate::error::{DeployError, DeployPhase, UploadFailure};
use crate::types::{DeployEvent, UploadStatus, UploadSummary, UploadTask, send_event};
use crate::version::{Version, VersionPhase, with_timeout};

struct TaskOutcome {
    index: usize,
    attempts: u32,
    error: Option<String>,
}

/// Uploads the needed set of one populated version.
pub struct UploadOrchestrator<'a> {
    api: &'a dyn HostingApi,
    options: &'a DeployOptions,
    cancel: CancellationToken,
    events: Option<mpsc::Sender<DeployEvent>>,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(api: &'a dyn HostingApi, options: &'a DeployOptions) -> Self {
        Self {
            api,
            options,
            cancel: CancellationToken::new(),
            events: None,
        }
    }

    /// Checked before each dispatch; in-flight uploads run to completion.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_events(mut self, events: mpsc::Sender<DeployEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Uploads every path in `needed` that the manifest knows.
    ///
    /// Dispatch stops at the first permanent failure; uploads already in
    /// flight finish and the error lists exactly the failed paths.
    pub async fn upload_all(
        &self,
        version: &Version,
        needed: &BTreeSet<String>,
        manifest: &Manifest,
    ) -> Result<UploadSummary, DeployError> {
        let mut tasks: Vec<UploadTask> = Vec::with_capacity(needed.len());
        for path in needed {
            match manifest.get(path) {
                Some(file) => tasks.push(UploadTask::new(
                    file.destination_path.clone(),
                    file.digest.clone(),
                    file.source_path.clone(),
                )),
                None => warn!(path = %path, "needed path is not in the manifest, skipping"),
            }
        }

        let total = tasks.len();
        if total == 0 {
            debug!(version = %version.name(), "nothing to upload");
            return Ok(UploadSummary::default());
        }

        if version.phase() != VersionPhase::Populated {
            return Err(DeployError::InvalidState {
                operation: DeployPhase::Upload,
                phase: version.phase(),
            });
        }
        let upload_url = version.upload_url().ok_or_else(|| DeployError::Remote {
            phase: DeployPhase::Upload,
            source: ApiError::Unexpected("version has no upload URL".into()),
        })?;

        let concurrency = self.options.concurrency.max(1);
        info!(version = %version.name(), files = total, concurrency, "uploading files");

        let mut in_flight = FuturesUnordered::new();
        let mut next = 0;
        let mut finished = 0;
        let mut stop = false;
        let mut cancelled = false;

        loop {
            while !stop && next < total && in_flight.len() < concurrency {
                if self.cancel.is_cancelled() {
                    cancelled = true;
                    stop = true;
                    break;
                }
                let task = &mut tasks[next];
                task.status = UploadStatus::InFlight;
                in_flight.push(self.run_task(
                    next,
                    upload_url,
                    task.destination_path.clone(),
                    task.digest.clone(),
                    task.source_path.clone(),
                ));
                next += 1;
            }

            let Some(outcome) = in_flight.next().await else {
                break;
            };

            let task = &mut tasks[outcome.index];
            task.attempt_count = outcome.attempts;
            match outcome.error {
                None => task.status = UploadStatus::Done,
                Some(error) => {
                    warn!(
                        path = %task.destination_path,
                        attempts = outcome.attempts,
                        error = %error,
                        "upload failed"
                    );
                    task.status = UploadStatus::Failed;
                    task.error = Some(error);
                    stop = true;
                }
            }
            finished += 1;
            self.emit(DeployEvent::UploadProgress {
                done: finished,
                total,
            });
        }

        let summary = UploadSummary {
            total,
            done: tasks
                .iter()
                .filter(|t| t.status == UploadStatus::Done)
                .count(),
            failed: tasks
                .iter()
                .filter(|t| t.status == UploadStatus::Failed)
                .count(),
            tasks,
        };

        if summary.failed > 0 {
            let failures = summary
                .tasks
                .iter()
                .filter(|t| t.status == UploadStatus::Failed)
                .map(|t| UploadFailure {
                    path: t.destination_path.clone(),
                    attempts: t.attempt_count,
                    error: t.error.clone().unwrap_or_default(),
                })
                .collect();
            return Err(DeployError::UploadFailed { failures });
        }
        if cancelled {
            info!(
                version = %version.name(),
                done = summary.done,
                total,
                "upload cancelled"
            );
            return Err(DeployError::Cancelled {
                phase: DeployPhase::Upload,
            });
        }

        info!(version = %version.name(), uploaded = summary.done, "upload complete");
        Ok(summary)
    }

    async fn run_task(
        &self,
        index: usize,
        upload_url: &str,
        path: String,
        digest: String,
        source: PathBuf,
    ) -> TaskOutcome {
        let gzipped = match tokio::task::spawn_blocking(move || compress_file(&source)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                return TaskOutcome {
                    index,
                    attempts: 0,
                    error: Some(e.to_string()),
                };
            }
            Err(e) => {
                return TaskOutcome {
                    index,
                    attempts: 0,
                    error: Some(format!("compression task failed: {e}")),
                };
            }
        };

        let max_attempts = self.options.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(
                path = %path,
                digest = %digest,
                attempt,
                bytes = gzipped.len(),
                "uploading file"
            );

            let result = with_timeout(
                self.options.call_timeout(),
                self.api.upload_file(upload_url, &digest, gzipped.clone()),
            )
            .await;

            match result {
                Ok(()) => {
                    return TaskOutcome {
                        index,
                        attempts: attempt,
                        error: None,
                    };
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.options.retry.delay_for_attempt(attempt);
                    warn!(
                        path = %path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "upload attempt failed, retrying"
                    );
                    self.emit(DeployEvent::UploadRetry {
                        path: path.clone(),
                        attempt,
                        delay,
                        error: e.to_string(),
                    });
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return TaskOutcome {
                        index,
                        attempts: attempt,
                        error: Some(e.to_string()),
                    };
                }
            }
        }
    }

    fn emit(&self, event: DeployEvent) {
        if let Some(tx) = &self.events {
            send_event(tx, event);
        }
    }
}
