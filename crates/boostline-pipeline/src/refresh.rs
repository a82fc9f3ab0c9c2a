//! Periodic re-fetch of engagement metrics for every tracked video.

use std::sync::Arc;
use std::time::Duration;

use boostline_core::TrackedRecord;
use boostline_metadata::{MetadataClient, MetadataError};
use boostline_notify::{Notice, Notifier};
use boostline_store::{RecordStore, RecordWriter};

use crate::error::RefreshError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

pub struct RefreshJob {
    metadata: Arc<MetadataClient>,
    writer: RecordWriter,
    notifier: Arc<dyn Notifier>,
    /// Pause between consecutive items, none after the last.
    delay: Duration,
}

impl RefreshJob {
    #[must_use]
    pub fn new(
        metadata: Arc<MetadataClient>,
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        delay: Duration,
    ) -> Self {
        Self {
            metadata,
            writer: RecordWriter::new(store),
            notifier,
            delay,
        }
    }

    /// Refreshes every tracked record, one at a time, and reports a summary.
    ///
    /// Per-item failures are counted and reported but never stop the run.
    ///
    /// # Errors
    ///
    /// Returns [`RefreshError::List`] if the tracked records cannot be listed.
    pub async fn run_once(&self) -> Result<RefreshSummary, RefreshError> {
        tracing::info!("starting video stats refresh");
        let records = match self.writer.list_tracked().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "refresh run failed while listing tracked records");
                self.notifier
                    .notify(Notice::error(format!(
                        "Video stats update failed with fatal error: {e}"
                    )))
                    .await;
                return Err(e.into());
            }
        };

        let total = records.len();
        tracing::info!(total, "found tracked records to refresh");
        let mut summary = RefreshSummary {
            total,
            ..RefreshSummary::default()
        };

        for (index, record) in records.iter().enumerate() {
            if self.refresh_one(record, index + 1, total).await {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            if index + 1 < total {
                tokio::time::sleep(self.delay).await;
            }
        }

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            total,
            "video stats refresh finished"
        );
        self.notifier
            .notify(Notice::success(format!(
                "Video stats update completed:\n• Successfully updated: {}\n• Failed updates: {}\n• Total processed: {total}",
                summary.succeeded, summary.failed
            )))
            .await;
        Ok(summary)
    }

    async fn refresh_one(&self, record: &TrackedRecord, position: usize, total: usize) -> bool {
        let Some(video_ref) = record.video_ref.as_deref() else {
            tracing::warn!(record_id = %record.id, position, total, "tracked record has no video, skipping");
            self.notifier
                .notify(Notice::warning(format!(
                    "Missing video URL for creator {} (Record ID: {})",
                    record.creator_handle, record.id
                )))
                .await;
            return false;
        };

        // The metadata client reports its own failures, warning for gone videos.
        let details = match self.metadata.fetch(video_ref, None).await {
            Ok(details) => details,
            Err(MetadataError::ItemGone { .. }) => {
                tracing::warn!(record_id = %record.id, video_ref, "tracked video is gone");
                return false;
            }
            Err(e) => {
                tracing::error!(record_id = %record.id, video_ref, error = %e, "metadata fetch failed");
                return false;
            }
        };

        match self.writer.refresh_metrics(&record.id, &details.metrics).await {
            Ok(()) => {
                tracing::info!(
                    record_id = %record.id,
                    video_ref,
                    position,
                    total,
                    views = details.metrics.view_count,
                    "refreshed video stats"
                );
                true
            }
            Err(e) => {
                tracing::error!(record_id = %record.id, video_ref, error = %e, "failed to write video stats");
                self.notifier
                    .notify(Notice::error(format!(
                        "Failed to update video stats for {video_ref} by {}: {e}",
                        record.creator_handle
                    )))
                    .await;
                false
            }
        }
    }
}
