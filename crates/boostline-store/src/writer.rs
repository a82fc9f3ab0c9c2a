//! Creates and updates the rows a submission produces.
//!
//! Both row kinds carry the chat message id; a create first looks for an
//! existing row with that id and returns it instead of inserting again, so a
//! retried submission never leaves duplicates behind.

use std::sync::Arc;

use boostline_core::{
    CampaignRecord, CreatorRecord, ParsedSubmission, PeriodKpi, Submission, TrackedRecord,
    VideoDetails, VideoMetrics,
};
use serde_json::{json, Value};

use crate::error::StoreError;
use crate::schema::{submission, tracked};
use crate::store::{Fields, Query, RecordStore, Row};

const UNKNOWN_CREATOR: &str = "Unknown Creator";

/// The base row written for a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRow {
    pub id: String,
    /// Campaign code computed by the store, else the boost code we wrote.
    pub campaign_code: Option<String>,
}

/// Everything the tracked row links together.
#[derive(Debug, Clone, Copy)]
pub struct TrackedLink<'a> {
    pub submission: &'a Submission,
    pub parsed: &'a ParsedSubmission,
    pub creator: &'a CreatorRecord,
    pub campaign: &'a CampaignRecord,
    pub details: &'a VideoDetails,
    pub weekly: Option<&'a PeriodKpi>,
    pub monthly: Option<&'a PeriodKpi>,
}

pub struct RecordWriter {
    store: Arc<dyn RecordStore>,
}

impl RecordWriter {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Writes the base submission row, or returns the one already written for
    /// the same message id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::WriteFailed`] if the store created no row.
    /// - Any other [`StoreError`] from the lookup or the create.
    pub async fn create_submission_record(
        &self,
        parsed: &ParsedSubmission,
        submission: &Submission,
    ) -> Result<SubmissionRow, StoreError> {
        if let Some(row) =
            self.existing(submission::TABLE, submission::MESSAGE_ID, &submission.id).await?
        {
            tracing::info!(
                message_id = %submission.id,
                record_id = %row.id,
                "submission row already exists, reusing it"
            );
            return Ok(submission_row(row, parsed));
        }

        let mut fields = Fields::new();
        fields.insert(submission::TEXT.to_owned(), json!(submission.raw_text));
        fields.insert(submission::AUTHOR.to_owned(), json!(submission.submitter_handle));
        fields.insert(submission::MESSAGE_ID.to_owned(), json!(submission.id));
        if let Some(video_ref) = &parsed.video_ref {
            fields.insert(submission::VIDEO.to_owned(), json!(video_ref));
        }
        if let Some(code) = &parsed.boost_code {
            fields.insert(submission::BOOST_CODE.to_owned(), json!(code));
        }

        let row = self.create_one(submission::TABLE, fields).await?;
        tracing::info!(message_id = %submission.id, record_id = %row.id, "created submission row");
        Ok(submission_row(row, parsed))
    }

    /// Writes the tracked row linking creator, campaign, and KPIs.
    ///
    /// A missing KPI is written as an empty link list.
    ///
    /// # Errors
    ///
    /// - [`StoreError::WriteFailed`] if the store created no row.
    /// - Any other [`StoreError`] from the lookup or the create.
    pub async fn link_tracked_record(
        &self,
        link: &TrackedLink<'_>,
    ) -> Result<TrackedRecord, StoreError> {
        let message_id = &link.submission.id;
        if let Some(row) = self.existing(tracked::TABLE, tracked::MESSAGE_ID, message_id).await? {
            tracing::info!(
                %message_id,
                record_id = %row.id,
                "tracked row already exists, reusing it"
            );
            return Ok(tracked_record(&row));
        }

        let mut fields = metric_fields(&link.details.metrics);
        fields.insert(tracked::CREATOR.to_owned(), json!(link.details.author_handle));
        fields.insert(tracked::SUBMITTER.to_owned(), json!(link.submission.submitter_handle));
        fields.insert(tracked::CAMPAIGN.to_owned(), json!(link.campaign.display_name));
        fields.insert(tracked::VIDEO.to_owned(), json!(link.details.video_ref));
        fields.insert(tracked::MESSAGE_ID.to_owned(), json!(message_id));
        if let Some(code) = &link.parsed.boost_code {
            fields.insert(tracked::BOOST_CODE.to_owned(), json!(code));
        }
        fields.insert(tracked::CREATOR_LINK.to_owned(), json!([link.creator.id]));
        fields.insert(tracked::CAMPAIGN_LINK.to_owned(), json!([link.campaign.id]));
        fields.insert(tracked::WEEKLY_KPI_LINK.to_owned(), link_list(link.weekly));
        fields.insert(tracked::MONTHLY_KPI_LINK.to_owned(), link_list(link.monthly));

        let row = self.create_one(tracked::TABLE, fields).await?;
        tracing::info!(
            %message_id,
            record_id = %row.id,
            video_ref = %link.details.video_ref,
            "created tracked row"
        );
        Ok(tracked_record(&row))
    }

    /// Replaces all four engagement counters of a tracked row in one update.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidInput`] if `tracked_id` is blank.
    /// - Any [`StoreError`] from the update.
    pub async fn refresh_metrics(
        &self,
        tracked_id: &str,
        metrics: &VideoMetrics,
    ) -> Result<(), StoreError> {
        if tracked_id.trim().is_empty() {
            return Err(StoreError::InvalidInput("tracked record id is empty".to_owned()));
        }
        self.store
            .update(tracked::TABLE, tracked_id, metric_fields(metrics))
            .await
    }

    /// Every tracked row in the current tracking window.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the listing fails.
    pub async fn list_tracked(&self) -> Result<Vec<TrackedRecord>, StoreError> {
        let rows = self
            .store
            .select(tracked::TABLE, &Query::all().in_view(tracked::CURRENT_VIEW))
            .await?;
        Ok(rows.iter().map(tracked_record).collect())
    }

    async fn existing(
        &self,
        table: &str,
        field: &str,
        message_id: &str,
    ) -> Result<Option<Row>, StoreError> {
        let rows = self
            .store
            .select(table, &Query::field_equals(field, message_id).limit(1))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn create_one(&self, table: &str, fields: Fields) -> Result<Row, StoreError> {
        self.store
            .create(table, vec![fields])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::WriteFailed {
                table: table.to_owned(),
                reason: "store returned no created row".to_owned(),
            })
    }
}

fn submission_row(row: Row, parsed: &ParsedSubmission) -> SubmissionRow {
    let campaign_code = row
        .text(submission::CAMPAIGN_CODE)
        .map(str::to_owned)
        .or_else(|| parsed.boost_code.clone());
    SubmissionRow {
        id: row.id,
        campaign_code,
    }
}

fn tracked_record(row: &Row) -> TrackedRecord {
    let creator_handle = row
        .text(tracked::CREATOR)
        .or_else(|| row.text(tracked::SUBMITTER))
        .unwrap_or(UNKNOWN_CREATOR)
        .to_owned();
    TrackedRecord {
        id: row.id.clone(),
        video_ref: row.text(tracked::VIDEO).map(str::to_owned),
        creator_handle,
        metrics: VideoMetrics {
            view_count: row.count(tracked::VIEWS).unwrap_or(0),
            like_count: row.count(tracked::LIKES).unwrap_or(0),
            comment_count: row.count(tracked::COMMENTS).unwrap_or(0),
            bookmark_count: row.count(tracked::BOOKMARKS).unwrap_or(0),
        },
    }
}

fn metric_fields(metrics: &VideoMetrics) -> Fields {
    let mut fields = Fields::new();
    fields.insert(tracked::VIEWS.to_owned(), json!(metrics.view_count));
    fields.insert(tracked::LIKES.to_owned(), json!(metrics.like_count));
    fields.insert(tracked::COMMENTS.to_owned(), json!(metrics.comment_count));
    fields.insert(tracked::BOOKMARKS.to_owned(), json!(metrics.bookmark_count));
    fields
}

fn link_list(kpi: Option<&PeriodKpi>) -> Value {
    match kpi {
        Some(kpi) => json!([kpi.id]),
        None => json!([]),
    }
}
