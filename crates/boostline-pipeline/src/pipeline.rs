//! The submission state machine.
//!
//! One attempt walks validate, base row, campaign, metadata, creator, KPIs,
//! tracked row. Terminal failures are reported once at the step that hit
//! them. Transient failures re-run the whole attempt after a fixed delay.

use std::sync::Arc;
use std::time::Duration;

use boostline_core::{
    CampaignRecord, CreatorRecord, KpiPeriod, PeriodKpi, ReplyTarget, Submission, TrackedRecord,
};
use boostline_metadata::MetadataClient;
use boostline_notify::{Notice, Notifier};
use boostline_store::{IdentityResolver, RecordStore, RecordWriter, ResolveError, TrackedLink};

use crate::error::PipelineError;
use crate::parser::ParserClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Re-runs after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validating,
    Enriching,
    Resolving,
    Persisting,
    Done,
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Validating => "validating",
            Stage::Enriching => "enriching",
            Stage::Resolving => "resolving",
            Stage::Persisting => "persisting",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub accepted: bool,
    pub attempts: u32,
    /// `Done` or `Failed`.
    pub stage: Stage,
    /// Last step entered during the final attempt.
    pub reached: Stage,
    pub tracked: Option<TrackedRecord>,
}

pub struct SubmissionPipeline {
    parser: ParserClient,
    metadata: Arc<MetadataClient>,
    resolver: IdentityResolver,
    writer: RecordWriter,
    notifier: Arc<dyn Notifier>,
    config: PipelineConfig,
}

impl SubmissionPipeline {
    #[must_use]
    pub fn new(
        parser: ParserClient,
        metadata: Arc<MetadataClient>,
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            parser,
            metadata,
            resolver: IdentityResolver::new(Arc::clone(&store)),
            writer: RecordWriter::new(store),
            notifier,
            config,
        }
    }

    /// Processes one submission; `true` once its tracked row exists.
    pub async fn handle(&self, submission: &Submission) -> bool {
        self.run(submission).await.accepted
    }

    /// Same as [`SubmissionPipeline::handle`] with attempt and stage detail.
    pub async fn run(&self, submission: &Submission) -> SubmissionOutcome {
        let total = self.config.max_retries.saturating_add(1);
        let mut attempt = 1u32;

        loop {
            let mut reached = Stage::Received;
            tracing::info!(message_id = %submission.id, attempt, "processing submission");

            let err = match self.attempt(submission, &mut reached).await {
                Ok(tracked) => {
                    tracing::info!(
                        message_id = %submission.id,
                        record_id = %tracked.id,
                        attempt,
                        "submission processed"
                    );
                    return SubmissionOutcome {
                        accepted: true,
                        attempts: attempt,
                        stage: Stage::Done,
                        reached,
                        tracked: Some(tracked),
                    };
                }
                Err(err) => err,
            };

            if !err.is_retriable() {
                tracing::warn!(
                    message_id = %submission.id,
                    attempt,
                    stage = %reached,
                    error = %err,
                    "submission failed"
                );
                if let PipelineError::Fatal(_) = err {
                    self.notifier
                        .notify(Notice::error(format!(
                            "Submission {} failed unexpectedly: {err}",
                            submission.id
                        )))
                        .await;
                }
                return failed(attempt, reached);
            }

            if attempt >= total {
                tracing::error!(
                    message_id = %submission.id,
                    attempts = attempt,
                    error = %err,
                    "max retries reached, giving up"
                );
                self.notifier
                    .notify(
                        Notice::error(format!(
                            "Giving up on submission {} after {attempt} attempts: {err}",
                            submission.id
                        ))
                        .with_reply(
                            &submission.reply_target(),
                            "we couldn't process your submission right now. Please try again later",
                        ),
                    )
                    .await;
                return failed(attempt, reached);
            }

            tracing::warn!(
                message_id = %submission.id,
                attempt,
                delay_ms = self.config.retry_delay.as_millis(),
                error = %err,
                "submission attempt failed, retrying"
            );
            self.notifier
                .notify(Notice::error(format!(
                    "Submission {} attempt {attempt} of {total} failed: {err}",
                    submission.id
                )))
                .await;
            tokio::time::sleep(self.config.retry_delay).await;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        submission: &Submission,
        reached: &mut Stage,
    ) -> Result<TrackedRecord, PipelineError> {
        let reply = submission.reply_target();

        *reached = Stage::Validating;
        let parsed = self.parser.parse(submission).await?;
        if !parsed.is_valid {
            let reason = parsed
                .reject_reason
                .clone()
                .unwrap_or_else(|| "message format not recognised".to_owned());
            self.notifier
                .notify(
                    Notice::error(format!("Invalid message format: {reason}"))
                        .with_reply(&reply, reason.clone()),
                )
                .await;
            return Err(PipelineError::Rejected(reason));
        }
        let Some(video_ref) = parsed.video_ref.clone() else {
            self.notifier
                .notify(
                    Notice::error(format!(
                        "Parser accepted message {} without a TikTok link",
                        submission.id
                    ))
                    .with_reply(&reply, "we couldn't find a TikTok link in your message"),
                )
                .await;
            return Err(PipelineError::InvalidInput("missing video reference".to_owned()));
        };

        let row = self
            .writer
            .create_submission_record(&parsed, submission)
            .await
            .map_err(PipelineError::from_write)?;

        *reached = Stage::Resolving;
        let campaign = self
            .campaign(row.campaign_code.as_deref().unwrap_or_default(), &reply)
            .await?;

        *reached = Stage::Enriching;
        // Failures here were already reported by the metadata client.
        let details = self.metadata.fetch(&video_ref, Some(&reply)).await?;

        *reached = Stage::Resolving;
        let creator = self.creator(&details.author_handle, &reply).await?;
        let weekly = self.require_kpi(KpiPeriod::Weekly).await?;
        let monthly = self.require_kpi(KpiPeriod::Monthly).await?;

        *reached = Stage::Persisting;
        let link = TrackedLink {
            submission,
            parsed: &parsed,
            creator: &creator,
            campaign: &campaign,
            details: &details,
            weekly: Some(&weekly),
            monthly: Some(&monthly),
        };
        self.writer
            .link_tracked_record(&link)
            .await
            .map_err(PipelineError::from_write)
    }

    async fn campaign(
        &self,
        code: &str,
        reply: &ReplyTarget,
    ) -> Result<CampaignRecord, PipelineError> {
        match self.resolver.resolve_campaign(code).await {
            Ok(campaign) => Ok(campaign),
            Err(ResolveError::Store(e)) => Err(e.into()),
            Err(ResolveError::EmptyInput { .. }) => {
                self.notifier
                    .notify(
                        Notice::error("Campaign search skipped: submission row has no campaign code")
                            .with_reply(
                                reply,
                                "we couldn't find a campaign code in your message. Please check and resubmit",
                            ),
                    )
                    .await;
                Err(PipelineError::InvalidInput("empty campaign code".to_owned()))
            }
            Err(ResolveError::NoMatch { value, .. }) => {
                self.notifier
                    .notify(
                        Notice::error(format!("Campaign not found for code: {value}")).with_reply(
                            reply,
                            format!("campaign {value} isn't active anymore. Please contact admins"),
                        ),
                    )
                    .await;
                Err(PipelineError::NotFound {
                    kind: "campaign",
                    value,
                })
            }
        }
    }

    async fn creator(
        &self,
        handle: &str,
        reply: &ReplyTarget,
    ) -> Result<CreatorRecord, PipelineError> {
        match self.resolver.resolve_creator(handle).await {
            Ok(creator) => Ok(creator),
            Err(ResolveError::Store(e)) => Err(e.into()),
            Err(ResolveError::EmptyInput { .. }) => {
                self.notifier
                    .notify(
                        Notice::error("Creator search skipped: video has no author handle")
                            .with_reply(
                                reply,
                                "we couldn't tell who posted that video. Please contact admins",
                            ),
                    )
                    .await;
                Err(PipelineError::InvalidInput("empty creator handle".to_owned()))
            }
            Err(ResolveError::NoMatch { value, .. }) => {
                self.notifier
                    .notify(
                        Notice::error(format!("Creator not found for: {value}")).with_reply(
                            reply,
                            "that TikTok username doesn't look familiar. Please contact admins",
                        ),
                    )
                    .await;
                Err(PipelineError::NotFound {
                    kind: "creator",
                    value,
                })
            }
        }
    }

    async fn require_kpi(&self, period: KpiPeriod) -> Result<PeriodKpi, PipelineError> {
        if let Some(kpi) = self.resolver.current_kpi(period).await? {
            return Ok(kpi);
        }
        self.notifier
            .notify(Notice::error(format!("No current {period} KPI record found")))
            .await;
        Err(PipelineError::MissingKpi(period))
    }
}

fn failed(attempts: u32, reached: Stage) -> SubmissionOutcome {
    SubmissionOutcome {
        accepted: false,
        attempts,
        stage: Stage::Failed,
        reached,
        tracked: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_allows_four_attempts() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_retries + 1, 4);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
    }

    #[test]
    fn stage_names_are_lowercase() {
        assert_eq!(Stage::Persisting.to_string(), "persisting");
        assert_eq!(Stage::Failed.to_string(), "failed");
    }
}
