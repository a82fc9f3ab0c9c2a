//! Builds the shared clients once from configuration and hands out the two
//! entry points wired to them.

use std::sync::Arc;

use boostline_core::AppConfig;
use boostline_metadata::{MetadataClient, MetadataError};
use boostline_notify::{DiscordClient, DualChannelNotifier, Notifier, NotifyError, SlackClient};
use boostline_store::{AirtableStore, RecordStore, StoreError};
use thiserror::Error;

use crate::error::ParserError;
use crate::parser::ParserClient;
use crate::pipeline::{PipelineConfig, SubmissionPipeline};
use crate::refresh::RefreshJob;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("notifier setup failed: {0}")]
    Notify(#[from] NotifyError),

    #[error("metadata client setup failed: {0}")]
    Metadata(#[from] MetadataError),

    #[error("record store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("parser client setup failed: {0}")]
    Parser(#[from] ParserError),
}

pub struct Services {
    pub notifier: Arc<dyn Notifier>,
    pub pipeline: Arc<SubmissionPipeline>,
    pub refresh: Arc<RefreshJob>,
}

impl Services {
    /// # Errors
    ///
    /// Returns [`SetupError`] if any HTTP client cannot be constructed or a
    /// configured base URL is unusable.
    pub fn from_config(config: &AppConfig) -> Result<Self, SetupError> {
        let timeout = config.request_timeout_secs;

        let notifier: Arc<dyn Notifier> = Arc::new(DualChannelNotifier::new(
            SlackClient::with_base_url(
                &config.slack_token,
                &config.slack_channel_id,
                timeout,
                &config.slack_base_url,
            )?,
            DiscordClient::with_base_url(&config.discord_bot_token, timeout, &config.discord_base_url)?,
        ));

        let store: Arc<dyn RecordStore> = Arc::new(AirtableStore::with_base_url(
            &config.airtable_api_key,
            &config.airtable_base_id,
            timeout,
            &config.airtable_base_url,
        )?);

        let metadata = Arc::new(MetadataClient::with_base_url(
            &config.tikapi_key,
            timeout,
            config.cache_ttl(),
            Arc::clone(&notifier),
            &config.tikapi_base_url,
        )?);

        let parser = ParserClient::new(&config.parser_url, config.parser_auth_key.as_deref(), timeout)?;

        let pipeline = Arc::new(SubmissionPipeline::new(
            parser,
            Arc::clone(&metadata),
            Arc::clone(&store),
            Arc::clone(&notifier),
            PipelineConfig {
                max_retries: config.max_retries,
                retry_delay: config.retry_delay(),
            },
        ));
        let refresh = Arc::new(RefreshJob::new(
            metadata,
            store,
            Arc::clone(&notifier),
            config.refresh_delay(),
        ));

        tracing::info!(env = %config.env, "services initialised");
        Ok(Self {
            notifier,
            pipeline,
            refresh,
        })
    }
}
