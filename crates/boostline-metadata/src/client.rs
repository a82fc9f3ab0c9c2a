//! HTTP client for the TikAPI public video endpoint.
//!
//! Every lookup goes through the [`TtlCache`] first. Failures are classified
//! into "video gone" (terminal, reported as a warning) and everything else
//! (reported as an error), and reported through the injected [`Notifier`]
//! before being returned, so callers never notify for metadata failures.

use std::sync::Arc;
use std::time::Duration;

use boostline_core::{ReplyTarget, VideoDetails};
use boostline_notify::{Notice, Notifier};
use reqwest::{Client, StatusCode};

use crate::cache::TtlCache;
use crate::error::MetadataError;
use crate::payload::parse_video_details;

const DEFAULT_BASE_URL: &str = "https://api.tikapi.io";

/// One hour.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Body marker TikAPI uses for removed videos on otherwise generic errors.
const NOT_FOUND_MARKER: &str = "Video not found";

pub struct MetadataClient {
    client: Client,
    api_key: String,
    base_url: String,
    cache: TtlCache<VideoDetails>,
    notifier: Arc<dyn Notifier>,
}

impl MetadataClient {
    /// Creates a client pointed at the production TikAPI.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        timeout_secs: u64,
        cache_ttl: Duration,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, MetadataError> {
        Self::with_base_url(api_key, timeout_secs, cache_ttl, notifier, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        cache_ttl: Duration,
        notifier: Arc<dyn Notifier>,
        base_url: &str,
    ) -> Result<Self, MetadataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("boostline/0.1 (engagement-tracking)")
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            cache: TtlCache::new(cache_ttl),
            notifier,
        })
    }

    /// Fetches author and engagement metrics for `video_ref`.
    ///
    /// `reply_to` identifies the submitter when the lookup runs on behalf of a
    /// chat submission; failure notices then carry a reply for them.
    ///
    /// # Errors
    ///
    /// - [`MetadataError::InvalidInput`] if `video_ref` is blank.
    /// - [`MetadataError::ItemGone`] on 403/404 or a "Video not found" body.
    /// - [`MetadataError::Http`] / [`MetadataError::UnexpectedStatus`] on any
    ///   other transport failure or non-2xx status.
    /// - [`MetadataError::InvalidPayload`] if the counters or author are unusable.
    pub async fn fetch(
        &self,
        video_ref: &str,
        reply_to: Option<&ReplyTarget>,
    ) -> Result<VideoDetails, MetadataError> {
        let video_ref = video_ref.trim();
        if video_ref.is_empty() {
            let err = MetadataError::InvalidInput("video reference is empty".to_owned());
            self.report(&err, video_ref, reply_to).await;
            return Err(err);
        }

        if let Some(hit) = self.cache.get(video_ref) {
            tracing::debug!(video_ref, "metadata cache hit");
            return Ok(hit);
        }

        match self.request(video_ref).await {
            Ok(details) => {
                self.cache.put(video_ref, details.clone());
                tracing::info!(
                    video_ref,
                    author = %details.author_handle,
                    views = details.metrics.view_count,
                    "fetched video metadata"
                );
                Ok(details)
            }
            Err(err) => {
                self.report(&err, video_ref, reply_to).await;
                Err(err)
            }
        }
    }

    async fn request(&self, video_ref: &str) -> Result<VideoDetails, MetadataError> {
        let url = format!("{}/public/video", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("id", video_ref)])
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(video_ref, status = status.as_u16(), body = %body, "TikAPI error response");
            if is_gone(status, &body) {
                return Err(MetadataError::ItemGone {
                    video_ref: video_ref.to_owned(),
                });
            }
            return Err(MetadataError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let body: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| MetadataError::InvalidPayload {
                video_ref: video_ref.to_owned(),
                reason: format!("body is not JSON: {e}"),
            })?;
        parse_video_details(video_ref, &body)
    }

    async fn report(&self, err: &MetadataError, video_ref: &str, reply_to: Option<&ReplyTarget>) {
        let notice = match err {
            MetadataError::ItemGone { .. } => Notice::warning(format!(
                "Video {video_ref} was deleted or is no longer available"
            ))
            .with_optional_reply(
                reply_to,
                "that video was deleted or is no longer available. Please check the link",
            ),
            MetadataError::InvalidInput(_) => Notice::error(format!(
                "TikTok lookup rejected: {err}"
            ))
            .with_optional_reply(reply_to, "we couldn't find a TikTok link in your message"),
            MetadataError::InvalidPayload { .. } => Notice::error(format!(
                "Invalid stats received from TikTok API: {err}"
            ))
            .with_optional_reply(
                reply_to,
                "we couldn't read that video's stats. Please contact admins",
            ),
            MetadataError::Http(_) | MetadataError::UnexpectedStatus { .. } => {
                Notice::error(format!("TikTok API fetch error for {video_ref}: {err}"))
            }
        };
        self.notifier.notify(notice).await;
    }
}

fn is_gone(status: StatusCode, body: &str) -> bool {
    status == StatusCode::FORBIDDEN
        || status == StatusCode::NOT_FOUND
        || body.contains(NOT_FOUND_MARKER)
}
