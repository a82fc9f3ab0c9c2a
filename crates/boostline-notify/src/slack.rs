//! Operator channel client for the Slack Web API (`chat.postMessage`).

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::NotifyError;

const DEFAULT_BASE_URL: &str = "https://slack.com/api";

pub struct SlackClient {
    client: Client,
    token: String,
    channel_id: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

impl SlackClient {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, channel_id: &str, timeout_secs: u64) -> Result<Self, NotifyError> {
        Self::with_base_url(token, channel_id, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        token: &str,
        channel_id: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            token: token.to_owned(),
            channel_id: channel_id.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Posts `text` to the configured operator channel.
    ///
    /// # Errors
    ///
    /// - [`NotifyError::Http`] on network failure.
    /// - [`NotifyError::UnexpectedStatus`] on a non-2xx response.
    /// - [`NotifyError::Slack`] when Slack answers `"ok": false`.
    pub async fn post_message(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/chat.postMessage", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "channel": self.channel_id, "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::UnexpectedStatus {
                service: "slack",
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PostMessageResponse = response.json().await?;
        if !parsed.ok {
            return Err(NotifyError::Slack(
                parsed.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }
}
