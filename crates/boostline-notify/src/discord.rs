//! Outbound chat replies through the Discord REST API.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;

use crate::error::NotifyError;

const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

/// Discord caps message content at 2000 characters.
const MAX_CONTENT_CHARS: usize = 2000;

pub struct DiscordClient {
    client: Client,
    bot_token: String,
    base_url: String,
}

impl DiscordClient {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(bot_token: &str, timeout_secs: u64) -> Result<Self, NotifyError> {
        Self::with_base_url(bot_token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        bot_token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            bot_token: bot_token.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Sends `content` to the channel `channel_id`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] on network failure or
    /// [`NotifyError::UnexpectedStatus`] on a non-2xx response.
    pub async fn send_message(&self, channel_id: &str, content: &str) -> Result<(), NotifyError> {
        let url = format!("{}/channels/{channel_id}/messages", self.base_url);
        let content: String = content.chars().take(MAX_CONTENT_CHARS).collect();
        let response = self
            .client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bot {}", self.bot_token),
            )
            .json(&json!({ "content": content }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::UnexpectedStatus {
                service: "discord",
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
