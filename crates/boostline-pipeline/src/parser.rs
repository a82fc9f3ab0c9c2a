//! Client for the external message-parsing service.

use std::time::Duration;

use boostline_core::{ParsedSubmission, Submission};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ParserError;

pub struct ParserClient {
    client: Client,
    url: String,
    auth_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ParseRequest<'a> {
    message: &'a str,
    #[serde(rename = "authKey", skip_serializing_if = "Option::is_none")]
    auth_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    valid: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    tiktok_url: Option<String>,
    #[serde(default)]
    boost_code: Option<String>,
}

impl ParserClient {
    /// # Errors
    ///
    /// Returns [`ParserError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(url: &str, auth_key: Option<&str>, timeout_secs: u64) -> Result<Self, ParserError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("boostline/0.1 (engagement-tracking)")
            .build()?;

        Ok(Self {
            client,
            url: url.to_owned(),
            auth_key: auth_key.map(str::to_owned),
        })
    }

    /// Asks the service whether `submission` is a well-formed claim and, if
    /// so, which video and boost code it names.
    ///
    /// # Errors
    ///
    /// Returns [`ParserError`] on transport failure, non-2xx status, or an
    /// unreadable body.
    pub async fn parse(&self, submission: &Submission) -> Result<ParsedSubmission, ParserError> {
        let request = ParseRequest {
            message: &submission.raw_text,
            auth_key: self.auth_key.as_deref(),
        };
        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                message_id = %submission.id,
                status = status.as_u16(),
                "parser service error response"
            );
            return Err(ParserError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ParseResponse =
            serde_json::from_str(&body).map_err(|e| ParserError::Deserialize {
                context: format!("parse result for message {}", submission.id),
                source: e,
            })?;
        tracing::debug!(message_id = %submission.id, valid = parsed.valid, "parsed submission");

        Ok(ParsedSubmission {
            is_valid: parsed.valid,
            reject_reason: non_blank(parsed.reason),
            video_ref: non_blank(parsed.tiktok_url),
            boost_code: non_blank(parsed.boost_code),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_key_is_omitted_when_unset() {
        let body = serde_json::to_value(ParseRequest {
            message: "hi",
            auth_key: None,
        })
        .expect("serialize");
        assert_eq!(body, serde_json::json!({ "message": "hi" }));
    }

    #[test]
    fn blank_fields_become_none() {
        assert_eq!(non_blank(Some("  ".to_owned())), None);
        assert_eq!(non_blank(Some(" ABC ".to_owned())), Some("ABC".to_owned()));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn null_fields_deserialize() {
        let parsed: ParseResponse =
            serde_json::from_str(r#"{"valid":false,"reason":"missing code","tiktok_url":null}"#)
                .expect("deserialize");
        assert!(!parsed.valid);
        assert_eq!(parsed.reason.as_deref(), Some("missing code"));
        assert!(parsed.tiktok_url.is_none());
        assert!(parsed.boost_code.is_none());
    }
}
