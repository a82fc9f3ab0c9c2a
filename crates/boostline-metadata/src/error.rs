use thiserror::Error;

/// Errors returned by [`crate::MetadataClient`].
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The caller passed an empty video reference; no request was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The video was deleted or made private. Terminal, never retried.
    #[error("video {video_ref} is deleted or no longer available")]
    ItemGone { video_ref: String },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from TikAPI: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response arrived but its counters or author are unusable.
    #[error("invalid payload for video {video_ref}: {reason}")]
    InvalidPayload { video_ref: String, reason: String },
}

impl MetadataError {
    /// `true` for failures that may succeed if the whole operation is retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MetadataError::Http(_) | MetadataError::UnexpectedStatus { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_and_status_errors_are_transient() {
        assert!(MetadataError::UnexpectedStatus {
            status: 502,
            body: String::new()
        }
        .is_transient());
        assert!(!MetadataError::ItemGone {
            video_ref: "1".to_owned()
        }
        .is_transient());
        assert!(!MetadataError::InvalidInput("empty".to_owned()).is_transient());
        assert!(!MetadataError::InvalidPayload {
            video_ref: "1".to_owned(),
            reason: "negative".to_owned()
        }
        .is_transient());
    }
}
