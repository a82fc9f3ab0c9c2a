use thiserror::Error;

/// Errors returned by [`crate::RecordStore`] implementations and the writer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from record store: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The store accepted the request but did not apply the mutation.
    #[error("write to {table} failed: {reason}")]
    WriteFailed { table: String, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid record store URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl StoreError {
    /// 403 from the store means the API key lacks permission on the base.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, StoreError::UnexpectedStatus { status: 403, .. })
    }
}

/// Errors returned by [`crate::IdentityResolver`].
///
/// `EmptyInput` and `NoMatch` are both "not found" outcomes but need
/// different wording for the submitter, so they stay distinct.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{kind} lookup skipped: input was empty")]
    EmptyInput { kind: &'static str },

    #[error("no {kind} matched {value:?}")]
    NoMatch { kind: &'static str, value: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
