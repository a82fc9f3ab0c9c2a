use boostline_core::KpiPeriod;
use boostline_metadata::MetadataError;
use boostline_store::StoreError;
use thiserror::Error;

/// Errors returned by [`crate::ParserClient`].
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from parser service: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why one submission attempt stopped.
///
/// Only [`PipelineError::Transient`] and [`PipelineError::WriteFailed`] are
/// worth re-running the whole pipeline for; everything else is terminal.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{kind} not found: {value}")]
    NotFound { kind: &'static str, value: String },

    #[error("video {0} is deleted or no longer available")]
    ItemGone(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("no current {0} KPI record")]
    MissingKpi(KpiPeriod),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("fatal: {0}")]
    Fatal(String),
}

impl PipelineError {
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, PipelineError::Transient(_) | PipelineError::WriteFailed(_))
    }

    /// Classifies a store failure that happened while writing a row.
    pub(crate) fn from_write(err: StoreError) -> Self {
        match err {
            StoreError::InvalidUrl { .. } => PipelineError::Fatal(err.to_string()),
            other => PipelineError::WriteFailed(other.to_string()),
        }
    }
}

impl From<MetadataError> for PipelineError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::InvalidInput(msg) => PipelineError::InvalidInput(msg),
            MetadataError::ItemGone { video_ref } => PipelineError::ItemGone(video_ref),
            MetadataError::InvalidPayload { .. } => PipelineError::InvalidPayload(err.to_string()),
            MetadataError::Http(_) | MetadataError::UnexpectedStatus { .. } => {
                PipelineError::Transient(err.to_string())
            }
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidUrl { .. } => PipelineError::Fatal(err.to_string()),
            StoreError::InvalidInput(msg) => PipelineError::InvalidInput(msg),
            StoreError::WriteFailed { .. } => PipelineError::WriteFailed(err.to_string()),
            StoreError::Http(_)
            | StoreError::UnexpectedStatus { .. }
            | StoreError::Deserialize { .. } => PipelineError::Transient(err.to_string()),
        }
    }
}

impl From<ParserError> for PipelineError {
    fn from(err: ParserError) -> Self {
        PipelineError::Transient(format!("parser service: {err}"))
    }
}

/// Fatal failure of a whole refresh run.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to list tracked records: {0}")]
    List(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_and_write_failures_retry() {
        assert!(PipelineError::Transient("timeout".to_owned()).is_retriable());
        assert!(PipelineError::WriteFailed("no row".to_owned()).is_retriable());
        assert!(!PipelineError::Rejected("bad".to_owned()).is_retriable());
        assert!(!PipelineError::ItemGone("1".to_owned()).is_retriable());
        assert!(!PipelineError::MissingKpi(KpiPeriod::Weekly).is_retriable());
        assert!(!PipelineError::Fatal("bug".to_owned()).is_retriable());
    }

    #[test]
    fn store_status_errors_are_transient() {
        let err = PipelineError::from(StoreError::UnexpectedStatus {
            status: 503,
            body: String::new(),
        });
        assert!(matches!(err, PipelineError::Transient(_)));
    }

    #[test]
    fn store_failures_during_writes_are_write_failures() {
        let err = PipelineError::from_write(StoreError::UnexpectedStatus {
            status: 422,
            body: "INVALID_VALUE_FOR_COLUMN".to_owned(),
        });
        assert!(matches!(err, PipelineError::WriteFailed(_)));
    }

    #[test]
    fn gone_video_stays_terminal() {
        let err = PipelineError::from(MetadataError::ItemGone {
            video_ref: "123".to_owned(),
        });
        assert!(matches!(err, PipelineError::ItemGone(ref v) if v == "123"));
        assert!(!err.is_retriable());
    }
}
