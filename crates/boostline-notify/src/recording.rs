use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::notice::{Notice, Severity};
use crate::Notifier;

/// In-memory notifier that keeps every notice, for tests and dry runs.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every notice received so far, in order.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.notices()
            .iter()
            .filter(|n| n.severity == severity)
            .count()
    }

    #[must_use]
    pub fn count_containing(&self, needle: &str) -> usize {
        self.notices()
            .iter()
            .filter(|n| n.operator_text.contains(needle))
            .count()
    }

    /// Number of notices that carried a submitter-facing reply.
    #[must_use]
    pub fn reply_count(&self) -> usize {
        self.notices().iter().filter(|n| n.reply.is_some()).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: Notice) {
        tracing::debug!(severity = %notice.severity, text = %notice.operator_text, "recorded notice");
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
