//! Domain records shared by the pipeline, the refresh job, and the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One inbound chat message interpreted as a campaign-participation claim.
///
/// Immutable once captured. `id` is the chat platform's message id and doubles
/// as the dedup key for rows written on its behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub raw_text: String,
    pub submitter_handle: String,
    pub submitted_at: DateTime<Utc>,
    pub source_channel: String,
}

impl Submission {
    /// Captures a chat message, flattening newlines and trimming the text.
    #[must_use]
    pub fn capture(
        id: impl Into<String>,
        source_channel: impl Into<String>,
        submitter_handle: impl Into<String>,
        content: &str,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            raw_text: normalize_text(content),
            submitter_handle: submitter_handle.into(),
            submitted_at,
            source_channel: source_channel.into(),
        }
    }

    #[must_use]
    pub fn reply_target(&self) -> ReplyTarget {
        ReplyTarget {
            channel_id: self.source_channel.clone(),
            handle: self.submitter_handle.clone(),
        }
    }
}

fn normalize_text(content: &str) -> String {
    content.replace("\r\n", " ").replace('\n', " ").trim().to_string()
}

/// Where a submitter-facing message should be delivered, and who to mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    pub channel_id: String,
    pub handle: String,
}

/// Result of the external parsing service for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSubmission {
    pub is_valid: bool,
    pub reject_reason: Option<String>,
    pub video_ref: Option<String>,
    pub boost_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignRecord {
    pub id: String,
    pub code: String,
    pub display_name: String,
}

/// A creator row. `alias_handles` keeps the store's declared field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorRecord {
    pub id: String,
    pub canonical_handle: String,
    pub alias_handles: Vec<String>,
}

/// Engagement counters for one video. Always replaced as a complete set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetrics {
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub bookmark_count: u64,
}

/// A successful metadata lookup: who posted the video and how it performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub video_ref: String,
    pub author_handle: String,
    pub metrics: VideoMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiPeriod {
    Weekly,
    Monthly,
}

impl std::fmt::Display for KpiPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KpiPeriod::Weekly => write!(f, "weekly"),
            KpiPeriod::Monthly => write!(f, "monthly"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodKpi {
    pub id: String,
    pub period: KpiPeriod,
    pub is_current: bool,
}

/// The persisted row whose engagement metrics the refresh job keeps fresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedRecord {
    pub id: String,
    pub video_ref: Option<String>,
    pub creator_handle: String,
    pub metrics: VideoMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_flattens_newlines_and_trims() {
        let submission = Submission::capture(
            "m-1",
            "chan",
            "ana",
            "  https://tiktok.com/@ana/video/1\nABC\r\nthanks \n",
            Utc::now(),
        );
        assert_eq!(
            submission.raw_text,
            "https://tiktok.com/@ana/video/1 ABC thanks"
        );
    }

    #[test]
    fn reply_target_points_back_at_source_channel() {
        let submission = Submission::capture("m-2", "chan-9", "ben", "hi", Utc::now());
        let target = submission.reply_target();
        assert_eq!(target.channel_id, "chan-9");
        assert_eq!(target.handle, "ben");
    }

    #[test]
    fn kpi_period_serializes_lowercase() {
        let json = serde_json::to_string(&KpiPeriod::Monthly).expect("serialize");
        assert_eq!(json, "\"monthly\"");
        assert_eq!(KpiPeriod::Weekly.to_string(), "weekly");
    }
}
