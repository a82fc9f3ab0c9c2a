//! Extraction of author and engagement counters from a TikAPI video payload.
//!
//! Counters live at `itemInfo.itemStruct.stats`. A counter is accepted when it
//! is a non-negative JSON integer or a string holding one; anything else
//! (missing, negative, fractional, non-numeric) rejects the whole payload.

use boostline_core::{VideoDetails, VideoMetrics};
use serde_json::Value;

use crate::error::MetadataError;

pub(crate) fn parse_video_details(
    video_ref: &str,
    body: &Value,
) -> Result<VideoDetails, MetadataError> {
    let invalid = |reason: String| MetadataError::InvalidPayload {
        video_ref: video_ref.to_owned(),
        reason,
    };

    let item = body
        .pointer("/itemInfo/itemStruct")
        .ok_or_else(|| invalid("missing itemInfo.itemStruct".to_owned()))?;

    let author_handle = item
        .pointer("/author/uniqueId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("missing author.uniqueId".to_owned()))?
        .to_owned();

    let stats = item
        .get("stats")
        .ok_or_else(|| invalid("missing stats".to_owned()))?;

    let metrics = VideoMetrics {
        view_count: counter(stats, "playCount").map_err(&invalid)?,
        like_count: counter(stats, "diggCount").map_err(&invalid)?,
        comment_count: counter(stats, "commentCount").map_err(&invalid)?,
        bookmark_count: counter(stats, "collectCount").map_err(&invalid)?,
    };

    Ok(VideoDetails {
        video_ref: video_ref.to_owned(),
        author_handle,
        metrics,
    })
}

fn counter(stats: &Value, field: &str) -> Result<u64, String> {
    match stats.get(field) {
        None | Some(Value::Null) => Err(format!("stats.{field} is missing")),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| format!("stats.{field} is not a non-negative integer: {n}")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("stats.{field} is not a non-negative integer: {s:?}")),
        Some(other) => Err(format!("stats.{field} has unexpected type: {other}")),
    }
}
