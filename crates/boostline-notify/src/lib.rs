//! Dual-channel notifications: technical detail to the operator channel and,
//! when a submitter is involved, a friendlier reply in the chat channel.

pub mod discord;
pub mod dual;
pub mod error;
pub mod notice;
pub mod recording;
pub mod slack;

use async_trait::async_trait;

pub use discord::DiscordClient;
pub use dual::DualChannelNotifier;
pub use error::NotifyError;
pub use notice::{Notice, Reply, Severity};
pub use recording::RecordingNotifier;
pub use slack::SlackClient;

/// Single port every component reports through.
///
/// Delivery is best-effort: implementations log and swallow transport
/// failures so that reporting never changes the caller's control flow.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: Notice);
}
