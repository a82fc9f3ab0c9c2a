use async_trait::async_trait;

use crate::discord::DiscordClient;
use crate::notice::{Notice, Severity};
use crate::slack::SlackClient;
use crate::Notifier;

/// Production notifier: every notice goes to Slack, and its reply (if any)
/// goes to the submitter's Discord channel.
pub struct DualChannelNotifier {
    operator: SlackClient,
    chat: DiscordClient,
}

impl DualChannelNotifier {
    #[must_use]
    pub fn new(operator: SlackClient, chat: DiscordClient) -> Self {
        Self { operator, chat }
    }
}

#[async_trait]
impl Notifier for DualChannelNotifier {
    async fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Error => tracing::error!(text = %notice.operator_text, "notify"),
            Severity::Warning => tracing::warn!(text = %notice.operator_text, "notify"),
            Severity::Success => tracing::info!(text = %notice.operator_text, "notify"),
        }

        if let Some(reply) = &notice.reply {
            let content = reply.render(notice.severity);
            if let Err(e) = self.chat.send_message(&reply.target.channel_id, &content).await {
                tracing::error!(
                    channel_id = %reply.target.channel_id,
                    error = %e,
                    "failed to send reply to chat channel"
                );
            }
        }

        if let Err(e) = self.operator.post_message(&notice.operator_message()).await {
            tracing::error!(
                severity = %notice.severity,
                error = %e,
                "failed to send notice to operator channel"
            );
        }
    }
}
