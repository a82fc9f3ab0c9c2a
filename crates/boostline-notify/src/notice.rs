use boostline_core::ReplyTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl Severity {
    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            Severity::Success => "✅",
            Severity::Warning => "⚠️",
            Severity::Error => "❌",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Submitter-facing variant of a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub target: ReplyTarget,
    pub text: String,
}

impl Reply {
    /// Message body as posted to the chat channel, mentioning the submitter.
    #[must_use]
    pub fn render(&self, severity: Severity) -> String {
        let label = match severity {
            Severity::Error => "Error: ",
            Severity::Warning | Severity::Success => "",
        };
        format!(
            "{} {label}@{}, {}",
            severity.emoji(),
            self.target.handle,
            self.text
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub operator_text: String,
    pub reply: Option<Reply>,
}

impl Notice {
    pub fn error(operator_text: impl Into<String>) -> Self {
        Self::new(Severity::Error, operator_text)
    }

    pub fn warning(operator_text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, operator_text)
    }

    pub fn success(operator_text: impl Into<String>) -> Self {
        Self::new(Severity::Success, operator_text)
    }

    fn new(severity: Severity, operator_text: impl Into<String>) -> Self {
        Self {
            severity,
            operator_text: operator_text.into(),
            reply: None,
        }
    }

    /// Attaches a submitter-facing message delivered to `target`.
    #[must_use]
    pub fn with_reply(mut self, target: &ReplyTarget, text: impl Into<String>) -> Self {
        self.reply = Some(Reply {
            target: target.clone(),
            text: text.into(),
        });
        self
    }

    /// Same as [`Notice::with_reply`] but a no-op when `target` is `None`.
    #[must_use]
    pub fn with_optional_reply(self, target: Option<&ReplyTarget>, text: impl Into<String>) -> Self {
        match target {
            Some(target) => self.with_reply(target, text),
            None => self,
        }
    }

    /// Message body as posted to the operator channel.
    #[must_use]
    pub fn operator_message(&self) -> String {
        format!("{} {}", self.severity.emoji(), self.operator_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ReplyTarget {
        ReplyTarget {
            channel_id: "chan-1".to_string(),
            handle: "ana".to_string(),
        }
    }

    #[test]
    fn operator_message_is_prefixed_with_severity_emoji() {
        assert_eq!(Notice::warning("video gone").operator_message(), "⚠️ video gone");
        assert_eq!(Notice::error("boom").operator_message(), "❌ boom");
    }

    #[test]
    fn error_reply_mentions_submitter() {
        let notice = Notice::error("Creator not found for: ana").with_reply(
            &target(),
            "that TikTok username doesn't look familiar. Please contact admins",
        );
        let reply = notice.reply.expect("reply attached");
        assert_eq!(
            reply.render(Severity::Error),
            "❌ Error: @ana, that TikTok username doesn't look familiar. Please contact admins"
        );
    }

    #[test]
    fn optional_reply_is_skipped_without_target() {
        let notice = Notice::warning("gone").with_optional_reply(None, "ignored");
        assert!(notice.reply.is_none());
    }
}
