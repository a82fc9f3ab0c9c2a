use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,

    pub airtable_api_key: String,
    pub airtable_base_id: String,
    pub airtable_base_url: String,

    pub tikapi_key: String,
    pub tikapi_base_url: String,

    pub parser_url: String,
    pub parser_auth_key: Option<String>,

    pub slack_token: String,
    pub slack_channel_id: String,
    pub slack_base_url: String,

    pub discord_bot_token: String,
    pub discord_channel_id: String,
    pub discord_base_url: String,
    /// Authors whose messages are never treated as submissions.
    pub ignored_authors: Vec<String>,

    pub relay_tokens: Vec<String>,

    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub refresh_delay_ms: u64,
    pub refresh_cron: String,
    pub cache_ttl_secs: u64,
}

impl AppConfig {
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    #[must_use]
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("airtable_api_key", &"[redacted]")
            .field("airtable_base_id", &self.airtable_base_id)
            .field("airtable_base_url", &self.airtable_base_url)
            .field("tikapi_key", &"[redacted]")
            .field("tikapi_base_url", &self.tikapi_base_url)
            .field("parser_url", &self.parser_url)
            .field(
                "parser_auth_key",
                &self.parser_auth_key.as_ref().map(|_| "[redacted]"),
            )
            .field("slack_token", &"[redacted]")
            .field("slack_channel_id", &self.slack_channel_id)
            .field("slack_base_url", &self.slack_base_url)
            .field("discord_bot_token", &"[redacted]")
            .field("discord_channel_id", &self.discord_channel_id)
            .field("discord_base_url", &self.discord_base_url)
            .field("ignored_authors", &self.ignored_authors)
            .field("relay_tokens", &format!("[{} redacted]", self.relay_tokens.len()))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("refresh_delay_ms", &self.refresh_delay_ms)
            .field("refresh_cron", &self.refresh_cron)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .finish()
    }
}
