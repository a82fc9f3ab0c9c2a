use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_AIRTABLE_BASE_URL: &str = "https://api.airtable.com";
const DEFAULT_TIKAPI_BASE_URL: &str = "https://api.tikapi.io";
const DEFAULT_SLACK_BASE_URL: &str = "https://slack.com/api";
const DEFAULT_DISCORD_BASE_URL: &str = "https://discord.com/api/v10";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let airtable_api_key = require("AIRTABLE_API_KEY")?;
    let airtable_base_id = require("AIRTABLE_BASE_ID")?;
    let slack_token = require("SLACK_TOKEN")?;
    let discord_channel_id = require("DISCORD_CHANNEL_ID")?;
    let slack_channel_id = require("SLACK_CHANNEL_ID")?;
    let discord_bot_token = require("DISCORD_BOT_TOKEN")?;
    let tikapi_key = require("TIKAPI_KEY")?;
    let parser_url = require("PARSER_URL")?;
    let parser_auth_key = lookup("PARSER_AUTH_KEY").ok();

    let env = parse_environment(&or_default("BOOSTLINE_ENV", "development"));

    let bind_addr = or_default("BOOSTLINE_BIND_ADDR", "0.0.0.0:3001")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("BOOSTLINE_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("BOOSTLINE_LOG_LEVEL", "info");

    let request_timeout_secs = parse_u64("BOOSTLINE_REQUEST_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("BOOSTLINE_MAX_RETRIES", "3")?;
    let retry_delay_ms = parse_u64("BOOSTLINE_RETRY_DELAY_MS", "1000")?;
    let refresh_delay_ms = parse_u64("BOOSTLINE_REFRESH_DELAY_MS", "2000")?;
    let cache_ttl_secs = parse_u64("BOOSTLINE_CACHE_TTL_SECS", "3600")?;
    if cache_ttl_secs == 0 {
        return Err(invalid(
            "BOOSTLINE_CACHE_TTL_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let refresh_cron = or_default("BOOSTLINE_REFRESH_CRON", "0 0 0 * * *");

    let ignored_authors = split_list(&or_default("BOOSTLINE_IGNORED_AUTHORS", "CorrectionBot"));
    let relay_tokens = split_list(&or_default("BOOSTLINE_RELAY_TOKENS", ""));

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        airtable_api_key,
        airtable_base_id,
        airtable_base_url: or_default("AIRTABLE_BASE_URL", DEFAULT_AIRTABLE_BASE_URL),
        tikapi_key,
        tikapi_base_url: or_default("TIKAPI_BASE_URL", DEFAULT_TIKAPI_BASE_URL),
        parser_url,
        parser_auth_key,
        slack_token,
        slack_channel_id,
        slack_base_url: or_default("SLACK_BASE_URL", DEFAULT_SLACK_BASE_URL),
        discord_bot_token,
        discord_channel_id,
        discord_base_url: or_default("DISCORD_BASE_URL", DEFAULT_DISCORD_BASE_URL),
        ignored_authors,
        relay_tokens,
        request_timeout_secs,
        max_retries,
        retry_delay_ms,
        refresh_delay_ms,
        refresh_cron,
        cache_ttl_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
