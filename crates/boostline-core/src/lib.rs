//! Shared domain types and configuration for the Boostline workspace.

pub mod app_config;
pub mod config;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use types::{
    CampaignRecord, CreatorRecord, KpiPeriod, ParsedSubmission, PeriodKpi, ReplyTarget,
    Submission, TrackedRecord, VideoDetails, VideoMetrics,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
