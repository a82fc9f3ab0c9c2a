use boostline_core::Submission;
use boostline_pipeline::{Services, SubmissionOutcome};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "boostline-cli")]
#[command(about = "Boostline operator command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Re-fetch engagement metrics for every tracked video once
    Refresh,
    /// Run one message through the submission pipeline
    Submit {
        /// Handle of the person who posted the message
        #[arg(long)]
        author: String,
        /// Channel the message was posted in
        #[arg(long)]
        channel: String,
        /// Raw message text
        #[arg(long)]
        text: String,
        /// Message id; a random id is generated when omitted
        #[arg(long)]
        id: Option<String>,
    },
    /// Load configuration and print it with secrets redacted
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("boostline-cli: run with --help to list commands");
        return Ok(());
    };

    let config = boostline_core::load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.log_level)?)
        .init();

    match command {
        Commands::CheckConfig => {
            println!("{config:#?}");
        }
        Commands::Refresh => {
            let services = Services::from_config(&config)?;
            let summary = services.refresh.run_once().await?;
            println!(
                "refreshed {} of {} tracked videos ({} failed)",
                summary.succeeded, summary.total, summary.failed
            );
        }
        Commands::Submit {
            author,
            channel,
            text,
            id,
        } => {
            let services = Services::from_config(&config)?;
            let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let submission = Submission::capture(id, channel, author, &text, chrono::Utc::now());
            let outcome = services.pipeline.run(&submission).await;
            println!("{}", describe_outcome(&outcome)?);
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level.
fn env_filter(fallback: &str) -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?)
}

fn describe_outcome(outcome: &SubmissionOutcome) -> anyhow::Result<String> {
    match &outcome.tracked {
        Some(record) => Ok(format!(
            "accepted after {} attempt(s): record {} ({} views)",
            outcome.attempts, record.id, record.metrics.view_count
        )),
        None => anyhow::bail!(
            "rejected after {} attempt(s) at stage {}",
            outcome.attempts,
            outcome.reached
        ),
    }
}
