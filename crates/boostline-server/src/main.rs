mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use boostline_core::Environment;
use boostline_pipeline::Services;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState, IntakeFilter},
    middleware::AuthState,
    scheduler::RefreshRunner,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = boostline_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let services = Services::from_config(&config)?;

    let runner = Arc::new(RefreshRunner::new(Arc::clone(&services.refresh)));
    let _scheduler = scheduler::build_scheduler(Arc::clone(&runner), &config.refresh_cron).await?;
    runner.spawn("startup");

    let auth = AuthState::from_tokens(
        &config.relay_tokens,
        matches!(config.env, Environment::Development),
    )?;
    let state = AppState {
        pipeline: Arc::clone(&services.pipeline),
        refresh: runner,
        intake: Arc::new(IntakeFilter {
            channel_id: config.discord_channel_id.clone(),
            ignored_authors: config.ignored_authors.clone(),
        }),
    };
    let app = build_app(state, auth);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "boostline server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
