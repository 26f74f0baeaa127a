use std::process::ExitCode;

mod answers;
mod app;
mod bot;
mod config;
mod errors;
mod ledger;
mod llm;
mod nutrition;
mod state;

use crate::config::{AppConfig, ConfigError};
use crate::state::AppState;

/// Exit status when a required secret is missing from the environment.
const EXIT_MISSING_SECRET: u8 = 2;

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "macromind=debug,serenity=warn,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e @ ConfigError::Missing(_)) => {
            tracing::error!(error = %e, "missing secret, set it in the environment or .env");
            return Ok(ExitCode::from(EXIT_MISSING_SECRET));
        }
        Err(e) => return Err(e.into()),
    };

    let state = AppState::init(config)?;

    let liveness_cfg = state.config.clone();
    tokio::spawn(async move {
        if let Err(e) = app::serve(app::build_app(), &liveness_cfg).await {
            tracing::error!(error = %e, "liveness server failed");
        }
    });

    bot::run(state).await?;
    Ok(ExitCode::SUCCESS)
}
