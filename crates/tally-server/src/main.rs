//! tally server
//!
//! - Waits for the store (bounded retries), exits non-zero if it never answers
//! - Bootstraps the counter table, then serves `/health`, `/metrics`, `/hits`
//! - Drains and closes the store on SIGTERM / Ctrl+C

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_server::{config, server};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = match config::load_from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "config load failed");
            return ExitCode::FAILURE;
        }
    };

    match server::run(cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(
                error = %e,
                code = e.client_code().as_str(),
                fatal = e.is_fatal(),
                "tally-server stopped"
            );
            ExitCode::FAILURE
        }
    }
}
