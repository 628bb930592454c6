//! Process lifecycle: readiness gate, bootstrap, serve, drain, close.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tally_core::error::{Result, TallyError};

use crate::app_state::AppState;
use crate::config::TallyConfig;
use crate::router;
use crate::store::{self, Store};

/// Gate on store readiness, then bootstrap the schema.
///
/// Both failures are fatal; there is no degraded serving mode.
pub async fn prepare(state: &AppState) -> Result<()> {
    let r = &state.cfg().readiness;
    state
        .readiness()
        .await_ready(r.max_attempts, Duration::from_millis(r.interval_ms))
        .await?;

    state.schema().initialize().await?;

    match state.counter().current().await {
        Ok(total) => tracing::info!(total = total.unwrap_or(0), "counter loaded"),
        Err(e) => tracing::warn!(error = %e, "counter read after bootstrap failed"),
    }
    Ok(())
}

/// Run the server until a termination signal arrives.
pub async fn run(cfg: TallyConfig) -> Result<()> {
    let store = store::open(&cfg.store);
    run_with_store(cfg, store, shutdown_signal()).await
}

/// Run with an explicit store and shutdown trigger.
///
/// The listener is bound only after `prepare` succeeds. On shutdown the
/// server stops accepting, drains in-flight requests, then closes the store.
pub async fn run_with_store<F>(cfg: TallyConfig, store: Arc<dyn Store>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listen = cfg.server.listen_addr()?;
    let state = AppState::new(cfg, Arc::clone(&store));

    if let Err(e) = prepare(&state).await {
        store.close().await;
        return Err(e);
    }

    let listener = match tokio::net::TcpListener::bind(listen).await {
        Ok(l) => l,
        Err(e) => {
            store.close().await;
            return Err(TallyError::Internal(format!("bind {listen} failed: {e}")));
        }
    };
    tracing::info!(%listen, backend = store.backend(), "tally-server listening");

    let drain_state = state.clone();
    let app = router::build_router(state);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            drain_state.set_draining();
            tracing::info!("draining in-flight requests");
        })
        .await;

    store.close().await;
    tracing::info!("store closed");

    served.map_err(|e| TallyError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
