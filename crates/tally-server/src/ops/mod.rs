//! HTTP endpoints.
//!
//! - `/health`  : delayed store probe (`OK` / `DB_ERROR`)
//! - `/metrics` : Prometheus text format
//! - `/hits`    : durable counter, JSON
//! - anything else: static greeting

use std::time::Instant;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use tally_core::HealthStatus;

use crate::app_state::AppState;

pub const GREETING: &str = "Backend says hai noroc bade Vasile!\n";

#[derive(Debug, Serialize)]
pub struct HitsBody {
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
}

pub async fn health(State(state): State<AppState>) -> Response {
    let prober = state.health();
    let started = Instant::now();
    let status = prober.check_health().await;
    let probe_time = started.elapsed().saturating_sub(prober.delay());
    state
        .metrics()
        .record_store("health", probe_time, status.is_healthy());

    let (code, body) = match status {
        HealthStatus::Healthy => (StatusCode::OK, "OK\n"),
        HealthStatus::Unhealthy(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DB_ERROR\n"),
    };
    (code, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().render();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

pub async fn hits(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let res = state.counter().increment_and_get().await;
    state
        .metrics()
        .record_store("hits", started.elapsed(), res.is_ok());

    match res {
        Ok(total) => (StatusCode::OK, Json(HitsBody { total })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "hits: increment failed");
            let body = ErrorBody {
                error: e.client_code().as_str(),
                detail: e.detail(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

pub async fn greeting() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        GREETING,
    )
}
