//! Axum router wiring.
//!
//! Routes are method-agnostic. Every request except `/metrics` is counted
//! once it has been answered.

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::any,
    Router,
};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", any(ops::health))
        .route("/metrics", any(ops::metrics))
        .route("/hits", any(ops::hits))
        .fallback(ops::greeting)
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .with_state(state)
}

/// Bounded route label so arbitrary paths cannot blow up cardinality.
fn route_label(path: &str) -> &'static str {
    match path {
        "/health" => "health",
        "/hits" => "hits",
        "/metrics" => "metrics",
        _ => "other",
    }
}

async fn count_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let route = route_label(req.uri().path());
    let res = next.run(req).await;
    if route != "metrics" {
        state.metrics().record_request(route);
    }
    res
}
