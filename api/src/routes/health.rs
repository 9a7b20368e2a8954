use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    upstream: String,
}

/// Liveness only; the upstream is named but never contacted here.
async fn healthz(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        upstream: state.upstream.target().to_string(),
    })
}
