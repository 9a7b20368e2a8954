use axum::{
    extract::State,
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use domain::{PortfolioPayload, SectorBreakdown};
use tracing::{info, warn};

use crate::{error::ApiError, services::UpstreamResponse, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/portfolio", get(get_portfolio))
        .route("/portfolio/sectors", get(get_sector_breakdown))
}

async fn fetch_upstream(state: &AppState) -> Result<UpstreamResponse, ApiError> {
    match state.upstream.fetch().await {
        Ok(resp) => {
            info!(status = %resp.status, "upstream portfolio fetched");
            Ok(resp)
        }
        Err(err) => {
            record_outcome(err.outcome());
            warn!(
                error = %err,
                upstream = state.upstream.target(),
                "upstream portfolio fetch failed"
            );
            Err(err.into())
        }
    }
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!("upstream_requests_total", "outcome" => outcome).increment(1);
}

/// Forwards the upstream body byte for byte along with its status.
async fn get_portfolio(State(state): State<AppState>) -> Result<Response, ApiError> {
    let upstream = fetch_upstream(&state).await?;
    record_outcome("ok");
    Ok((
        upstream.status,
        [(CACHE_CONTROL, "no-store"), (CONTENT_TYPE, "application/json")],
        upstream.body,
    )
        .into_response())
}

async fn get_sector_breakdown(State(state): State<AppState>) -> Result<Response, ApiError> {
    let upstream = fetch_upstream(&state).await?;
    let payload = PortfolioPayload::from_slice(&upstream.body).map_err(|err| {
        let err = ApiError::from(err);
        record_outcome(err.outcome());
        warn!(error = %err, "upstream portfolio failed validation");
        err
    })?;
    record_outcome("ok");

    let breakdown: SectorBreakdown = aggregator::breakdown(&payload.portfolio);
    Ok(([(CACHE_CONTROL, "no-store")], Json(breakdown)).into_response())
}
