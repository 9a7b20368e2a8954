use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::{config::AppConfig, services::HttpUpstream, state::AppState};

pub fn build_state(config: &AppConfig) -> Result<AppState> {
    let upstream = HttpUpstream::new(config.upstream_url.clone(), config.upstream_timeout)?;
    info!(
        upstream = %config.upstream_url,
        timeout_secs = config.upstream_timeout.as_secs(),
        "portfolio upstream configured"
    );
    Ok(AppState::new(Arc::new(upstream)))
}
