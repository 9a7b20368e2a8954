use std::sync::Arc;

use crate::services::UpstreamSource;

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn UpstreamSource>,
}

impl AppState {
    pub fn new(upstream: Arc<dyn UpstreamSource>) -> Self {
        Self { upstream }
    }
}

// Axum state must be shareable across handler tasks.
#[allow(dead_code)]
fn _assert_state_bounds() {
    fn assert_bounds<T: Clone + Send + Sync + 'static>() {}
    assert_bounds::<AppState>();
}
