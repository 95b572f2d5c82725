pub(crate) mod health;
pub(crate) mod metrics;
pub(crate) mod trigger;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::app::AppState;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(metrics::exporter))
        .route("/v1/cycles/run", post(trigger::run_cycle_now))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
