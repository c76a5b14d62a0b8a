//! Readiness endpoint backed by a real MongoDB ping

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use database::mongodb::check_health_detailed;

use crate::state::AppState;

/// 200 when MongoDB answers a ping, 503 otherwise
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "mongodb",
        Box::pin(async {
            let status = check_health_detailed(&state.mongo_client).await;
            tracing::debug!(latency_ms = status.response_time_ms, "MongoDB ping");
            if status.healthy {
                Ok(())
            } else {
                Err(format!(
                    "MongoDB ping failed: {}",
                    status.message.unwrap_or_default()
                ))
            }
        }),
    )];

    match run_health_checks(checks).await {
        Ok((status, json)) => (status, json).into_response(),
        Err((status, json)) => (status, json).into_response(),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(ready_handler))
        .with_state(state)
}
