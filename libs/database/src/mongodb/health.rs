use mongodb::Client;
use std::time::Instant;

use super::connector::ping;

/// Health check status for MongoDB
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Error details when unhealthy
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Check MongoDB health with a `ping` command
pub async fn check_health(client: &Client) -> bool {
    ping(client).await.is_ok()
}

/// Check MongoDB health, reporting latency and any error
///
/// # Example
/// ```ignore
/// let status = database::mongodb::check_health_detailed(&client).await;
/// if !status.healthy {
///     tracing::warn!("MongoDB unhealthy: {:?}", status.message);
/// }
/// ```
pub async fn check_health_detailed(client: &Client) -> HealthStatus {
    let start = Instant::now();
    let result = ping(client).await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => HealthStatus {
            healthy: true,
            message: None,
            response_time_ms,
        },
        Err(e) => HealthStatus {
            healthy: false,
            message: Some(e.to_string()),
            response_time_ms,
        },
    }
}
