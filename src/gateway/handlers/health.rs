//! Health check handler

use axum::Json;
use utoipa::ToSchema;

use crate::core_types::now_millis;

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_i64)]
    pub timestamp_ms: i64,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp_ms: now_millis(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let Json(resp) = health_check().await;
        assert_eq!(resp.status, "ok");
        assert!(resp.timestamp_ms > 0);
    }
}
