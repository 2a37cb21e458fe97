use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub database: String,
}

/// GET /system/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let database = match state.store().ping().await {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::error!("Database ping failed: {e}");
            "unavailable".to_string()
        }
    };

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        database,
    })))
}
