use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::{CurrentUser, require_lojista};
use super::{ApiError, ApiResponse, AppState};
use crate::api::types::MessageResponse;
use crate::services::TwoFactorEnrollment;

#[derive(Deserialize)]
pub struct EnableRequest {
    pub code: String,
}

#[derive(Deserialize)]
pub struct DisableRequest {
    pub senha: String,
}

/// POST /2fa/generate
/// Stages a fresh shared secret and returns it once, with the otpauth URI
/// for QR provisioning. The account is not enabled until the code is
/// confirmed.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<TwoFactorEnrollment>>, ApiError> {
    let lojista = require_lojista(&user)?;

    let enrollment = state.two_factor().generate(lojista.id).await?;

    Ok(Json(ApiResponse::success(enrollment)))
}

/// POST /2fa/enable
/// Confirms the staged secret with a code from the authenticator.
pub async fn enable(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<EnableRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let lojista = require_lojista(&user)?;

    state.two_factor().enable(lojista.id, &payload.code).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Autenticação em duas etapas ativada".to_string(),
    })))
}

/// POST /2fa/disable
/// Requires the current password, not just the session token, so a stolen
/// token cannot strip the protection.
pub async fn disable(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<DisableRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let lojista = require_lojista(&user)?;

    state
        .two_factor()
        .disable(lojista.id, &payload.senha)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Autenticação em duas etapas desativada".to_string(),
    })))
}
