use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{EmailRequest, MessageResponse};

#[derive(Deserialize)]
pub struct AdminResetRequest {
    pub token: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LojistaResetRequest {
    pub token: String,
    pub senha: String,
}

/// Identical body for every reset/resend request, whether or not the
/// account exists. Comparing responses must reveal nothing.
fn soft_success() -> Json<ApiResponse<MessageResponse>> {
    Json(ApiResponse::success(MessageResponse {
        message: "Se o e-mail estiver cadastrado, você receberá as instruções em instantes"
            .to_string(),
    }))
}

/// POST /auth/forgot-password-admin
pub async fn forgot_password_admin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .password_reset()
        .request_admin_reset(&payload.email)
        .await?;

    Ok(soft_success())
}

/// POST /auth/reset-password-admin
pub async fn reset_password_admin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AdminResetRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .password_reset()
        .reset_admin_password(&payload.token, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Senha atualizada com sucesso".to_string(),
    })))
}

/// POST /auth/redefinir-senha
pub async fn redefinir_senha(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .password_reset()
        .request_lojista_reset(&payload.email)
        .await?;

    Ok(soft_success())
}

/// POST /auth/nova-senha
pub async fn nova_senha(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LojistaResetRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .password_reset()
        .reset_lojista_password(&payload.token, &payload.senha)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Senha atualizada com sucesso".to_string(),
    })))
}
