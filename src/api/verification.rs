use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{EmailRequest, LojistaDto, MessageResponse};

#[derive(Deserialize)]
pub struct RegisterLojistaRequest {
    pub nome: String,
    pub email: String,
    pub telefone: Option<String>,
    pub senha: String,
}

#[derive(Deserialize)]
pub struct VerifyTokenQuery {
    #[serde(default)]
    pub token: String,
}

/// POST /auth/registrar-lojista
/// Creates the lojista account and dispatches the verification email.
/// Login stays refused until the link is redeemed.
pub async fn registrar_lojista(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterLojistaRequest>,
) -> Result<Json<ApiResponse<LojistaDto>>, ApiError> {
    let lojista = state
        .verification()
        .register(
            &payload.email,
            &payload.nome,
            payload.telefone.as_deref(),
            &payload.senha,
        )
        .await?;

    Ok(Json(ApiResponse::success(LojistaDto::from(lojista))))
}

/// GET /auth/verificar-email?token=...
/// Redeems a one-time verification token.
pub async fn verificar_email(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyTokenQuery>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.verification().verify(&query.token).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "E-mail verificado com sucesso".to_string(),
    })))
}

/// POST /auth/reenviar-verificacao
/// Anti-enumeration resend: the response never says whether the account
/// exists or was already verified.
pub async fn reenviar_verificacao(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EmailRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.verification().resend(&payload.email).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Se o e-mail estiver cadastrado, você receberá as instruções em instantes"
            .to_string(),
    })))
}
