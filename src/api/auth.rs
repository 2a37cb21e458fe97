use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{AdminDto, IdentityDto, TokenResponse};
use crate::db::{Admin, Lojista};
use crate::services::{Identity, LojistaLogin, TokenService};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct AdminCredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LojistaLoginRequest {
    pub email: String,
    pub senha: String,
}

#[derive(Deserialize)]
pub struct VerifyLogin2faRequest {
    #[serde(rename = "tempToken")]
    pub temp_token: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct LojistaLoginResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(rename = "require2FA", skip_serializing_if = "Option::is_none")]
    pub require_2fa: Option<bool>,

    #[serde(rename = "tempToken", skip_serializing_if = "Option::is_none")]
    pub temp_token: Option<String>,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authenticated principal attached to the request by [`auth_middleware`].
#[derive(Clone)]
pub struct CurrentUser(pub Identity);

/// Bearer-token gate for the protected routes. The token only proves
/// identity; the account row is re-fetched so a lock or demotion applied
/// after issuance takes effect immediately. Partial tokens never pass.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = TokenService::extract_bearer(&headers) else {
        return Err(ApiError::Unauthorized("Missing bearer token".to_string()));
    };

    let identity = state
        .auth_service()
        .resolve_identity(&token)
        .await
        .map_err(ApiError::from)?;

    let Some(identity) = identity else {
        return Err(ApiError::Unauthorized("Invalid or expired token".to_string()));
    };

    request.extensions_mut().insert(CurrentUser(identity));
    Ok(next.run(request).await)
}

/// Active-admin guard for admin-only handlers.
pub fn require_admin(user: &CurrentUser) -> Result<&Admin, ApiError> {
    match &user.0 {
        Identity::Admin(admin) => Ok(admin),
        _ => Err(ApiError::forbidden("Admin access required")),
    }
}

pub fn require_lojista(user: &CurrentUser) -> Result<&Lojista, ApiError> {
    match &user.0 {
        Identity::Lojista(lojista) => Ok(lojista),
        _ => Err(ApiError::forbidden("Lojista access required")),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/setup
/// Bootstrap/create an admin account. The first account ever created is
/// activated immediately; later ones await approval.
pub async fn setup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AdminCredentialsRequest>,
) -> Result<Json<ApiResponse<AdminDto>>, ApiError> {
    let admin = state
        .auth_service()
        .setup_admin(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(AdminDto::from(admin))))
}

/// POST /auth/login
/// Admin login, returns a session token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AdminCredentialsRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let token = state
        .auth_service()
        .login_admin(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(TokenResponse { token })))
}

/// POST /auth/login-lojista
/// Lojista login. Returns a session token, or `require2FA` plus a partial
/// token when the step-up applies. An unverified email is disclosed with
/// the address so the UI can offer a resend.
pub async fn login_lojista(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LojistaLoginRequest>,
) -> Result<Response, ApiError> {
    use crate::services::AuthError;

    let outcome = state
        .auth_service()
        .login_lojista(&payload.email, &payload.senha)
        .await;

    match outcome {
        Ok(LojistaLogin::Success { token }) => {
            let body = ApiResponse::success(LojistaLoginResponse {
                token: Some(token),
                require_2fa: None,
                temp_token: None,
            });
            Ok(Json(body).into_response())
        }
        Ok(LojistaLogin::RequireTwoFactor { temp_token }) => {
            let body = ApiResponse::success(LojistaLoginResponse {
                token: None,
                require_2fa: Some(true),
                temp_token: Some(temp_token),
            });
            Ok(Json(body).into_response())
        }
        Err(AuthError::EmailNotVerified { email }) => {
            let body = serde_json::json!({
                "success": false,
                "error": "Email not verified",
                "email_nao_verificado": true,
                "email": email,
            });
            Ok((StatusCode::FORBIDDEN, Json(body)).into_response())
        }
        Err(e) => Err(ApiError::from(e)),
    }
}

/// POST /auth/verify-login-2fa
/// Completes the 2FA step-up: partial token + 6-digit code in, full session
/// token out. A wrong code leaves the partial token usable for a retry.
pub async fn verify_login_2fa(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyLogin2faRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let token = state
        .auth_service()
        .verify_login_2fa(&payload.temp_token, &payload.code)
        .await?;

    Ok(Json(ApiResponse::success(TokenResponse { token })))
}

/// GET /auth/me
/// Resolves the current identity, or `null` for the anonymous case —
/// absent, invalid, expired and partial tokens all land there.
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Option<IdentityDto>>>, ApiError> {
    let Some(token) = TokenService::extract_bearer(&headers) else {
        return Ok(Json(ApiResponse::success(None)));
    };

    let identity = state.auth_service().resolve_identity(&token).await?;

    let dto = identity.map(|identity| match identity {
        Identity::Admin(admin) => IdentityDto {
            id: admin.id,
            role: "admin".to_string(),
            email: Some(admin.email),
            nome: None,
            status: Some(admin.status),
        },
        Identity::Lojista(lojista) => IdentityDto {
            id: lojista.id,
            role: "lojista".to_string(),
            email: Some(lojista.email),
            nome: Some(lojista.nome),
            status: None,
        },
        Identity::Customer { id } => IdentityDto {
            id,
            role: "customer".to_string(),
            email: None,
            nome: None,
            status: None,
        },
    });

    Ok(Json(ApiResponse::success(dto)))
}

/// GET /notificacoes
/// The signed-in lojista's notification feed.
pub async fn list_notificacoes(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<crate::api::types::NotificacaoDto>>>, ApiError> {
    let lojista = require_lojista(&user)?;

    let notificacoes = state
        .store()
        .list_notificacoes_for_lojista(lojista.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list notifications: {e}")))?;

    Ok(Json(ApiResponse::success(
        notificacoes
            .into_iter()
            .map(crate::api::types::NotificacaoDto::from)
            .collect(),
    )))
}
