use axum::{
    Extension, Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::auth::{CurrentUser, require_admin};
use super::{ApiError, ApiResponse, AppState};
use crate::api::types::{AdminDto, MessageResponse, TicketDto};

/// GET /admins
/// Listing for the approval UI. Active-admin only.
pub async fn list_admins(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<AdminDto>>>, ApiError> {
    require_admin(&user)?;

    let admins = state
        .store()
        .list_admins()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list admins: {e}")))?;

    Ok(Json(ApiResponse::success(
        admins.into_iter().map(AdminDto::from).collect(),
    )))
}

/// PATCH /admins/{id}
/// Approve a pending admin. Approving an already-active admin is a no-op.
pub async fn approve_admin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AdminDto>>, ApiError> {
    require_admin(&user)?;

    let admin = state
        .store()
        .activate_admin(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to approve admin: {e}")))?
        .ok_or_else(|| ApiError::not_found("Admin", id))?;

    tracing::info!("Admin {} approved", admin.email);

    Ok(Json(ApiResponse::success(AdminDto::from(admin))))
}

/// DELETE /admins/{id}
/// Remove an admin account. Self-removal is refused.
pub async fn delete_admin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let current = require_admin(&user)?;

    if current.id == id {
        return Err(ApiError::validation("You cannot remove your own account"));
    }

    let removed = state
        .store()
        .delete_admin(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete admin: {e}")))?;

    if !removed {
        return Err(ApiError::not_found("Admin", id));
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Admin removido".to_string(),
    })))
}

/// POST /tickets/{id}/resolver
/// Resolve a support ticket. Resolving a `compromisso_conta` ticket is the
/// only path that clears the account's security lock.
pub async fn resolve_ticket(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<TicketDto>>, ApiError> {
    require_admin(&user)?;

    let ticket = state.security().resolve_ticket(id).await?;

    Ok(Json(ApiResponse::success(TicketDto::from(ticket))))
}
