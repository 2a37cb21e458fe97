use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState};

#[derive(Deserialize)]
pub struct SecurityReportQuery {
    #[serde(default)]
    pub token: String,
}

/// GET /auth/security-report?token=...
/// Unauthenticated by design: the link arrives in a password-change email
/// and must work for a victim who can no longer log in. Locks the account,
/// opens the support ticket and notifies the owner, then redirects the
/// browser to a confirmation page.
pub async fn security_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SecurityReportQuery>,
) -> Result<Redirect, ApiError> {
    state.security().report(&query.token).await?;

    let base_url = {
        let config = state.config().read().await;
        config.branding.base_url.trim_end_matches('/').to_string()
    };

    Ok(Redirect::to(&format!("{base_url}/conta-bloqueada")))
}
