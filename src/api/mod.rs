use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod admins;
mod error;
mod observability;
mod password;
mod security;
mod system;
mod two_factor;
mod types;
mod verification;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn two_factor(&self) -> &crate::services::TwoFactorService {
        &self.shared.two_factor
    }

    #[must_use]
    pub fn password_reset(&self) -> &crate::services::PasswordResetService {
        &self.shared.password_reset
    }

    #[must_use]
    pub fn verification(&self) -> &crate::services::EmailVerificationService {
        &self.shared.verification
    }

    #[must_use]
    pub fn security(&self) -> &crate::services::SecurityIncidentService {
        &self.shared.security
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle).await)
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = {
        let config = state.config().read().await;
        config.server.cors_allowed_origins.clone()
    };

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/setup", post(auth::setup))
        .route("/auth/login", post(auth::login))
        .route("/auth/login-lojista", post(auth::login_lojista))
        .route("/auth/verify-login-2fa", post(auth::verify_login_2fa))
        .route("/auth/me", get(auth::me))
        .route(
            "/auth/registrar-lojista",
            post(verification::registrar_lojista),
        )
        .route("/auth/verificar-email", get(verification::verificar_email))
        .route(
            "/auth/reenviar-verificacao",
            post(verification::reenviar_verificacao),
        )
        .route(
            "/auth/forgot-password-admin",
            post(password::forgot_password_admin),
        )
        .route(
            "/auth/reset-password-admin",
            post(password::reset_password_admin),
        )
        .route("/auth/redefinir-senha", post(password::redefinir_senha))
        .route("/auth/nova-senha", post(password::nova_senha))
        .route("/auth/security-report", get(security::security_report))
        .route("/system/status", get(system::get_status))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::track_requests))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/2fa/generate", post(two_factor::generate))
        .route("/2fa/enable", post(two_factor::enable))
        .route("/2fa/disable", post(two_factor::disable))
        .route("/notificacoes", get(auth::list_notificacoes))
        .route("/admins", get(admins::list_admins))
        .route("/admins/{id}", patch(admins::approve_admin))
        .route("/admins/{id}", delete(admins::delete_admin))
        .route("/tickets/{id}/resolver", post(admins::resolve_ticket))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
