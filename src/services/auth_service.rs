//! Domain service for authentication and session issuance.
//!
//! Covers admin bootstrap/login, lojista login with the 2FA step-up, and
//! stateless identity resolution for bearer tokens.

use thiserror::Error;

use crate::db::{Admin, Lojista};

/// Errors shared by the authentication-adjacent services. Each variant maps
/// onto exactly one HTTP status at the API boundary.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Admin account created but not yet approved by an active admin.
    /// Deliberately distinct from bad credentials so the user can
    /// self-serve.
    #[error("Account awaiting approval")]
    AwaitingApproval,

    /// Lojista login refused until the address is verified. Carries the
    /// email so the UI can offer a resend action.
    #[error("Email not verified")]
    EmailNotVerified { email: String },

    /// Security lock. No session token is issued while set.
    #[error("Account blocked")]
    Blocked,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Outcome of a lojista credential check.
#[derive(Debug, Clone)]
pub enum LojistaLogin {
    /// Full session token issued.
    Success { token: String },

    /// 2FA step-up required: only a short-lived partial token is issued,
    /// accepted solely by the 2FA-completion endpoint.
    RequireTwoFactor { temp_token: String },
}

/// Resolved principal behind a verified bearer token, re-checked against
/// the current account row.
#[derive(Debug, Clone)]
pub enum Identity {
    Admin(Admin),
    Lojista(Lojista),
    /// Storefront shopper. Customer accounts live with the storefront
    /// code; only the token claims exist here.
    Customer { id: i32 },
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Bootstrap/create an admin account. The first account ever created is
    /// auto-activated as the master account; later ones start pending.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] when the email is already taken.
    async fn setup_admin(&self, email: &str, password: &str) -> Result<Admin, AuthError>;

    /// Verify admin credentials and issue a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AwaitingApproval`] for pending accounts with
    /// correct credentials, [`AuthError::InvalidCredentials`] otherwise.
    async fn login_admin(&self, email: &str, password: &str) -> Result<String, AuthError>;

    /// Verify lojista credentials. Issues a full token, or a partial token
    /// plus `RequireTwoFactor` when 2FA is enabled and the login was not a
    /// master-password override.
    async fn login_lojista(&self, email: &str, password: &str)
    -> Result<LojistaLogin, AuthError>;

    /// Complete the 2FA step-up: accepts only an unexpired token marked
    /// `partial`, verifies the code, and issues the full session token. A
    /// failed code does not consume the partial token.
    async fn verify_login_2fa(&self, temp_token: &str, code: &str)
    -> Result<String, AuthError>;

    /// Resolve the principal behind a bearer token, or `None` for the
    /// anonymous case (absent, invalid, expired or partial tokens, and
    /// accounts that have since been locked or demoted).
    async fn resolve_identity(&self, token: &str) -> Result<Option<Identity>, AuthError>;
}
