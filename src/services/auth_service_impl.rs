//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::SecurityConfig;
use crate::db::{Admin, Store};
use crate::services::auth_service::{AuthError, AuthService, Identity, LojistaLogin};
use crate::services::password;
use crate::services::token::{Role, TokenService};
use crate::services::two_factor_service;

pub struct SeaOrmAuthService {
    store: Store,
    tokens: Arc<TokenService>,
    security: SecurityConfig,
    totp_issuer: String,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(
        store: Store,
        tokens: Arc<TokenService>,
        security: SecurityConfig,
        totp_issuer: String,
    ) -> Self {
        Self {
            store,
            tokens,
            security,
            totp_issuer,
        }
    }

    /// Master-password check: a configured platform override that matches
    /// the submitted password authenticates without touching the stored
    /// hash. Privileged bypass path; always leaves an audit trail.
    fn is_master_login(&self, password: &str, account: &str) -> bool {
        let matches = self
            .security
            .master_password
            .as_deref()
            .is_some_and(|master| !master.is_empty() && master == password);

        if matches {
            tracing::warn!("Master-password login used for account {account}");
        }

        matches
    }

    fn validate_credentials_shape(email: &str, password: &str) -> Result<(), AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::Validation("Email is required".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn setup_admin(&self, email: &str, password: &str) -> Result<Admin, AuthError> {
        Self::validate_credentials_shape(email, password)?;

        if password.len() < self.security.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.security.min_password_length
            )));
        }

        let hash = password::hash_password_blocking(password, &self.security).await?;

        let admin = self
            .store
            .create_admin(email, &hash)
            .await?
            .ok_or_else(|| AuthError::Conflict("Email already registered".to_string()))?;

        tracing::info!(
            "Admin {} created with status {}",
            admin.email,
            admin.status
        );

        Ok(admin)
    }

    async fn login_admin(&self, email: &str, password: &str) -> Result<String, AuthError> {
        Self::validate_credentials_shape(email, password)?;

        let Some((admin, hash)) = self.store.get_admin_by_email_with_password(email).await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        if !self.is_master_login(password, email)
            && !password::verify_password_blocking(password, &hash).await?
        {
            return Err(AuthError::InvalidCredentials);
        }

        // Disclosed only after the credentials checked out, so the pending
        // state is not probeable.
        if !admin.is_active() {
            return Err(AuthError::AwaitingApproval);
        }

        Ok(self.tokens.sign_admin(admin.id)?)
    }

    async fn login_lojista(
        &self,
        email: &str,
        password: &str,
    ) -> Result<LojistaLogin, AuthError> {
        Self::validate_credentials_shape(email, password)?;

        let Some((lojista, hash)) =
            self.store.get_lojista_by_email_with_password(email).await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        let master_login = self.is_master_login(password, email);

        if !master_login && !password::verify_password_blocking(password, &hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        // Security lock wins over everything, password correctness included.
        if lojista.bloqueado {
            return Err(AuthError::Blocked);
        }

        if !lojista.verification_satisfied() {
            return Err(AuthError::EmailNotVerified {
                email: lojista.email,
            });
        }

        // Master-password logins skip the step-up so the support team is
        // never locked out by a tenant's authenticator.
        if lojista.two_factor_enabled && !master_login {
            let temp_token = self.tokens.sign_partial(lojista.id)?;
            return Ok(LojistaLogin::RequireTwoFactor { temp_token });
        }

        let token = self.tokens.sign_lojista(lojista.id)?;
        Ok(LojistaLogin::Success { token })
    }

    async fn verify_login_2fa(
        &self,
        temp_token: &str,
        code: &str,
    ) -> Result<String, AuthError> {
        let Some(claims) = self.tokens.verify(temp_token) else {
            return Err(AuthError::Unauthorized);
        };

        // The partial lojista token is the only claim combination accepted
        // here; anything else is not a step-up in progress.
        if !claims.partial || claims.role != Role::Lojista {
            return Err(AuthError::Unauthorized);
        }

        let Some(lojista) = self.store.get_lojista_by_id(claims.sub).await? else {
            return Err(AuthError::Unauthorized);
        };

        // The lock may have been set after the partial token was issued.
        if lojista.bloqueado {
            return Err(AuthError::Blocked);
        }

        let secret = self
            .store
            .get_lojista_two_factor_secret(lojista.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !two_factor_service::verify_code(&secret, code, &self.totp_issuer, &lojista.email)? {
            // Not consumed: the caller may retry until the partial token
            // itself expires.
            return Err(AuthError::Unauthorized);
        }

        Ok(self.tokens.sign_lojista(lojista.id)?)
    }

    async fn resolve_identity(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        let Some(claims) = self.tokens.verify(token) else {
            return Ok(None);
        };

        if claims.partial {
            return Ok(None);
        }

        // Token claims are never trusted for anything that can change
        // account-side after issuance; the current row decides.
        match claims.role {
            Role::Admin => {
                let admin = self.store.get_admin_by_id(claims.sub).await?;
                Ok(admin
                    .filter(Admin::is_active)
                    .map(Identity::Admin))
            }
            Role::Lojista => {
                let lojista = self.store.get_lojista_by_id(claims.sub).await?;
                Ok(lojista
                    .filter(|l| !l.bloqueado)
                    .map(Identity::Lojista))
            }
            Role::Customer => Ok(Some(Identity::Customer { id: claims.sub })),
        }
    }
}
