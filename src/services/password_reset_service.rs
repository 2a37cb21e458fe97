//! One-time password-reset tokens for both account tables.
//!
//! Requests are anti-enumeration: the caller gets an identical
//! success-shaped answer whether or not the email exists. Admin and lojista
//! tokens live in their own columns and are independent token spaces.

use std::sync::Arc;

use crate::clients::mailer::{Mailer, templates};
use crate::config::{BrandingConfig, SecurityConfig};
use crate::db::Store;
use crate::services::auth_service::AuthError;
use crate::services::password;

pub struct PasswordResetService {
    store: Store,
    mailer: Arc<dyn Mailer>,
    branding: BrandingConfig,
    security: SecurityConfig,
}

impl PasswordResetService {
    #[must_use]
    pub fn new(
        store: Store,
        mailer: Arc<dyn Mailer>,
        branding: BrandingConfig,
        security: SecurityConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            branding,
            security,
        }
    }

    fn expiry(&self) -> String {
        (chrono::Utc::now() + chrono::Duration::minutes(self.security.reset_token_ttl_minutes))
            .to_rfc3339()
    }

    fn validate_new_password(&self, new_password: &str) -> Result<(), AuthError> {
        if new_password.len() < self.security.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.security.min_password_length
            )));
        }
        Ok(())
    }

    /// Always succeeds from the caller's perspective. Only an existing admin
    /// gets a token stored and an email dispatched.
    pub async fn request_admin_reset(&self, email: &str) -> Result<(), AuthError> {
        let Some(admin) = self.store.get_admin_by_email(email).await? else {
            return Ok(());
        };

        let token = password::generate_one_time_token();
        self.store
            .set_admin_reset_token(admin.id, &token, &self.expiry())
            .await?;

        let link = templates::reset_link(&self.branding, &token, true);
        let html = templates::email_redefinicao_senha_html(&admin.email, &link, &self.branding);

        if let Err(e) = self
            .mailer
            .send(&admin.email, "Redefinição de senha", &html)
            .await
        {
            tracing::warn!("Failed to send admin reset email: {e}");
        }

        Ok(())
    }

    pub async fn reset_admin_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.validate_new_password(new_password)?;

        let hash = password::hash_password_blocking(new_password, &self.security).await?;

        if !self.store.redeem_admin_reset_token(token, &hash).await? {
            return Err(AuthError::Validation(
                "Invalid or expired reset token".to_string(),
            ));
        }

        Ok(())
    }

    /// Anti-enumeration, same shape as the admin variant.
    pub async fn request_lojista_reset(&self, email: &str) -> Result<(), AuthError> {
        let Some(lojista) = self.store.get_lojista_by_email(email).await? else {
            return Ok(());
        };

        let token = password::generate_one_time_token();
        self.store
            .set_lojista_reset_token(lojista.id, &token, &self.expiry())
            .await?;

        let link = templates::reset_link(&self.branding, &token, false);
        let html = templates::email_redefinicao_senha_html(&lojista.nome, &link, &self.branding);

        if let Err(e) = self
            .mailer
            .send(&lojista.email, "Redefinição de senha", &html)
            .await
        {
            tracing::warn!("Failed to send lojista reset email: {e}");
        }

        Ok(())
    }

    /// Redeem a lojista reset token. A successful password change also
    /// attaches a fresh security-report token and notifies the owner — the
    /// escape hatch if the change was not theirs.
    pub async fn reset_lojista_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.validate_new_password(new_password)?;

        let hash = password::hash_password_blocking(new_password, &self.security).await?;

        let Some(lojista) = self.store.redeem_lojista_reset_token(token, &hash).await? else {
            return Err(AuthError::Validation(
                "Invalid or expired reset token".to_string(),
            ));
        };

        let security_token = password::generate_one_time_token();
        self.store
            .set_lojista_security_token(lojista.id, &security_token)
            .await?;

        let link = templates::security_report_link(&self.branding, &security_token);
        let html = templates::email_alerta_senha_html(&lojista.nome, &link, &self.branding);

        if let Err(e) = self
            .mailer
            .send(&lojista.email, "Sua senha foi alterada", &html)
            .await
        {
            tracing::warn!("Failed to send password-change notice: {e}");
        }

        Ok(())
    }
}
