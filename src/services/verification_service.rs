//! Lojista registration and the email-verification gate.

use regex::Regex;
use std::sync::Arc;
use std::sync::OnceLock;

use crate::clients::mailer::{Mailer, templates};
use crate::config::{BrandingConfig, SecurityConfig};
use crate::db::{Lojista, Store};
use crate::services::auth_service::AuthError;
use crate::services::password;

fn email_regex() -> &'static Regex {
    static INSTANCE: OnceLock<Regex> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
    })
}

pub struct EmailVerificationService {
    store: Store,
    mailer: Arc<dyn Mailer>,
    branding: BrandingConfig,
    security: SecurityConfig,
}

impl EmailVerificationService {
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

    async fn send_verification_email(&self, lojista: &Lojista, token: &str) {
        let link = templates::verification_link(&self.branding, token);
        let html = templates::email_verificacao_html(&lojista.nome, &link, &self.branding);

        if let Err(e) = self
            .mailer
            .send(&lojista.email, "Confirme seu e-mail", &html)
            .await
        {
            tracing::warn!("Failed to send verification email: {e}");
        }
    }

    /// Register a lojista with an unredeemed verification token and hand
    /// the verification link to the mail collaborator.
    pub async fn register(
        &self,
        email: &str,
        nome: &str,
        telefone: Option<&str>,
        password: &str,
    ) -> Result<Lojista, AuthError> {
        if nome.trim().is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }
        if !email_regex().is_match(email.trim()) {
            return Err(AuthError::Validation("Invalid email address".to_string()));
        }
        if password.len() < self.security.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.security.min_password_length
            )));
        }

        let hash = password::hash_password_blocking(password, &self.security).await?;
        let token = password::generate_one_time_token();

        let lojista = self
            .store
            .create_lojista(email, nome.trim(), telefone, &hash, &token)
            .await?
            .ok_or_else(|| AuthError::Conflict("Email already registered".to_string()))?;

        tracing::info!("Lojista {} registered, verification pending", lojista.email);

        self.send_verification_email(&lojista, &token).await;

        Ok(lojista)
    }

    /// Redeem a verification token. "Already used" and "never existed" are
    /// deliberately indistinguishable to the caller.
    pub async fn verify(&self, token: &str) -> Result<Lojista, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Validation(
                "Invalid or already used verification link".to_string(),
            ));
        }

        self.store
            .redeem_verification_token(token)
            .await?
            .ok_or_else(|| {
                AuthError::Validation("Invalid or already used verification link".to_string())
            })
    }

    /// Anti-enumeration resend: always success-shaped; a token is only
    /// rotated and mailed for an existing, still-unverified account.
    pub async fn resend(&self, email: &str) -> Result<(), AuthError> {
        let Some(lojista) = self.store.get_lojista_by_email(email).await? else {
            return Ok(());
        };

        if lojista.email_verificado {
            return Ok(());
        }

        let token = password::generate_one_time_token();
        self.store
            .rotate_verification_token(lojista.id, &token)
            .await?;

        self.send_verification_email(&lojista, &token).await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plausible_addresses() {
        assert!(email_regex().is_match("maria@example.com"));
        assert!(email_regex().is_match("a.b+c@sub.domain.co"));
    }

    #[test]
    fn email_regex_rejects_garbage() {
        assert!(!email_regex().is_match("not-an-email"));
        assert!(!email_regex().is_match("a b@example.com"));
        assert!(!email_regex().is_match("missing@tld"));
    }
}
