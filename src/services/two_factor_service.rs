//! TOTP enrollment and verification.
//!
//! State machine: disabled -> enrolling -> enabled -> disabled. The
//! candidate secret is stored on the account row between `generate` and
//! `enable`; disabling requires the current password so a stolen session
//! token cannot remove the protection it is guarded by.

use serde::Serialize;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::db::Store;
use crate::services::auth_service::AuthError;
use crate::services::password;

/// RFC 6238 parameters: SHA1, 6 digits, 30-second step, ±1 step skew.
fn build_totp(secret_bytes: Vec<u8>, issuer: &str, account: &str) -> Result<TOTP, AuthError> {
    TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        secret_bytes,
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|e| AuthError::Internal(format!("TOTP init: {e}")))
}

/// Generate a fresh enrollment: `(base32_secret, otpauth_uri)`.
pub fn generate_enrollment(issuer: &str, account: &str) -> Result<(String, String), AuthError> {
    let secret = Secret::generate_secret();
    let secret_bytes = secret
        .to_bytes()
        .map_err(|e| AuthError::Internal(format!("TOTP secret bytes: {e}")))?;

    let totp = build_totp(secret_bytes, issuer, account)?;

    Ok((secret.to_encoded().to_string(), totp.get_url()))
}

/// Verify a 6-digit code against a stored base32 secret.
pub fn verify_code(
    base32_secret: &str,
    code: &str,
    issuer: &str,
    account: &str,
) -> Result<bool, AuthError> {
    let secret_bytes = Secret::Encoded(base32_secret.to_string())
        .to_bytes()
        .map_err(|e| AuthError::Internal(format!("TOTP secret decode: {e}")))?;

    let totp = build_totp(secret_bytes, issuer, account)?;

    totp.check_current(code)
        .map_err(|e| AuthError::Internal(format!("TOTP check: {e}")))
}

/// Returned once, at enrollment. The shared secret is never exposed again.
#[derive(Debug, Clone, Serialize)]
pub struct TwoFactorEnrollment {
    pub secret: String,
    pub otpauth_url: String,
}

pub struct TwoFactorService {
    store: Store,
    issuer: String,
}

impl TwoFactorService {
    #[must_use]
    pub const fn new(store: Store, issuer: String) -> Self {
        Self { store, issuer }
    }

    /// Start enrollment: generate and stage a candidate secret. Refused
    /// while 2FA is already enabled, so an active secret is never
    /// overwritten.
    pub async fn generate(&self, lojista_id: i32) -> Result<TwoFactorEnrollment, AuthError> {
        let lojista = self
            .store
            .get_lojista_by_id(lojista_id)
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("Lojista {lojista_id} not found")))?;

        if lojista.two_factor_enabled {
            return Err(AuthError::Validation(
                "Two-factor authentication is already enabled; disable it first".to_string(),
            ));
        }

        let (secret, otpauth_url) = generate_enrollment(&self.issuer, &lojista.email)?;

        self.store
            .set_lojista_two_factor_secret(lojista_id, &secret)
            .await?;

        Ok(TwoFactorEnrollment {
            secret,
            otpauth_url,
        })
    }

    /// Confirm enrollment with a code from the authenticator. On failure the
    /// state is left unchanged.
    pub async fn enable(&self, lojista_id: i32, code: &str) -> Result<(), AuthError> {
        let lojista = self
            .store
            .get_lojista_by_id(lojista_id)
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("Lojista {lojista_id} not found")))?;

        let secret = self
            .store
            .get_lojista_two_factor_secret(lojista_id)
            .await?
            .ok_or_else(|| {
                AuthError::Validation("No pending two-factor enrollment".to_string())
            })?;

        if !verify_code(&secret, code, &self.issuer, &lojista.email)? {
            return Err(AuthError::Unauthorized);
        }

        self.store.enable_lojista_two_factor(lojista_id).await?;
        tracing::info!("2FA enabled for lojista {lojista_id}");

        Ok(())
    }

    /// Disable 2FA. Requires the current password, re-verified independently
    /// of the session token; the master password is not accepted here.
    pub async fn disable(&self, lojista_id: i32, current_password: &str) -> Result<(), AuthError> {
        let hash = self
            .store
            .get_lojista_password_hash(lojista_id)
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("Lojista {lojista_id} not found")))?;

        if !password::verify_password_blocking(current_password, &hash).await? {
            return Err(AuthError::Unauthorized);
        }

        self.store.disable_lojista_two_factor(lojista_id).await?;
        tracing::info!("2FA disabled for lojista {lojista_id}");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrollment_produces_base32_secret_and_otpauth_uri() {
        let (secret, uri) = generate_enrollment("Vitrine", "maria@example.com").unwrap();
        assert!(!secret.is_empty());
        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("Vitrine"));
    }

    #[test]
    fn current_code_verifies_and_wrong_code_does_not() {
        let (secret, _) = generate_enrollment("Vitrine", "maria@example.com").unwrap();

        let secret_bytes = Secret::Encoded(secret.clone()).to_bytes().unwrap();
        let totp = build_totp(secret_bytes, "Vitrine", "maria@example.com").unwrap();
        let code = totp.generate_current().unwrap();

        assert!(verify_code(&secret, &code, "Vitrine", "maria@example.com").unwrap());
        assert!(!verify_code(&secret, "000000", "Vitrine", "maria@example.com").unwrap());
    }

    #[test]
    fn garbage_secret_is_an_error() {
        assert!(verify_code("not base32!!", "123456", "Vitrine", "a@b.c").is_err());
    }
}
