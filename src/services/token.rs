//! Signed, time-bounded session tokens.
//!
//! Tokens are the only session state in the system: there is no server-side
//! session table, so revocation before natural expiry happens by re-checking
//! the account row at a lower layer, never here. A restricted `partial`
//! class bridges the gap between password check and 2FA completion.

use axum::http::{HeaderMap, header};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Principal role carried by every token. Exhaustively matched at every
/// consumer; never inferred from which optional claim happens to be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Lojista,
    Customer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject account id.
    pub sub: i32,

    pub role: Role,

    /// Denormalized tenant id, present for lojista tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lojista_id: Option<i32>,

    /// Restricted pre-2FA token. Accepted only by the 2FA-completion step.
    #[serde(default)]
    pub partial: bool,

    pub iat: i64,

    pub exp: i64,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    session_ttl: Duration,
    partial_ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &[u8], session_ttl: Duration, partial_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            session_ttl,
            partial_ttl,
        }
    }

    pub fn sign_admin(&self, id: i32) -> anyhow::Result<String> {
        self.sign(Claims {
            sub: id,
            role: Role::Admin,
            lojista_id: None,
            partial: false,
            iat: 0,
            exp: 0,
        })
    }

    pub fn sign_lojista(&self, id: i32) -> anyhow::Result<String> {
        self.sign(Claims {
            sub: id,
            role: Role::Lojista,
            lojista_id: Some(id),
            partial: false,
            iat: 0,
            exp: 0,
        })
    }

    /// Short-lived token bridging the 2FA step. Rejected by every
    /// capability-bearing endpoint.
    pub fn sign_partial(&self, lojista_id: i32) -> anyhow::Result<String> {
        self.sign(Claims {
            sub: lojista_id,
            role: Role::Lojista,
            lojista_id: Some(lojista_id),
            partial: true,
            iat: 0,
            exp: 0,
        })
    }

    fn sign(&self, mut claims: Claims) -> anyhow::Result<String> {
        let now = Utc::now().timestamp();
        let ttl = if claims.partial {
            self.partial_ttl
        } else {
            self.session_ttl
        };

        claims.iat = now;
        claims.exp = now + ttl.as_secs() as i64;

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to sign token: {e}"))
    }

    /// Signature and expiry check. Any malformed, expired or tampered token
    /// is `None` — callers uniformly treat that as "not authenticated".
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .ok()
    }

    /// Pull the bearer credential from the authorization header. Absence is
    /// the anonymous case, not an error.
    #[must_use]
    pub fn extract_bearer(headers: &HeaderMap) -> Option<String> {
        let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        auth.strip_prefix("Bearer ").map(|t| t.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            b"test-secret",
            Duration::from_secs(3600),
            Duration::from_secs(300),
        )
    }

    #[test]
    fn admin_token_roundtrip() {
        let svc = service();
        let token = svc.sign_admin(7).unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.lojista_id, None);
        assert!(!claims.partial);
    }

    #[test]
    fn lojista_token_carries_tenant_id() {
        let svc = service();
        let token = svc.sign_lojista(42).unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims.role, Role::Lojista);
        assert_eq!(claims.lojista_id, Some(42));
    }

    #[test]
    fn partial_token_is_flagged_and_short_lived() {
        let svc = service();
        let token = svc.sign_partial(42).unwrap();
        let claims = svc.verify(&token).unwrap();

        assert!(claims.partial);
        assert!(claims.exp - claims.iat <= 300);
    }

    #[test]
    fn tampered_token_is_invalid() {
        let svc = service();
        let other = TokenService::new(
            b"different-secret",
            Duration::from_secs(3600),
            Duration::from_secs(300),
        );

        let token = other.sign_admin(1).unwrap();
        assert!(svc.verify(&token).is_none());

        let mut forged = svc.sign_admin(1).unwrap();
        forged.push('x');
        assert!(svc.verify(&forged).is_none());
    }

    #[test]
    fn expired_token_is_invalid() {
        // Zero-length session: valid at issuance boundary only.
        let svc = TokenService::new(
            b"test-secret",
            Duration::from_secs(0),
            Duration::from_secs(0),
        );

        let token = svc.sign_admin(1).unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        assert!(svc.verify(&token).is_none());
    }

    #[test]
    fn garbage_is_invalid_not_a_panic() {
        let svc = service();
        assert!(svc.verify("").is_none());
        assert!(svc.verify("not.a.jwt").is_none());
    }

    #[test]
    fn extract_bearer_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(TokenService::extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(
            TokenService::extract_bearer(&headers),
            Some("abc123".to_string())
        );

        headers.insert(header::AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert_eq!(TokenService::extract_bearer(&headers), None);
    }
}
