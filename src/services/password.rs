//! Password hashing and one-time token primitives.
//!
//! Hashing uses Argon2id with params from [`SecurityConfig`]; verification
//! goes through the hash algorithm's own compare. Both are CPU-bound and
//! wrapped in `spawn_blocking` by the async helpers.

use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::SecurityConfig;

/// Hash a password using Argon2id with the configured params.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-format hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    let argon2 = Argon2::default();
    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Async wrapper running the hash on the blocking pool.
pub async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();

    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .map_err(|e| anyhow::anyhow!("Password hashing task panicked: {e}"))?
}

/// Async wrapper running the verification on the blocking pool.
pub async fn verify_password_blocking(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();

    task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| anyhow::anyhow!("Password verification task panicked: {e}"))?
}

/// Generate a random one-time token (64 character hex string).
///
/// Used for email verification, password reset and security-report links.
#[must_use]
pub fn generate_one_time_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SecurityConfig {
        // Cheap params to keep the tests fast.
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("hunter2", &test_config()).unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let config = test_config();
        let h1 = hash_password("same-password", &config).unwrap();
        let h2 = hash_password("same-password", &config).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("pw", "not-a-phc-hash").is_err());
    }

    #[test]
    fn one_time_tokens_are_hex_and_unique() {
        let t1 = generate_one_time_token();
        let t2 = generate_one_time_token();
        assert_eq!(t1.len(), 64);
        assert!(t1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(t1, t2);
    }
}
