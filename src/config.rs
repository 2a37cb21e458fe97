use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub branding: BrandingConfig,

    #[serde(default)]
    pub email: EmailConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    #[serde(default)]
    pub suppress_connection_errors: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/vitrine.db".to_string(),
            log_level: "info".to_string(),
            suppress_connection_errors: false,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 7070,
            cors_allowed_origins: vec![
                "http://localhost:7070".to_string(),
                "http://127.0.0.1:7070".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations) - higher = more CPU work
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Secret used to sign session tokens (HS256). Override in production;
    /// `VITRINE_JWT_SECRET` takes precedence when set.
    pub jwt_secret: String,

    /// Platform-operator override credential. Authenticates as any account
    /// without matching its stored hash and bypasses 2FA. Disabled when
    /// unset.
    pub master_password: Option<String>,

    /// Lifetime of a full session token, in hours.
    pub session_ttl_hours: u64,

    /// Lifetime of a partial (pre-2FA) token, in minutes.
    pub partial_token_ttl_minutes: u64,

    /// Lifetime of a password-reset token, in minutes.
    pub reset_token_ttl_minutes: i64,

    /// Minimum accepted password length.
    pub min_password_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            jwt_secret: "vitrine-dev-secret-change-me".to_string(),
            master_password: None,
            session_ttl_hours: 24 * 7,
            partial_token_ttl_minutes: 5,
            reset_token_ttl_minutes: 60,
            min_password_length: 6,
        }
    }
}

impl SecurityConfig {
    /// Resolved signing secret: environment variable wins over file config.
    #[must_use]
    pub fn resolved_jwt_secret(&self) -> String {
        std::env::var("VITRINE_JWT_SECRET").unwrap_or_else(|_| self.jwt_secret.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandingConfig {
    pub brand_name: String,

    /// Public base URL used to build absolute links embedded in emails.
    pub base_url: String,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            brand_name: "Vitrine".to_string(),
            base_url: "http://localhost:7070".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,

    /// Transactional-mail provider endpoint (JSON POST).
    pub provider_url: String,

    pub api_key: String,

    pub from_address: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u32,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider_url: String::new(),
            api_key: String::new(),
            from_address: "no-reply@vitrine.local".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "vitrine".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            branding: BrandingConfig::default(),
            email: EmailConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("vitrine").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".vitrine").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("database_path cannot be empty");
        }

        if self.security.resolved_jwt_secret().is_empty() {
            anyhow::bail!("security.jwt_secret cannot be empty");
        }

        if self.email.enabled && self.email.provider_url.is_empty() {
            anyhow::bail!("email.provider_url cannot be empty when email is enabled");
        }

        if self.security.min_password_length == 0 {
            anyhow::bail!("security.min_password_length must be at least 1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn email_enabled_requires_provider_url() {
        let mut config = Config::default();
        config.email.enabled = true;
        assert!(config.validate().is_err());

        config.email.provider_url = "https://mail.example.com/send".to_string();
        config.validate().unwrap();
    }

    #[test]
    fn roundtrips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.security.session_ttl_hours, config.security.session_ttl_hours);
    }
}
