use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::clients::{HttpMailer, Mailer, NullMailer};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, EmailVerificationService, PasswordResetService, SeaOrmAuthService,
    SecurityIncidentService, TokenService, TwoFactorService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub tokens: Arc<TokenService>,

    pub mailer: Arc<dyn Mailer>,

    pub auth_service: Arc<dyn AuthService>,

    pub two_factor: Arc<TwoFactorService>,

    pub password_reset: Arc<PasswordResetService>,

    pub verification: Arc<EmailVerificationService>,

    pub security: Arc<SecurityIncidentService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let tokens = Arc::new(TokenService::new(
            config.security.resolved_jwt_secret().as_bytes(),
            Duration::from_secs(config.security.session_ttl_hours * 3600),
            Duration::from_secs(config.security.partial_token_ttl_minutes * 60),
        ));

        let mailer: Arc<dyn Mailer> = if config.email.enabled {
            Arc::new(HttpMailer::new(config.email.clone())?)
        } else {
            Arc::new(NullMailer)
        };

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens.clone(),
            config.security.clone(),
            config.branding.brand_name.clone(),
        )) as Arc<dyn AuthService>;

        let two_factor = Arc::new(TwoFactorService::new(
            store.clone(),
            config.branding.brand_name.clone(),
        ));

        let password_reset = Arc::new(PasswordResetService::new(
            store.clone(),
            mailer.clone(),
            config.branding.clone(),
            config.security.clone(),
        ));

        let verification = Arc::new(EmailVerificationService::new(
            store.clone(),
            mailer.clone(),
            config.branding.clone(),
            config.security.clone(),
        ));

        let security = Arc::new(SecurityIncidentService::new(store.clone()));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            tokens,
            mailer,
            auth_service,
            two_factor,
            password_reset,
            verification,
            security,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
