//! Transactional-mail dispatch.
//!
//! The platform never renders or delivers mail itself; it hands a fully
//! built message to a provider over HTTP. When email is disabled the
//! [`NullMailer`] logs and drops, which also keeps tests hermetic.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::EmailConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

#[derive(Serialize)]
struct OutboundMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

pub struct HttpMailer {
    client: Client,
    config: EmailConfig,
}

impl HttpMailer {
    pub fn new(config: EmailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(
                config.request_timeout_seconds.into(),
            ))
            .user_agent("Vitrine/1.0")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build mail HTTP client: {e}"))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let message = OutboundMessage {
            from: &self.config.from_address,
            to,
            subject,
            html,
        };

        let response = self
            .client
            .post(&self.config.provider_url)
            .bearer_auth(&self.config.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Mail provider request failed: {e}"))?;

        if !response.status().is_success() {
            anyhow::bail!("Mail provider returned {}", response.status());
        }

        tracing::debug!("Email dispatched to {to}: {subject}");
        Ok(())
    }
}

/// Drops messages, logging the subject. Used when email is disabled.
pub struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<()> {
        tracing::info!("Email disabled, dropping message to {to}: {subject}");
        Ok(())
    }
}

pub mod templates {
    //! Minimal HTML bodies for the three transactional messages.

    use crate::config::BrandingConfig;

    #[must_use]
    pub fn verification_link(branding: &BrandingConfig, token: &str) -> String {
        format!(
            "{}/api/auth/verificar-email?token={}",
            branding.base_url.trim_end_matches('/'),
            urlencoding::encode(token)
        )
    }

    #[must_use]
    pub fn reset_link(branding: &BrandingConfig, token: &str, admin: bool) -> String {
        let path = if admin {
            "/admin/redefinir-senha"
        } else {
            "/redefinir-senha"
        };
        format!(
            "{}{}?token={}",
            branding.base_url.trim_end_matches('/'),
            path,
            urlencoding::encode(token)
        )
    }

    #[must_use]
    pub fn security_report_link(branding: &BrandingConfig, token: &str) -> String {
        format!(
            "{}/api/auth/security-report?token={}",
            branding.base_url.trim_end_matches('/'),
            urlencoding::encode(token)
        )
    }

    #[must_use]
    pub fn email_verificacao_html(nome: &str, link: &str, branding: &BrandingConfig) -> String {
        format!(
            "<p>Olá, {nome}!</p>\
             <p>Confirme seu e-mail para ativar sua conta {brand}:</p>\
             <p><a href=\"{link}\">Verificar e-mail</a></p>\
             <p>Se você não criou esta conta, ignore esta mensagem.</p>",
            brand = branding.brand_name,
        )
    }

    #[must_use]
    pub fn email_redefinicao_senha_html(
        nome: &str,
        link: &str,
        branding: &BrandingConfig,
    ) -> String {
        format!(
            "<p>Olá, {nome}!</p>\
             <p>Recebemos um pedido para redefinir sua senha na {brand}.</p>\
             <p><a href=\"{link}\">Criar nova senha</a></p>\
             <p>O link expira em 1 hora. Se você não pediu a redefinição, \
             ignore esta mensagem.</p>",
            brand = branding.brand_name,
        )
    }

    /// Password-change notice carrying the self-report lockout link. The
    /// link must work without authentication: if an attacker changed the
    /// password, the victim can no longer log in.
    #[must_use]
    pub fn email_alerta_senha_html(nome: &str, link: &str, branding: &BrandingConfig) -> String {
        format!(
            "<p>Olá, {nome}!</p>\
             <p>A senha da sua conta {brand} acabou de ser alterada.</p>\
             <p>Se não foi você, <a href=\"{link}\">clique aqui para bloquear \
             sua conta imediatamente</a> e nossa equipe entrará em contato.</p>",
            brand = branding.brand_name,
        )
    }

}
