use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::db::repositories::admin::expiry_is_valid;
use crate::entities::{lojistas, notificacoes, tickets};

/// Lojista data returned from the repository (without hash or secrets).
#[derive(Debug, Clone)]
pub struct Lojista {
    pub id: i32,
    pub email: String,
    pub nome: String,
    pub telefone: Option<String>,
    pub plano: String,
    pub email_verificado: bool,
    pub verificacao_ignorada: bool,
    pub bloqueado: bool,
    pub acesso_bloqueado: bool,
    pub two_factor_enabled: bool,
    pub created_at: String,
}

impl From<lojistas::Model> for Lojista {
    fn from(model: lojistas::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            nome: model.nome,
            telefone: model.telefone,
            plano: model.plano,
            email_verificado: model.email_verificado,
            verificacao_ignorada: model.verificacao_ignorada,
            bloqueado: model.bloqueado,
            acesso_bloqueado: model.acesso_bloqueado,
            two_factor_enabled: model.two_factor_enabled,
            created_at: model.created_at,
        }
    }
}

impl Lojista {
    /// Login is refused while unverified unless the manual override waived
    /// verification for this account.
    #[must_use]
    pub const fn verification_satisfied(&self) -> bool {
        self.email_verificado || self.verificacao_ignorada
    }
}

pub struct LojistaRepository {
    conn: DatabaseConnection,
}

impl LojistaRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a lojista row with an unredeemed verification token.
    /// Returns `None` when the email is taken.
    pub async fn create(
        &self,
        email: &str,
        nome: &str,
        telefone: Option<&str>,
        password_hash: &str,
        token_verificacao: &str,
    ) -> Result<Option<Lojista>> {
        let email = email.to_lowercase();

        let existing = lojistas::Entity::find()
            .filter(lojistas::Column::Email.eq(email.clone()))
            .one(&self.conn)
            .await
            .context("Failed to check lojista email uniqueness")?;

        if existing.is_some() {
            return Ok(None);
        }

        let now = chrono::Utc::now().to_rfc3339();
        let model = lojistas::ActiveModel {
            email: Set(email),
            password_hash: Set(password_hash.to_string()),
            nome: Set(nome.to_string()),
            telefone: Set(telefone.map(ToString::to_string)),
            plano: Set("gratuito".to_string()),
            email_verificado: Set(false),
            verificacao_ignorada: Set(false),
            bloqueado: Set(false),
            acesso_bloqueado: Set(false),
            token_verificacao: Set(Some(token_verificacao.to_string())),
            token_redefinicao: Set(None),
            token_redefinicao_expira: Set(None),
            security_token: Set(None),
            two_factor_enabled: Set(false),
            two_factor_secret: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert lojista")?;

        Ok(Some(Lojista::from(model)))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Lojista>> {
        let lojista = lojistas::Entity::find()
            .filter(lojistas::Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query lojista by email")?;

        Ok(lojista.map(Lojista::from))
    }

    pub async fn get_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(Lojista, String)>> {
        let lojista = lojistas::Entity::find()
            .filter(lojistas::Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query lojista by email")?;

        Ok(lojista.map(|l| {
            let password_hash = l.password_hash.clone();
            (Lojista::from(l), password_hash)
        }))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Lojista>> {
        let lojista = lojistas::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query lojista by ID")?;

        Ok(lojista.map(Lojista::from))
    }

    pub async fn get_password_hash(&self, id: i32) -> Result<Option<String>> {
        let lojista = lojistas::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query lojista password hash")?;

        Ok(lojista.map(|l| l.password_hash))
    }

    pub async fn get_two_factor_secret(&self, id: i32) -> Result<Option<String>> {
        let lojista = lojistas::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query lojista 2FA secret")?;

        Ok(lojista.and_then(|l| l.two_factor_secret))
    }

    /// Redeem a one-time verification token. The token is cleared in the
    /// same update that sets the flag; a reused token finds no row.
    pub async fn redeem_verification_token(&self, token: &str) -> Result<Option<Lojista>> {
        let lojista = lojistas::Entity::find()
            .filter(lojistas::Column::TokenVerificacao.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query lojista by verification token")?;

        let Some(lojista) = lojista else {
            return Ok(None);
        };

        let mut active: lojistas::ActiveModel = lojista.into();
        active.email_verificado = Set(true);
        active.token_verificacao = Set(None);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let updated = active.update(&self.conn).await?;

        Ok(Some(Lojista::from(updated)))
    }

    /// Rotate the verification token for a not-yet-verified account.
    pub async fn rotate_verification_token(&self, id: i32, token: &str) -> Result<()> {
        let lojista = lojistas::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query lojista for token rotation")?
            .ok_or_else(|| anyhow::anyhow!("Lojista not found: {id}"))?;

        let mut active: lojistas::ActiveModel = lojista.into();
        active.token_verificacao = Set(Some(token.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn set_reset_token(&self, id: i32, token: &str, expires: &str) -> Result<()> {
        let lojista = lojistas::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query lojista for reset token")?
            .ok_or_else(|| anyhow::anyhow!("Lojista not found: {id}"))?;

        let mut active: lojistas::ActiveModel = lojista.into();
        active.token_redefinicao = Set(Some(token.to_string()));
        active.token_redefinicao_expira = Set(Some(expires.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Redeem a one-time reset token (match + unexpired). The new hash and
    /// the token clear commit in one update. Returns the updated row so the
    /// caller can dispatch the password-change notification.
    pub async fn redeem_reset_token(
        &self,
        token: &str,
        new_hash: &str,
    ) -> Result<Option<Lojista>> {
        let lojista = lojistas::Entity::find()
            .filter(lojistas::Column::TokenRedefinicao.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query lojista by reset token")?;

        let Some(lojista) = lojista else {
            return Ok(None);
        };

        if !expiry_is_valid(lojista.token_redefinicao_expira.as_deref()) {
            return Ok(None);
        }

        let mut active: lojistas::ActiveModel = lojista.into();
        active.password_hash = Set(new_hash.to_string());
        active.token_redefinicao = Set(None);
        active.token_redefinicao_expira = Set(None);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let updated = active.update(&self.conn).await?;

        Ok(Some(Lojista::from(updated)))
    }

    /// Attach a fresh self-report token, embedded in the password-change
    /// notification email.
    pub async fn set_security_token(&self, id: i32, token: &str) -> Result<()> {
        let lojista = lojistas::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query lojista for security token")?
            .ok_or_else(|| anyhow::anyhow!("Lojista not found: {id}"))?;

        let mut active: lojistas::ActiveModel = lojista.into();
        active.security_token = Set(Some(token.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Consume a security-report token: lock the account, clear the token,
    /// open a `compromisso_conta` ticket and create a security notification,
    /// all inside one transaction. Ticket creation is keyed on an already
    /// open ticket of the same tipo so a retry cannot duplicate it.
    ///
    /// Returns `None` for an absent or already-consumed token.
    pub async fn lock_account_and_open_ticket(&self, token: &str) -> Result<Option<Lojista>> {
        let token = token.to_string();

        let locked = self
            .conn
            .transaction::<_, Option<lojistas::Model>, sea_orm::DbErr>(|txn| {
                Box::pin(async move {
                    let lojista = lojistas::Entity::find()
                        .filter(lojistas::Column::SecurityToken.eq(token))
                        .one(txn)
                        .await?;

                    let Some(lojista) = lojista else {
                        return Ok(None);
                    };

                    let lojista_id = lojista.id;
                    let now = chrono::Utc::now().to_rfc3339();

                    let mut active: lojistas::ActiveModel = lojista.into();
                    active.bloqueado = Set(true);
                    active.security_token = Set(None);
                    active.updated_at = Set(now.clone());
                    let updated = active.update(txn).await?;

                    let open_ticket = tickets::Entity::find()
                        .filter(tickets::Column::LojistaId.eq(lojista_id))
                        .filter(tickets::Column::Tipo.eq(tickets::TIPO_COMPROMISSO_CONTA))
                        .filter(tickets::Column::Status.eq(tickets::STATUS_ABERTO))
                        .one(txn)
                        .await?;

                    if open_ticket.is_none() {
                        tickets::ActiveModel {
                            lojista_id: Set(lojista_id),
                            tipo: Set(tickets::TIPO_COMPROMISSO_CONTA.to_string()),
                            status: Set(tickets::STATUS_ABERTO.to_string()),
                            descricao: Set(
                                "Conta reportada como comprometida pelo titular".to_string()
                            ),
                            created_at: Set(now.clone()),
                            updated_at: Set(now.clone()),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;
                    }

                    notificacoes::ActiveModel {
                        lojista_id: Set(lojista_id),
                        titulo: Set("Conta bloqueada por segurança".to_string()),
                        mensagem: Set(
                            "Sua conta foi bloqueada após um reporte de comprometimento. \
                             Nossa equipe de suporte entrará em contato."
                                .to_string(),
                        ),
                        tipo: Set(notificacoes::TIPO_SEGURANCA.to_string()),
                        lida: Set(false),
                        created_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok(Some(updated))
                })
            })
            .await
            .map_err(|e| anyhow::anyhow!("Failed to process security report: {e}"))?;

        Ok(locked.map(Lojista::from))
    }

    /// Store a candidate TOTP secret during enrollment. Does not flip the
    /// enabled flag; two concurrent enrollments race to overwrite each
    /// other, which the operator-initiated flow accepts.
    pub async fn set_two_factor_secret(&self, id: i32, secret: &str) -> Result<()> {
        let lojista = lojistas::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query lojista for 2FA secret")?
            .ok_or_else(|| anyhow::anyhow!("Lojista not found: {id}"))?;

        let mut active: lojistas::ActiveModel = lojista.into();
        active.two_factor_secret = Set(Some(secret.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn enable_two_factor(&self, id: i32) -> Result<()> {
        let lojista = lojistas::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query lojista for 2FA enable")?
            .ok_or_else(|| anyhow::anyhow!("Lojista not found: {id}"))?;

        let mut active: lojistas::ActiveModel = lojista.into();
        active.two_factor_enabled = Set(true);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn disable_two_factor(&self, id: i32) -> Result<()> {
        let lojista = lojistas::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query lojista for 2FA disable")?
            .ok_or_else(|| anyhow::anyhow!("Lojista not found: {id}"))?;

        let mut active: lojistas::ActiveModel = lojista.into();
        active.two_factor_enabled = Set(false);
        active.two_factor_secret = Set(None);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }
}
