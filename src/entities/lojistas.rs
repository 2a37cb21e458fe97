use sea_orm::entity::prelude::*;

/// Tenant store-owner account.
///
/// `bloqueado` (security lock) and `acesso_bloqueado` (billing lock) are
/// independent axes with independent clearance paths: the first is cleared
/// only by resolving a `compromisso_conta` ticket, the second belongs to
/// billing and is never mutated here.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "lojistas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored lowercased; lookups normalize before comparing.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub nome: String,

    pub telefone: Option<String>,

    /// Billing plan, owned by billing logic; read-only here.
    pub plano: String,

    pub email_verificado: bool,

    /// Manual override that waives email verification for this account.
    pub verificacao_ignorada: bool,

    /// Security/abuse lock. No session token is issued while set.
    pub bloqueado: bool,

    /// Billing lock, distinct axis from `bloqueado`.
    pub acesso_bloqueado: bool,

    /// One-time email-verification token, null once redeemed.
    pub token_verificacao: Option<String>,

    /// One-time password-reset token, null when unused.
    pub token_redefinicao: Option<String>,

    /// RFC3339 expiry for `token_redefinicao`.
    pub token_redefinicao_expira: Option<String>,

    /// One-time account-compromise self-report token, embedded in
    /// password-change notification emails.
    pub security_token: Option<String>,

    pub two_factor_enabled: bool,

    /// Base32 TOTP shared secret; present while enabled or mid-enrollment.
    pub two_factor_secret: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
