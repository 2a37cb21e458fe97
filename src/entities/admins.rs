use sea_orm::entity::prelude::*;

/// Platform staff account. The first row ever created is auto-activated
/// ("master"); every later row starts `pending` until an active admin
/// approves it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "admins")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored lowercased; lookups normalize before comparing.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// `pending` | `active`
    pub status: String,

    /// One-time password-reset token, null when unused.
    pub reset_token: Option<String>,

    /// RFC3339 expiry for `reset_token`.
    pub reset_token_expires: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ACTIVE: &str = "active";
