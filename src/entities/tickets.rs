use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub lojista_id: i32,

    /// `compromisso_conta` tickets gate the security lockout; other tipos
    /// are ordinary support tickets.
    pub tipo: String,

    /// `aberto` | `resolvido`
    pub status: String,

    pub descricao: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const TIPO_COMPROMISSO_CONTA: &str = "compromisso_conta";
pub const STATUS_ABERTO: &str = "aberto";
pub const STATUS_RESOLVIDO: &str = "resolvido";
