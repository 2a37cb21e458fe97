use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notificacoes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub lojista_id: i32,

    pub titulo: String,

    pub mensagem: String,

    /// `seguranca` for incident notices; other tipos come from elsewhere.
    pub tipo: String,

    pub lida: bool,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const TIPO_SEGURANCA: &str = "seguranca";
