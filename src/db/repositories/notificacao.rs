use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::notificacoes;

#[derive(Debug, Clone)]
pub struct Notificacao {
    pub id: i32,
    pub lojista_id: i32,
    pub titulo: String,
    pub mensagem: String,
    pub tipo: String,
    pub lida: bool,
    pub created_at: String,
}

impl From<notificacoes::Model> for Notificacao {
    fn from(model: notificacoes::Model) -> Self {
        Self {
            id: model.id,
            lojista_id: model.lojista_id,
            titulo: model.titulo,
            mensagem: model.mensagem,
            tipo: model.tipo,
            lida: model.lida,
            created_at: model.created_at,
        }
    }
}

pub struct NotificacaoRepository {
    conn: DatabaseConnection,
}

impl NotificacaoRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_for_lojista(&self, lojista_id: i32) -> Result<Vec<Notificacao>> {
        let rows = notificacoes::Entity::find()
            .filter(notificacoes::Column::LojistaId.eq(lojista_id))
            .order_by_desc(notificacoes::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list notifications")?;

        Ok(rows.into_iter().map(Notificacao::from).collect())
    }
}
