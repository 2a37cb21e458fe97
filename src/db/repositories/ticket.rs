use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::entities::{lojistas, tickets};

#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: i32,
    pub lojista_id: i32,
    pub tipo: String,
    pub status: String,
    pub descricao: String,
    pub created_at: String,
}

impl From<tickets::Model> for Ticket {
    fn from(model: tickets::Model) -> Self {
        Self {
            id: model.id,
            lojista_id: model.lojista_id,
            tipo: model.tipo,
            status: model.status,
            descricao: model.descricao,
            created_at: model.created_at,
        }
    }
}

pub struct TicketRepository {
    conn: DatabaseConnection,
}

impl TicketRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: i32) -> Result<Option<Ticket>> {
        let ticket = tickets::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query ticket by ID")?;

        Ok(ticket.map(Ticket::from))
    }

    pub async fn list_open_for_lojista(&self, lojista_id: i32) -> Result<Vec<Ticket>> {
        let rows = tickets::Entity::find()
            .filter(tickets::Column::LojistaId.eq(lojista_id))
            .filter(tickets::Column::Status.eq(tickets::STATUS_ABERTO))
            .all(&self.conn)
            .await
            .context("Failed to list open tickets")?;

        Ok(rows.into_iter().map(Ticket::from).collect())
    }

    /// Resolve a ticket. For `compromisso_conta` tickets this also clears
    /// the lojista's security lock, in the same transaction — resolving any
    /// other tipo never unlocks an account.
    ///
    /// Returns `None` when the id is unknown.
    pub async fn resolve(&self, id: i32) -> Result<Option<Ticket>> {
        let resolved = self
            .conn
            .transaction::<_, Option<tickets::Model>, sea_orm::DbErr>(move |txn| {
                Box::pin(async move {
                    let ticket = tickets::Entity::find_by_id(id).one(txn).await?;

                    let Some(ticket) = ticket else {
                        return Ok(None);
                    };

                    let now = chrono::Utc::now().to_rfc3339();
                    let lojista_id = ticket.lojista_id;
                    let is_incident = ticket.tipo == tickets::TIPO_COMPROMISSO_CONTA;

                    let mut active: tickets::ActiveModel = ticket.into();
                    active.status = Set(tickets::STATUS_RESOLVIDO.to_string());
                    active.updated_at = Set(now.clone());
                    let updated = active.update(txn).await?;

                    if is_incident
                        && let Some(lojista) =
                            lojistas::Entity::find_by_id(lojista_id).one(txn).await?
                    {
                        let mut active: lojistas::ActiveModel = lojista.into();
                        active.bloqueado = Set(false);
                        active.updated_at = Set(now);
                        active.update(txn).await?;
                    }

                    Ok(Some(updated))
                })
            })
            .await
            .map_err(|e| anyhow::anyhow!("Failed to resolve ticket: {e}"))?;

        Ok(resolved.map(Ticket::from))
    }
}
