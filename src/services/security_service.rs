//! Account-compromise self-report handling.
//!
//! The report endpoint is reached unauthenticated from an email link: if an
//! attacker changed the victim's password, the victim can no longer log in,
//! so this path must not require a session.

use crate::db::{Lojista, Store, Ticket};
use crate::services::auth_service::AuthError;

pub struct SecurityIncidentService {
    store: Store,
}

impl SecurityIncidentService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Consume a security-report token: lock the account, open the
    /// `compromisso_conta` ticket and create the security notification as
    /// one unit. An absent or already-consumed token is a validation error
    /// with no state change.
    pub async fn report(&self, token: &str) -> Result<Lojista, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Validation(
                "Invalid or already used security token".to_string(),
            ));
        }

        let Some(lojista) = self.store.lock_account_and_open_ticket(token).await? else {
            return Err(AuthError::Validation(
                "Invalid or already used security token".to_string(),
            ));
        };

        tracing::warn!(
            "Account {} locked after compromise self-report",
            lojista.email
        );

        Ok(lojista)
    }

    /// Admin action resolving a ticket. Only `compromisso_conta` tickets
    /// clear the security lock; resolving any other tipo never unlocks an
    /// account.
    pub async fn resolve_ticket(&self, ticket_id: i32) -> Result<Ticket, AuthError> {
        let ticket = self
            .store
            .resolve_ticket(ticket_id)
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("Ticket {ticket_id} not found")))?;

        tracing::info!(
            "Ticket {} ({}) resolved for lojista {}",
            ticket.id,
            ticket.tipo,
            ticket.lojista_id
        );

        Ok(ticket)
    }
}
