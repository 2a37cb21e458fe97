use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};

use crate::entities::admins;

/// Admin data returned from the repository (without the password hash).
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: i32,
    pub email: String,
    pub status: String,
    pub created_at: String,
}

impl From<admins::Model> for Admin {
    fn from(model: admins::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

impl Admin {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == admins::STATUS_ACTIVE
    }
}

pub struct AdminRepository {
    conn: DatabaseConnection,
}

impl AdminRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create an admin row, deciding its status inside one transaction:
    /// the first row ever created is activated as the master account, all
    /// later ones start pending. Returns `None` when the email is taken.
    pub async fn create(&self, email: &str, password_hash: &str) -> Result<Option<Admin>> {
        let email = email.to_lowercase();
        let password_hash = password_hash.to_string();

        let created = self
            .conn
            .transaction::<_, Option<admins::Model>, sea_orm::DbErr>(|txn| {
                Box::pin(async move {
                    let existing = admins::Entity::find()
                        .filter(admins::Column::Email.eq(email.clone()))
                        .one(txn)
                        .await?;

                    if existing.is_some() {
                        return Ok(None);
                    }

                    let count = admins::Entity::find().count(txn).await?;
                    let status = if count == 0 {
                        admins::STATUS_ACTIVE
                    } else {
                        admins::STATUS_PENDING
                    };

                    let now = chrono::Utc::now().to_rfc3339();
                    let model = admins::ActiveModel {
                        email: Set(email),
                        password_hash: Set(password_hash),
                        status: Set(status.to_string()),
                        reset_token: Set(None),
                        reset_token_expires: Set(None),
                        created_at: Set(now.clone()),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok(Some(model))
                })
            })
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create admin: {e}"))?;

        Ok(created.map(Admin::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let admin = admins::Entity::find()
            .filter(admins::Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query admin by email")?;

        Ok(admin.map(Admin::from))
    }

    /// Lookup by email including the stored hash (for login verification).
    pub async fn get_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(Admin, String)>> {
        let admin = admins::Entity::find()
            .filter(admins::Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("Failed to query admin by email")?;

        Ok(admin.map(|a| {
            let password_hash = a.password_hash.clone();
            (Admin::from(a), password_hash)
        }))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Admin>> {
        let admin = admins::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query admin by ID")?;

        Ok(admin.map(Admin::from))
    }

    pub async fn list(&self) -> Result<Vec<Admin>> {
        let admins = admins::Entity::find()
            .all(&self.conn)
            .await
            .context("Failed to list admins")?;

        Ok(admins.into_iter().map(Admin::from).collect())
    }

    /// Flip a pending admin to active. Returns `None` when the id is
    /// unknown.
    pub async fn activate(&self, id: i32) -> Result<Option<Admin>> {
        let admin = admins::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query admin for activation")?;

        let Some(admin) = admin else {
            return Ok(None);
        };

        if admin.status == admins::STATUS_ACTIVE {
            return Ok(Some(Admin::from(admin)));
        }

        let mut active: admins::ActiveModel = admin.into();
        active.status = Set(admins::STATUS_ACTIVE.to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let updated = active.update(&self.conn).await?;

        Ok(Some(Admin::from(updated)))
    }

    /// Returns `false` when the id is unknown.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = admins::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete admin")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn set_reset_token(&self, id: i32, token: &str, expires: &str) -> Result<()> {
        let admin = admins::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query admin for reset token")?
            .ok_or_else(|| anyhow::anyhow!("Admin not found: {id}"))?;

        let mut active: admins::ActiveModel = admin.into();
        active.reset_token = Set(Some(token.to_string()));
        active.reset_token_expires = Set(Some(expires.to_string()));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Redeem a one-time reset token: the token must match and not be
    /// expired. On success the new hash is stored and the token cleared in
    /// the same update, so a second redemption always fails.
    pub async fn redeem_reset_token(&self, token: &str, new_hash: &str) -> Result<bool> {
        let admin = admins::Entity::find()
            .filter(admins::Column::ResetToken.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query admin by reset token")?;

        let Some(admin) = admin else {
            return Ok(false);
        };

        if !expiry_is_valid(admin.reset_token_expires.as_deref()) {
            return Ok(false);
        }

        let mut active: admins::ActiveModel = admin.into();
        active.password_hash = Set(new_hash.to_string());
        active.reset_token = Set(None);
        active.reset_token_expires = Set(None);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }
}

/// Plain timestamp comparison at redemption time; there is no expiry sweep.
pub(crate) fn expiry_is_valid(expires: Option<&str>) -> bool {
    expires
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .is_some_and(|exp| exp > chrono::Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_in_the_future_is_valid() {
        let future = (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
        assert!(expiry_is_valid(Some(&future)));
    }

    #[test]
    fn expiry_in_the_past_is_invalid() {
        let past = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
        assert!(!expiry_is_valid(Some(&past)));
    }

    #[test]
    fn missing_or_garbage_expiry_is_invalid() {
        assert!(!expiry_is_valid(None));
        assert!(!expiry_is_valid(Some("not-a-timestamp")));
    }
}
