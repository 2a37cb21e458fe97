use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::admin::Admin;
pub use repositories::lojista::Lojista;
pub use repositories::notificacao::Notificacao;
pub use repositories::ticket::Ticket;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn admin_repo(&self) -> repositories::admin::AdminRepository {
        repositories::admin::AdminRepository::new(self.conn.clone())
    }

    fn lojista_repo(&self) -> repositories::lojista::LojistaRepository {
        repositories::lojista::LojistaRepository::new(self.conn.clone())
    }

    fn ticket_repo(&self) -> repositories::ticket::TicketRepository {
        repositories::ticket::TicketRepository::new(self.conn.clone())
    }

    fn notificacao_repo(&self) -> repositories::notificacao::NotificacaoRepository {
        repositories::notificacao::NotificacaoRepository::new(self.conn.clone())
    }

    // ========== Admins ==========

    pub async fn create_admin(&self, email: &str, password_hash: &str) -> Result<Option<Admin>> {
        self.admin_repo().create(email, password_hash).await
    }

    pub async fn get_admin_by_email(&self, email: &str) -> Result<Option<Admin>> {
        self.admin_repo().get_by_email(email).await
    }

    pub async fn get_admin_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(Admin, String)>> {
        self.admin_repo().get_by_email_with_password(email).await
    }

    pub async fn get_admin_by_id(&self, id: i32) -> Result<Option<Admin>> {
        self.admin_repo().get_by_id(id).await
    }

    pub async fn list_admins(&self) -> Result<Vec<Admin>> {
        self.admin_repo().list().await
    }

    pub async fn activate_admin(&self, id: i32) -> Result<Option<Admin>> {
        self.admin_repo().activate(id).await
    }

    pub async fn delete_admin(&self, id: i32) -> Result<bool> {
        self.admin_repo().delete(id).await
    }

    pub async fn set_admin_reset_token(
        &self,
        id: i32,
        token: &str,
        expires: &str,
    ) -> Result<()> {
        self.admin_repo().set_reset_token(id, token, expires).await
    }

    pub async fn redeem_admin_reset_token(&self, token: &str, new_hash: &str) -> Result<bool> {
        self.admin_repo().redeem_reset_token(token, new_hash).await
    }

    // ========== Lojistas ==========

    pub async fn create_lojista(
        &self,
        email: &str,
        nome: &str,
        telefone: Option<&str>,
        password_hash: &str,
        token_verificacao: &str,
    ) -> Result<Option<Lojista>> {
        self.lojista_repo()
            .create(email, nome, telefone, password_hash, token_verificacao)
            .await
    }

    pub async fn get_lojista_by_email(&self, email: &str) -> Result<Option<Lojista>> {
        self.lojista_repo().get_by_email(email).await
    }

    pub async fn get_lojista_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(Lojista, String)>> {
        self.lojista_repo().get_by_email_with_password(email).await
    }

    pub async fn get_lojista_by_id(&self, id: i32) -> Result<Option<Lojista>> {
        self.lojista_repo().get_by_id(id).await
    }

    pub async fn get_lojista_password_hash(&self, id: i32) -> Result<Option<String>> {
        self.lojista_repo().get_password_hash(id).await
    }

    pub async fn get_lojista_two_factor_secret(&self, id: i32) -> Result<Option<String>> {
        self.lojista_repo().get_two_factor_secret(id).await
    }

    pub async fn redeem_verification_token(&self, token: &str) -> Result<Option<Lojista>> {
        self.lojista_repo().redeem_verification_token(token).await
    }

    pub async fn rotate_verification_token(&self, id: i32, token: &str) -> Result<()> {
        self.lojista_repo().rotate_verification_token(id, token).await
    }

    pub async fn set_lojista_reset_token(
        &self,
        id: i32,
        token: &str,
        expires: &str,
    ) -> Result<()> {
        self.lojista_repo().set_reset_token(id, token, expires).await
    }

    pub async fn redeem_lojista_reset_token(
        &self,
        token: &str,
        new_hash: &str,
    ) -> Result<Option<Lojista>> {
        self.lojista_repo().redeem_reset_token(token, new_hash).await
    }

    pub async fn set_lojista_security_token(&self, id: i32, token: &str) -> Result<()> {
        self.lojista_repo().set_security_token(id, token).await
    }

    pub async fn lock_account_and_open_ticket(&self, token: &str) -> Result<Option<Lojista>> {
        self.lojista_repo().lock_account_and_open_ticket(token).await
    }

    pub async fn set_lojista_two_factor_secret(&self, id: i32, secret: &str) -> Result<()> {
        self.lojista_repo().set_two_factor_secret(id, secret).await
    }

    pub async fn enable_lojista_two_factor(&self, id: i32) -> Result<()> {
        self.lojista_repo().enable_two_factor(id).await
    }

    pub async fn disable_lojista_two_factor(&self, id: i32) -> Result<()> {
        self.lojista_repo().disable_two_factor(id).await
    }

    // ========== Tickets & notifications ==========

    pub async fn get_ticket(&self, id: i32) -> Result<Option<Ticket>> {
        self.ticket_repo().get(id).await
    }

    pub async fn list_open_tickets_for_lojista(&self, lojista_id: i32) -> Result<Vec<Ticket>> {
        self.ticket_repo().list_open_for_lojista(lojista_id).await
    }

    pub async fn resolve_ticket(&self, id: i32) -> Result<Option<Ticket>> {
        self.ticket_repo().resolve(id).await
    }

    pub async fn list_notificacoes_for_lojista(
        &self,
        lojista_id: i32,
    ) -> Result<Vec<Notificacao>> {
        self.notificacao_repo().list_for_lojista(lojista_id).await
    }
}
