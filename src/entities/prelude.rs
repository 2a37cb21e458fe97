pub use super::admins::Entity as Admins;
pub use super::lojistas::Entity as Lojistas;
pub use super::notificacoes::Entity as Notificacoes;
pub use super::tickets::Entity as Tickets;
