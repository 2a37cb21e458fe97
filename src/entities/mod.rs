pub mod prelude;

pub mod admins;
pub mod lojistas;
pub mod notificacoes;
pub mod tickets;
