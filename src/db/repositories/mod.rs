pub mod admin;
pub mod lojista;
pub mod notificacao;
pub mod ticket;
