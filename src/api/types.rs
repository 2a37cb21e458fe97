use serde::{Deserialize, Serialize};

use crate::db::{Admin, Lojista, Notificacao, Ticket};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct AdminDto {
    pub id: i32,
    pub email: String,
    pub status: String,
    pub created_at: String,
}

impl From<Admin> for AdminDto {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            status: admin.status,
            created_at: admin.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LojistaDto {
    pub id: i32,
    pub email: String,
    pub nome: String,
    pub telefone: Option<String>,
    pub plano: String,
    pub email_verificado: bool,
    pub bloqueado: bool,
    pub acesso_bloqueado: bool,
    pub two_factor_enabled: bool,
    pub created_at: String,
}

impl From<Lojista> for LojistaDto {
    fn from(lojista: Lojista) -> Self {
        Self {
            id: lojista.id,
            email: lojista.email,
            nome: lojista.nome,
            telefone: lojista.telefone,
            plano: lojista.plano,
            email_verificado: lojista.email_verificado,
            bloqueado: lojista.bloqueado,
            acesso_bloqueado: lojista.acesso_bloqueado,
            two_factor_enabled: lojista.two_factor_enabled,
            created_at: lojista.created_at,
        }
    }
}

/// Current-principal payload for `GET /api/auth/me`.
#[derive(Debug, Serialize)]
pub struct IdentityDto {
    pub id: i32,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TicketDto {
    pub id: i32,
    pub lojista_id: i32,
    pub tipo: String,
    pub status: String,
    pub descricao: String,
    pub created_at: String,
}

impl From<Ticket> for TicketDto {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            lojista_id: ticket.lojista_id,
            tipo: ticket.tipo,
            status: ticket.status,
            descricao: ticket.descricao,
            created_at: ticket.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificacaoDto {
    pub id: i32,
    pub titulo: String,
    pub mensagem: String,
    pub tipo: String,
    pub lida: bool,
    pub created_at: String,
}

impl From<Notificacao> for NotificacaoDto {
    fn from(n: Notificacao) -> Self {
        Self {
            id: n.id,
            titulo: n.titulo,
            mensagem: n.mensagem,
            tipo: n.tipo,
            lida: n.lida,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}
