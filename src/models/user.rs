// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// Usuário do chat. O id é a identidade externa (ex.: id do Telegram), não gerado aqui.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para registrar (ou atualizar) um usuário
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewChatUser {
    pub id: i64,
    #[validate(length(min = 1, message = "O primeiro nome é obrigatório."))]
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}
