// src/services/user_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::user::{ChatUser, NewChatUser},
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, pool: PgPool) -> Self {
        Self { user_repo, pool }
    }

    // Comando "/start" do chat: cria ou atualiza o usuário pelo id externo
    pub async fn register(&self, user: &NewChatUser) -> Result<ChatUser, AppError> {
        let saved = self.user_repo.upsert(&self.pool, user).await?;
        tracing::info!("👤 Usuário {} registrado", saved.id);
        Ok(saved)
    }

    pub async fn find(&self, id: i64) -> Result<ChatUser, AppError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound {
                entity: "Usuário",
                key: id.to_string(),
            })
    }
}
