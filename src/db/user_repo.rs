// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use crate::{common::error::AppError, models::user::{ChatUser, NewChatUser}};

// O repositório de usuários, responsável por todas as interações com a tabela 'chat_users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu ID externo
    pub async fn find_by_id(&self, id: i64) -> Result<Option<ChatUser>, AppError> {
        let maybe_user = sqlx::query_as::<_, ChatUser>("SELECT * FROM chat_users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    /// Versão transacional: confirma que o usuário existe e trava a linha contra remoção
    /// até o fim da transação.
    pub async fn exists<'e, E>(&self, executor: E, id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM chat_users WHERE id = $1 FOR KEY SHARE")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(found.is_some())
    }

    // UPSERT pelo id externo: nomes são sempre sobrescritos pelo último registro.
    pub async fn upsert<'e, E>(&self, executor: E, user: &NewChatUser) -> Result<ChatUser, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saved = sqlx::query_as::<_, ChatUser>(
            r#"
            INSERT INTO chat_users (id, first_name, last_name, username)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id)
            DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                username = EXCLUDED.username,
                updated_at = NOW()
            RETURNING *
            "#,
        )
            .bind(user.id)
            .bind(&user.first_name)
            .bind(user.last_name.as_deref())
            .bind(user.username.as_deref())
            .fetch_one(executor)
            .await?;
        Ok(saved)
    }
}
