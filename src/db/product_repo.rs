// src/db/product_repo.rs

use sqlx::{Executor, Postgres};
use crate::{common::error::AppError, models::invoice::Product};

// Catálogo global de produtos, compartilhado entre todas as notas e usuários.
#[derive(Clone, Default)]
pub struct ProductRepository;

impl ProductRepository {
    pub fn new() -> Self {
        Self
    }

    // UPSERT pelo código; a descrição mais recente prevalece.
    pub async fn upsert<'e, E>(
        &self,
        executor: E,
        code: &str,
        description: &str,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (code, description)
            VALUES ($1, $2)
            ON CONFLICT (code)
            DO UPDATE SET
                description = EXCLUDED.description,
                updated_at = NOW()
            RETURNING *
            "#,
        )
            .bind(code)
            .bind(description)
            .fetch_one(executor)
            .await?;
        Ok(product)
    }
}
