// src/db/company_repo.rs

use sqlx::{Executor, Postgres};
use crate::{
    common::error::AppError,
    models::invoice::{Company, NormalizedCompany},
};

#[derive(Clone, Default)]
pub struct CompanyRepository;

impl CompanyRepository {
    pub fn new() -> Self {
        Self
    }

    /// UPSERT pelo CNPJ. A razão social é sempre a da última nota processada.
    pub async fn upsert<'e, E>(
        &self,
        executor: E,
        company: &NormalizedCompany,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saved = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (tax_id, legal_name)
            VALUES ($1, $2)
            ON CONFLICT (tax_id)
            DO UPDATE SET
                legal_name = EXCLUDED.legal_name,
                updated_at = NOW()
            RETURNING *
            "#,
        )
            .bind(&company.tax_id)
            .bind(&company.legal_name)
            .fetch_one(executor)
            .await?;
        Ok(saved)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(company)
    }
}
