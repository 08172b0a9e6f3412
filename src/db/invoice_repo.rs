// src/db/invoice_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use crate::{
    common::error::AppError,
    models::invoice::{Invoice, InvoiceItem, InvoiceLine, NormalizedInvoice},
};

// Resultado do UPSERT da nota: a linha gravada e se ela acabou de ser criada.
#[derive(Debug, sqlx::FromRow)]
pub struct UpsertedInvoice {
    #[sqlx(flatten)]
    pub invoice: Invoice,
    pub created: bool,
}

#[derive(Clone, Default)]
pub struct InvoiceRepository;

impl InvoiceRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    /// Uma única nota por chave de acesso. "Insere; se a chave já existe, atualiza"
    /// em um só comando, então duas gravações concorrentes da mesma chave se serializam
    /// no índice único em vez de duplicar a nota.
    pub async fn upsert<'e, E>(
        &self,
        executor: E,
        company_id: i64,
        user_id: i64,
        invoice: &NormalizedInvoice,
    ) -> Result<UpsertedInvoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let upserted = sqlx::query_as::<_, UpsertedInvoice>(
            r#"
            INSERT INTO invoices (
                access_key, company_id, user_id, number, series, authorization_protocol,
                authorized_at, issued_at, federal_tax, state_tax, municipal_tax
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (access_key)
            DO UPDATE SET
                company_id = EXCLUDED.company_id,
                user_id = EXCLUDED.user_id,
                number = EXCLUDED.number,
                series = EXCLUDED.series,
                authorization_protocol = EXCLUDED.authorization_protocol,
                authorized_at = EXCLUDED.authorized_at,
                issued_at = EXCLUDED.issued_at,
                federal_tax = EXCLUDED.federal_tax,
                state_tax = EXCLUDED.state_tax,
                municipal_tax = EXCLUDED.municipal_tax,
                updated_at = NOW()
            RETURNING *, (xmax = 0) AS created
            "#,
        )
            .bind(&invoice.access_key)
            .bind(company_id)
            .bind(user_id)
            .bind(&invoice.number)
            .bind(&invoice.series)
            .bind(&invoice.authorization_protocol)
            .bind(invoice.authorized_at)
            .bind(invoice.issued_at)
            .bind(invoice.taxes.federal)
            .bind(invoice.taxes.state)
            .bind(invoice.taxes.municipal)
            .fetch_one(executor)
            .await?;
        Ok(upserted)
    }

    /// Linha identificada por (produto, nota): se já existe, é substituída.
    pub async fn upsert_line<'e, E>(
        &self,
        executor: E,
        invoice_id: i64,
        product_id: i64,
        quantity: Decimal,
        unit_price: Decimal,
        unit_of_measure: &str,
    ) -> Result<InvoiceItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let line = sqlx::query_as::<_, InvoiceItem>(
            r#"
            INSERT INTO invoice_items (product_id, invoice_id, quantity, unit_price, unit_of_measure)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (product_id, invoice_id)
            DO UPDATE SET
                quantity = EXCLUDED.quantity,
                unit_price = EXCLUDED.unit_price,
                unit_of_measure = EXCLUDED.unit_of_measure,
                updated_at = NOW()
            RETURNING *
            "#,
        )
            .bind(product_id)
            .bind(invoice_id)
            .bind(quantity)
            .bind(unit_price)
            .bind(unit_of_measure)
            .fetch_one(executor)
            .await?;
        Ok(line)
    }

    /// Remove as linhas de produtos que não aparecem mais na versão atual da nota.
    pub async fn remove_lines_except<'e, E>(
        &self,
        executor: E,
        invoice_id: i64,
        keep_product_ids: &[i64],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM invoice_items WHERE invoice_id = $1 AND product_id <> ALL($2)",
        )
            .bind(invoice_id)
            .bind(keep_product_ids)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // ---
    // Funções de "Leitura"
    // ---

    pub async fn find_by_access_key<'e, E>(
        &self,
        executor: E,
        access_key: &str,
    ) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE access_key = $1")
            .bind(access_key)
            .fetch_optional(executor)
            .await?;
        Ok(invoice)
    }

    pub async fn list_lines<'e, E>(
        &self,
        executor: E,
        invoice_id: i64,
    ) -> Result<Vec<InvoiceLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, InvoiceLine>(
            r#"
            SELECT
                p.id AS product_id,
                p.code AS product_code,
                p.description AS product_description,
                ii.quantity,
                ii.unit_price,
                ii.unit_of_measure
            FROM invoice_items ii
            JOIN products p ON p.id = ii.product_id
            WHERE ii.invoice_id = $1
            ORDER BY p.code ASC
            "#,
        )
            .bind(invoice_id)
            .fetch_all(executor)
            .await?;
        Ok(lines)
    }
}
