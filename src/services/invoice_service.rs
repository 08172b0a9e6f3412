// src/services/invoice_service.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{CompanyRepository, InvoiceRepository, ProductRepository, UserRepository},
    models::{
        invoice::{InvoiceDetail, NormalizedInvoice, NormalizedItem},
        user::NewChatUser,
    },
    services::import_service::InvoiceSink,
};

// Deadlocks e falhas de serialização repetem a transação inteira (a gravação é idempotente).
const MAX_ATTEMPTS: u32 = 3;

// Quem é o dono da nota nesta gravação
#[derive(Clone, Copy)]
enum Owner<'a> {
    Existing(i64),
    Upsert(&'a NewChatUser),
}

/// O motor de persistência: único escritor das tabelas de notas.
#[derive(Clone)]
pub struct InvoiceService {
    pool: PgPool,
    user_repo: UserRepository,
    company_repo: CompanyRepository,
    product_repo: ProductRepository,
    invoice_repo: InvoiceRepository,
}

impl InvoiceService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repo: UserRepository::new(pool.clone()),
            company_repo: CompanyRepository::new(),
            product_repo: ProductRepository::new(),
            invoice_repo: InvoiceRepository::new(),
            pool,
        }
    }

    /// Grava a nota para um usuário já registrado. Devolve o id da nota.
    /// Reprocessar a mesma nota converge para a mesma linha (nunca duplica).
    pub async fn persist(&self, user_id: i64, invoice: &NormalizedInvoice) -> Result<i64, AppError> {
        self.persist_with_retry(Owner::Existing(user_id), invoice).await
    }

    /// Igual a `persist`, mas registra/atualiza o usuário na mesma transação.
    pub async fn persist_for(
        &self,
        user: &NewChatUser,
        invoice: &NormalizedInvoice,
    ) -> Result<i64, AppError> {
        self.persist_with_retry(Owner::Upsert(user), invoice).await
    }

    async fn persist_with_retry(
        &self,
        owner: Owner<'_>,
        invoice: &NormalizedInvoice,
    ) -> Result<i64, AppError> {
        let mut attempt = 1;
        loop {
            match self.persist_once(owner, invoice).await {
                Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        "⚠️ Conflito transitório ao gravar a nota {} (tentativa {}): {}",
                        invoice.access_key,
                        attempt,
                        e
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn persist_once(
        &self,
        owner: Owner<'_>,
        invoice: &NormalizedInvoice,
    ) -> Result<i64, AppError> {
        // --- INÍCIO DA TRANSAÇÃO ---
        // Qualquer `?` abaixo faz rollback automático ao sair do escopo (drop)
        let mut tx = self.pool.begin().await?;

        // 1. Usuário
        let user_id = match owner {
            Owner::Existing(id) => {
                if !self.user_repo.exists(&mut *tx, id).await? {
                    return Err(AppError::NotFound {
                        entity: "Usuário",
                        key: id.to_string(),
                    });
                }
                id
            }
            Owner::Upsert(user) => self.user_repo.upsert(&mut *tx, user).await?.id,
        };

        // 2. Empresa (pelo CNPJ)
        let company = self.company_repo.upsert(&mut *tx, &invoice.company).await?;

        // 3. Cabeçalho da nota (pela chave de acesso)
        let upserted = self
            .invoice_repo
            .upsert(&mut *tx, company.id, user_id, invoice)
            .await?;
        let invoice_id = upserted.invoice.id;

        // 4. Produtos e linhas. Ordem fixa por código: transações concorrentes
        // travam os produtos na mesma sequência.
        let mut items: Vec<&NormalizedItem> = invoice.items.iter().collect();
        items.sort_by(|a, b| a.product_code.cmp(&b.product_code));

        let mut product_ids = Vec::with_capacity(items.len());
        for item in items {
            let product = self
                .product_repo
                .upsert(&mut *tx, &item.product_code, &item.product_description)
                .await?;
            self.invoice_repo
                .upsert_line(
                    &mut *tx,
                    invoice_id,
                    product.id,
                    item.quantity,
                    item.unit_price,
                    &item.unit_of_measure,
                )
                .await?;
            product_ids.push(product.id);
        }

        let removed = if upserted.created {
            0
        } else {
            self.invoice_repo
                .remove_lines_except(&mut *tx, invoice_id, &product_ids)
                .await?
        };

        // 5. Se chegou aqui, deu tudo certo.
        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        if upserted.created {
            tracing::info!(
                "🧾 Nota {} criada (id {}, {} itens)",
                invoice.access_key,
                invoice_id,
                product_ids.len()
            );
        } else {
            tracing::info!(
                "🔁 Nota {} atualizada (id {}, {} itens, {} linhas removidas)",
                invoice.access_key,
                invoice_id,
                product_ids.len(),
                removed
            );
        }

        Ok(invoice_id)
    }

    /// Nota gravada com empresa e linhas, ou `None` se a chave nunca foi vista.
    pub async fn find_by_access_key(&self, access_key: &str) -> Result<Option<InvoiceDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let Some(invoice) = self
            .invoice_repo
            .find_by_access_key(&mut *conn, access_key)
            .await?
        else {
            return Ok(None);
        };

        let company = self
            .company_repo
            .find_by_id(&mut *conn, invoice.company_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: "Empresa",
                key: invoice.company_id.to_string(),
            })?;
        let lines = self.invoice_repo.list_lines(&mut *conn, invoice.id).await?;

        Ok(Some(InvoiceDetail { invoice, company, lines }))
    }
}

#[async_trait]
impl InvoiceSink for InvoiceService {
    async fn persist(&self, user_id: i64, invoice: &NormalizedInvoice) -> Result<i64, AppError> {
        InvoiceService::persist(self, user_id, invoice).await
    }
}
