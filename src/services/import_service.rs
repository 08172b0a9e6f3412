// src/services/import_service.rs

use async_trait::async_trait;
use std::{path::Path, sync::Arc};

use crate::{
    common::error::AppError,
    models::{import::ImportReport, invoice::NormalizedInvoice},
    services::{archive::DocumentArchive, normalizer::normalize},
};

/// Destino das notas normalizadas. Em produção é o `InvoiceService`.
#[async_trait]
pub trait InvoiceSink: Send + Sync {
    async fn persist(&self, user_id: i64, invoice: &NormalizedInvoice) -> Result<i64, AppError>;
}

/// Reprocessa documentos arquivados pelo mesmo caminho do scraper
/// (normalizar → gravar). Rodar de novo sobre o mesmo diretório é seguro.
#[derive(Clone)]
pub struct ReplayImporter {
    sink: Arc<dyn InvoiceSink>,
}

impl ReplayImporter {
    pub fn new(sink: Arc<dyn InvoiceSink>) -> Self {
        Self { sink }
    }

    /// Falha só se o diretório não puder ser lido. Erros de um documento entram
    /// no relatório e o lote continua.
    pub async fn import_all(&self, dir: &Path, user_id: i64) -> Result<ImportReport, AppError> {
        let paths = DocumentArchive::list(dir).await?;
        tracing::info!("📂 Importando {} documentos de {}", paths.len(), dir.display());

        let mut report = ImportReport::default();
        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            match self.import_one(&path, user_id).await {
                Ok(invoice_id) => {
                    tracing::info!("✅ {} importado (nota {})", name, invoice_id);
                    report.record_success();
                }
                Err(e) => {
                    tracing::warn!("🔥 Erro ao importar {}: {}", name, e);
                    report.record_failure(name, e.kind(), e.to_string());
                }
            }
        }

        tracing::info!(
            "Importação concluída: {} ok, {} com erro",
            report.succeeded,
            report.failed
        );
        Ok(report)
    }

    async fn import_one(&self, path: &Path, user_id: i64) -> Result<i64, AppError> {
        let doc = DocumentArchive::load(path).await?;
        let invoice = normalize(&doc)?;
        self.sink.persist(user_id, &invoice).await
    }
}
