// src/handlers/invoices.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::time::Duration;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        document::InvoiceDocument,
        invoice::{InvoiceDetail, InvoiceSummary},
    },
    services::normalizer::normalize,
};

// Endereços do QR-code da NFCe aceitos (SEFAZ-RJ)
const NFCE_QRCODE_PREFIXES: &[&str] = &[
    "http://www4.fazenda.rj.gov.br/consultaNFCe/QRCode",
    "https://www4.fazenda.rj.gov.br/consultaNFCe/QRCode",
];

// ---
// Validação Customizada
// ---
fn validate_nfce_url(url: &str) -> Result<(), ValidationError> {
    if NFCE_QRCODE_PREFIXES.iter().any(|prefix| url.trim().starts_with(prefix)) {
        return Ok(());
    }
    let mut err = ValidationError::new("nfce_url");
    err.message = Some("Envie uma URL válida de NFCe (QR-code da SEFAZ).".into());
    Err(err)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitInvoicePayload {
    #[schema(example = 123456789)]
    pub user_id: i64,

    // URL lida do QR-code (opcional; quando vem, precisa ser da SEFAZ)
    #[validate(custom(function = "validate_nfce_url"))]
    pub source_url: Option<String>,

    // Documento extraído pelo scraper
    #[schema(value_type = Object)]
    pub document: InvoiceDocument,
}

// POST /api/invoices
#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "Invoices",
    request_body = SubmitInvoicePayload,
    responses(
        (status = 201, description = "Nota gravada (criada ou atualizada)", body = InvoiceSummary),
        (status = 400, description = "Documento inválido"),
        (status = 404, description = "Usuário não registrado"),
        (status = 503, description = "Banco não respondeu a tempo")
    )
)]
pub async fn submit_invoice(
    State(app_state): State<AppState>,
    Json(payload): Json<SubmitInvoicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // 1. Normaliza antes de qualquer escrita
    let invoice = normalize(&payload.document)?;

    // 2. Grava em uma transação, com tempo limite
    let invoice_id = within_timeout(
        app_state.settings.persist_timeout,
        app_state.invoice_service.persist(payload.user_id, &invoice),
    )
    .await?;

    // 3. Arquiva o documento bruto para reprocessamento futuro (não bloqueia a resposta)
    if let Some(archive) = &app_state.archive {
        if let Err(e) = archive.store(&invoice.access_key, &payload.document).await {
            tracing::warn!("⚠️ Nota {} gravada, mas não arquivada: {}", invoice.access_key, e);
        }
    }

    Ok((StatusCode::CREATED, Json(InvoiceSummary::new(invoice_id, &invoice))))
}

// Estourado o prazo, a transação é descartada (rollback) junto com o future.
async fn within_timeout<T>(
    timeout: Duration,
    persist: impl Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    tokio::time::timeout(timeout, persist)
        .await
        .map_err(|_| AppError::StorageTimeout(timeout.as_secs()))?
}

// GET /api/invoices/{access_key}
#[utoipa::path(
    get,
    path = "/api/invoices/{access_key}",
    tag = "Invoices",
    params(
        ("access_key" = String, Path, description = "Chave de acesso (somente dígitos)")
    ),
    responses(
        (status = 200, description = "Nota com empresa e itens", body = InvoiceDetail),
        (status = 404, description = "Chave nunca processada")
    )
)]
pub async fn get_invoice(
    State(app_state): State<AppState>,
    Path(access_key): Path<String>,
) -> Result<Json<InvoiceDetail>, AppError> {
    app_state
        .invoice_service
        .find_by_access_key(&access_key)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound {
            entity: "Nota fiscal",
            key: access_key,
        })
}
