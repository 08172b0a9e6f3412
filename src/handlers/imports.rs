// src/handlers/imports.rs

use axum::{extract::State, Json};
use serde::Deserialize;
use std::path::Path;
use utoipa::ToSchema;
use validator::Validate;

use crate::{common::error::AppError, config::AppState, models::import::ImportReport};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportPayload {
    #[validate(length(min = 1, message = "O diretório é obrigatório."))]
    #[schema(example = "./logs/nfce")]
    pub directory: String,

    #[schema(example = 123456789)]
    pub user_id: i64,
}

// POST /api/imports
#[utoipa::path(
    post,
    path = "/api/imports",
    tag = "Imports",
    request_body = ImportPayload,
    responses(
        (status = 200, description = "Resumo da importação (erros por documento vêm no relatório)", body = ImportReport),
        (status = 404, description = "Usuário não registrado")
    )
)]
pub async fn run_import(
    State(app_state): State<AppState>,
    Json(payload): Json<ImportPayload>,
) -> Result<Json<ImportReport>, AppError> {
    payload.validate()?;

    // Sem usuário, todos os documentos falhariam: melhor recusar o lote inteiro.
    app_state.user_service.find(payload.user_id).await?;

    let report = app_state
        .importer
        .import_all(Path::new(&payload.directory), payload.user_id)
        .await?;
    Ok(Json(report))
}
