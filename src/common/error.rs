use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

// Códigos do Postgres que indicam conflito transitório (vale repetir a transação inteira).
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    // Documento da nota com campo ausente ou malformado. Nunca chega ao banco.
    #[error("Campo inválido '{field}': {reason}")]
    ValidationError { field: String, reason: String },

    // Payload HTTP reprovado pelo `validator`
    #[error("Erro de validação")]
    PayloadValidation(#[from] validator::ValidationErrors),

    #[error("{entity} '{key}' não encontrado")]
    NotFound { entity: &'static str, key: String },

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Falha ao executar as migrações: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Tempo limite de {0}s excedido ao gravar a nota")]
    StorageTimeout(u64),

    #[error("Erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

/// Categoria do erro, como aparece nos relatórios de importação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    Storage,
    NotFound,
    Input,
    Internal,
}

impl AppError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError { .. }
            | AppError::PayloadValidation(_) => ErrorKind::Validation,
            AppError::NotFound { .. } => ErrorKind::NotFound,
            AppError::DatabaseError(_)
            | AppError::MigrationError(_)
            | AppError::StorageTimeout(_) => ErrorKind::Storage,
            AppError::Io(_) | AppError::Json(_) => ErrorKind::Input,
            AppError::InternalServerError(_) => ErrorKind::Internal,
        }
    }

    /// Deadlock ou falha de serialização: a transação pode ser repetida do zero.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::DatabaseError(sqlx::Error::Database(db_err)) => matches!(
                db_err.code().as_deref(),
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
            ),
            AppError::DatabaseError(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // Retorna todos os detalhes da validação.
            AppError::PayloadValidation(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::ValidationError { field, .. } => {
                let body = Json(json!({
                    "error": self.to_string(),
                    "field": field,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::StorageTimeout(_) => {
                tracing::warn!("{}", self);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "O banco de dados não respondeu a tempo. Tente novamente.".to_string(),
                )
            }

            // Todos os outros erros viram 500; o `tracing` registra a causa detalhada.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
