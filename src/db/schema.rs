// src/db/schema.rs

use sqlx::PgPool;

use crate::common::error::AppError;

/// Garante que todas as tabelas e restrições de unicidade existam.
/// As migrações são idempotentes e nunca apagam dados: pode rodar em toda inicialização,
/// mas deve terminar antes de qualquer gravação de nota começar.
pub async fn provision(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    Ok(())
}
