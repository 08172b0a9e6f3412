// src/config.rs

use crate::{
    db::UserRepository,
    services::{DocumentArchive, InvoiceService, ReplayImporter, UserService},
};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

// Configuração lida do ambiente (e do .env, se existir)
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub persist_timeout: Duration,
    pub archive_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        Ok(Self {
            database_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            acquire_timeout: Duration::from_secs(parse_var("DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            persist_timeout: Duration::from_secs(parse_var("PERSIST_TIMEOUT_SECS", 10)?),
            archive_dir: env::var("ARCHIVE_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} inválida: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Settings,
    pub invoice_service: InvoiceService,
    pub user_service: UserService,
    pub importer: ReplayImporter,
    pub archive: Option<DocumentArchive>,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, settings))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, settings: Settings) -> Self {
        let invoice_service = InvoiceService::new(db_pool.clone());
        let user_service = UserService::new(UserRepository::new(db_pool.clone()), db_pool.clone());
        let importer = ReplayImporter::new(Arc::new(invoice_service.clone()));
        let archive = settings.archive_dir.clone().map(DocumentArchive::new);

        Self {
            db_pool,
            settings,
            invoice_service,
            user_service,
            importer,
            archive,
        }
    }
}
