//src/main.rs

use clap::{Parser, Subcommand};
use std::{path::PathBuf, process::ExitCode};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use nfce_backend::{
    config::{AppState, Settings},
    db::schema,
};

#[derive(Parser)]
#[command(name = "nfce-backend")]
#[command(about = "Grava NFCe (notas fiscais de consumidor) de forma idempotente no Postgres")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sobe a API HTTP (padrão)
    Serve,

    /// Reprocessa um diretório de documentos arquivados (*.json)
    Import {
        /// Diretório com os documentos
        dir: PathBuf,

        /// Usuário dono das notas importadas
        #[arg(short, long)]
        user_id: i64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Inicializa o logger
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("🔥 {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = Settings::from_env()?;
    let app_state = AppState::new(settings).await?;

    // O esquema precisa estar pronto antes de qualquer gravação
    schema::provision(&app_state.db_pool).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let listener = TcpListener::bind(app_state.settings.bind_addr.as_str()).await?;
            tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
            axum::serve(listener, nfce_backend::router(app_state)).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Import { dir, user_id } => {
            app_state.user_service.find(user_id).await?;

            let report = app_state.importer.import_all(&dir, user_id).await?;
            println!(
                "Importação concluída: {} processados, {} ok, {} com erro",
                report.processed, report.succeeded, report.failed
            );
            for failure in &report.failures {
                println!("  ✗ {} [{:?}] {}", failure.document, failure.kind, failure.message);
            }

            Ok(if report.failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
