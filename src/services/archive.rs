// src/services/archive.rs

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use crate::{common::error::AppError, models::document::InvoiceDocument};

/// Arquivo dos documentos brutos: um JSON por chave de acesso (`<chave>.json`).
/// É a fonte do importador de reprocessamento.
#[derive(Debug, Clone)]
pub struct DocumentArchive {
    dir: PathBuf,
}

impl DocumentArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, access_key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", access_key))
    }

    /// Grava (ou sobrescreve) o documento. Escreve num temporário e renomeia,
    /// para que o importador nunca leia um arquivo pela metade.
    pub async fn store(&self, access_key: &str, doc: &InvoiceDocument) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let target = self.path_for(access_key);
        let body = serde_json::to_vec_pretty(doc)?;
        let dir = self.dir.clone();
        let dest = target.clone();

        tokio::task::spawn_blocking(move || -> Result<(), AppError> {
            // Um temporário por escrita: duas gravações da mesma chave não dividem o arquivo
            let mut tmp = tempfile::Builder::new()
                .prefix(".nfce-")
                .suffix(".tmp")
                .tempfile_in(&dir)?;
            tmp.write_all(&body)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&dest).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))??;

        Ok(target)
    }

    /// Arquivos `.json` de um diretório, em ordem de nome.
    pub async fn list(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut paths = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
            if is_json && entry.file_type().await?.is_file() {
                paths.push(path);
            }
        }

        paths.sort();
        Ok(paths)
    }

    pub async fn load(path: &Path) -> Result<InvoiceDocument, AppError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
