// src/models/import.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::ErrorKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<ImportFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    pub document: String, // nome do arquivo de origem
    pub kind: ErrorKind,
    pub message: String,
}

impl ImportReport {
    pub fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, document: String, kind: ErrorKind, message: String) {
        self.processed += 1;
        self.failed += 1;
        self.failures.push(ImportFailure { document, kind, message });
    }
}
