// src/models/document.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---
// Documento da Nota (o que o scraper entrega e o que fica arquivado)
// ---
// As chaves seguem o JSON produzido pelo scraper (em português).
// Todo campo é opcional na desserialização: quem decide o que é obrigatório é o normalizador,
// que consegue então apontar exatamente qual campo faltou.

/// Valor escalar vindo do scraper: às vezes texto ("3,50"), às vezes número (3.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Text(String),
    Number(serde_json::Number),
}

impl RawScalar {
    pub fn as_text(&self) -> String {
        match self {
            RawScalar::Text(s) => s.clone(),
            RawScalar::Number(n) => n.to_string(),
        }
    }
}

impl From<&str> for RawScalar {
    fn from(value: &str) -> Self {
        RawScalar::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    #[serde(rename = "empresa", default, skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyBlock>,

    #[serde(rename = "informacoes", default, skip_serializing_if = "Option::is_none")]
    pub info: Option<InfoBlock>,

    #[serde(rename = "tributos", default, skip_serializing_if = "Option::is_none")]
    pub taxes: Option<TaxBlock>,

    // Chave = índice opaco do item na página ("1", "2", ...)
    #[serde(rename = "itens", default, skip_serializing_if = "Option::is_none")]
    pub items: Option<BTreeMap<String, ItemBlock>>,

    #[serde(rename = "totais", default, skip_serializing_if = "Option::is_none")]
    pub totals: Option<TotalsBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razao_social: Option<RawScalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chave_acesso: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serie: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocolo_autorizacao: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_autorizacao: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_emissao: Option<RawScalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub federal: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estadual: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipal: Option<RawScalar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_produto: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descricao_produto: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantidade: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preco_unitario: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unidade_medida: Option<RawScalar>,
}

// Bloco informativo: não é persistido, só usado no resumo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalsBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantidade_itens: Option<RawScalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_a_pagar: Option<RawScalar>,
}
