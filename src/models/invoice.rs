// src/models/invoice.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// ---
// 1. Nota normalizada (saída do normalizador, entrada do motor de persistência)
// ---
// Tipos fortes: decimais para valores, timestamps já em UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInvoice {
    pub access_key: String,
    pub company: NormalizedCompany,
    pub number: String,
    pub series: String,
    pub authorization_protocol: String,
    pub authorized_at: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
    pub taxes: TaxAmounts,
    pub items: Vec<NormalizedItem>,
    /// Total declarado em `totais`; na ausência dele, a soma das linhas do documento.
    pub total: Decimal,
    /// Itens como a nota os conta (antes de juntar produtos repetidos).
    pub item_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCompany {
    pub tax_id: String, // CNPJ só com dígitos
    pub legal_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxAmounts {
    pub federal: Decimal,
    pub state: Decimal,
    pub municipal: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedItem {
    pub product_code: String,
    pub product_description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub unit_of_measure: String,
}

// ---
// 2. Linhas do banco
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: i64,
    pub tax_id: String,
    pub legal_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub code: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i64,
    pub access_key: String,
    pub company_id: i64,
    pub user_id: i64,
    pub number: String,
    pub series: String,
    pub authorization_protocol: String,
    pub authorized_at: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
    pub federal_tax: Decimal,
    pub state_tax: Decimal,
    pub municipal_tax: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub id: i64,
    pub product_id: i64,
    pub invoice_id: i64,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub unit_of_measure: String,
    pub updated_at: DateTime<Utc>,
}

// Linha com os dados do produto (JOIN), para leitura
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub product_id: i64,
    pub product_code: String,
    pub product_description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub unit_of_measure: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub company: Company,
    pub lines: Vec<InvoiceLine>,
}

// ---
// 3. Resumo devolvido ao front-end após gravar a nota
// ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub invoice_id: i64,
    pub access_key: String,
    pub company_name: String,
    pub issued_at: DateTime<Utc>,
    pub total: Decimal,
    pub item_count: usize,
}

impl InvoiceSummary {
    pub fn new(invoice_id: i64, invoice: &NormalizedInvoice) -> Self {
        Self {
            invoice_id,
            access_key: invoice.access_key.clone(),
            company_name: invoice.company.legal_name.clone(),
            issued_at: invoice.issued_at,
            total: invoice.total,
            item_count: invoice.item_count,
        }
    }
}
