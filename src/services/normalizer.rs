// src/services/normalizer.rs

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::{
    common::error::AppError,
    models::{
        document::{InvoiceDocument, ItemBlock, RawScalar},
        invoice::{NormalizedCompany, NormalizedInvoice, NormalizedItem, TaxAmounts},
    },
};

// Horário de Brasília; usado quando a data não traz fuso.
const BRT_OFFSET_SECS: i32 = -3 * 3600;

const DATETIME_FORMATS: &[&str] = &["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M", "%Y-%m-%d %H:%M:%S"];
const DATETIME_TZ_FORMATS: &[&str] = &["%d/%m/%Y %H:%M:%S%:z", "%d/%m/%Y %H:%M:%S %:z"];
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d"];

/// Valida e converte o documento do scraper em uma `NormalizedInvoice`.
/// Função pura: não toca no banco. Qualquer campo inválido aborta com `ValidationError`.
pub fn normalize(doc: &InvoiceDocument) -> Result<NormalizedInvoice, AppError> {
    let info = doc
        .info
        .as_ref()
        .ok_or_else(|| AppError::validation("informacoes", "bloco ausente"))?;

    // A chave de acesso vem primeiro: sem ela não há deduplicação possível.
    let access_key = parse_access_key(info.chave_acesso.as_ref())?;

    let company_block = doc
        .company
        .as_ref()
        .ok_or_else(|| AppError::validation("empresa", "bloco ausente"))?;
    let company = NormalizedCompany {
        tax_id: parse_tax_id(company_block.cnpj.as_ref())?,
        legal_name: required_text(company_block.razao_social.as_ref(), "empresa.razao_social")?,
    };

    let number = required_text(info.numero.as_ref(), "informacoes.numero")?;
    let series = required_text(info.serie.as_ref(), "informacoes.serie")?;
    let authorization_protocol = required_text(
        info.protocolo_autorizacao.as_ref(),
        "informacoes.protocolo_autorizacao",
    )?;
    let authorized_at = parse_datetime(info.data_autorizacao.as_ref(), "informacoes.data_autorizacao")?;
    let issued_at = parse_datetime(info.data_emissao.as_ref(), "informacoes.data_emissao")?;

    let tax_block = doc
        .taxes
        .as_ref()
        .ok_or_else(|| AppError::validation("tributos", "bloco ausente"))?;
    let taxes = TaxAmounts {
        federal: parse_amount(tax_block.federal.as_ref(), "tributos.federal")?,
        state: parse_amount(tax_block.estadual.as_ref(), "tributos.estadual")?,
        municipal: parse_amount(tax_block.municipal.as_ref(), "tributos.municipal")?,
    };

    let item_map = doc
        .items
        .as_ref()
        .ok_or_else(|| AppError::validation("itens", "bloco ausente"))?;

    let mut indexed: Vec<(&String, &ItemBlock)> = item_map.iter().collect();
    indexed.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    });

    let mut items: Vec<NormalizedItem> = Vec::with_capacity(indexed.len());
    let mut document_total = Decimal::ZERO;
    for &(index, block) in &indexed {
        let item = normalize_item(index, block)?;
        let value = line_value(&item, index)?;
        document_total = document_total
            .checked_add(value)
            .ok_or_else(|| overflow(index))?;

        // Mesmo produto repetido na nota vira uma única linha
        match items.iter().position(|i| i.product_code == item.product_code) {
            Some(pos) => merge_repeated(&mut items[pos], item, index)?,
            None => items.push(item),
        }
    }

    let totals = doc.totals.as_ref();
    let total = match totals.and_then(|t| t.valor_a_pagar.as_ref()) {
        Some(raw) => parse_amount(Some(raw), "totais.valor_a_pagar")?,
        None => document_total,
    };
    let item_count = match totals.and_then(|t| t.quantidade_itens.as_ref()) {
        Some(raw) => parse_count(raw, "totais.quantidade_itens")?,
        None => indexed.len(),
    };

    Ok(NormalizedInvoice {
        access_key,
        company,
        number,
        series,
        authorization_protocol,
        authorized_at,
        issued_at,
        taxes,
        items,
        total,
        item_count,
    })
}

fn normalize_item(index: &str, block: &ItemBlock) -> Result<NormalizedItem, AppError> {
    let field = |name: &str| format!("itens.{}.{}", index, name);

    let product_code = required_text(block.codigo_produto.as_ref(), &field("codigo_produto"))?;
    if product_code.is_empty() {
        return Err(AppError::validation(field("codigo_produto"), "não pode ser vazio"));
    }

    Ok(NormalizedItem {
        product_code,
        product_description: required_text(
            block.descricao_produto.as_ref(),
            &field("descricao_produto"),
        )?,
        quantity: parse_amount(block.quantidade.as_ref(), &field("quantidade"))?,
        unit_price: parse_amount(block.preco_unitario.as_ref(), &field("preco_unitario"))?,
        unit_of_measure: required_text(block.unidade_medida.as_ref(), &field("unidade_medida"))?,
    })
}

fn overflow(index: &str) -> AppError {
    AppError::validation(format!("itens.{}.quantidade", index), "valor excede o limite")
}

fn line_value(item: &NormalizedItem, index: &str) -> Result<Decimal, AppError> {
    item.quantity
        .checked_mul(item.unit_price)
        .ok_or_else(|| overflow(index))
}

// Soma as quantidades preservando o valor da linha: com preços diferentes, o preço
// unitário passa a ser a média ponderada Σ(q·p)/Σq, que precisa ser exata.
fn merge_repeated(existing: &mut NormalizedItem, item: NormalizedItem, index: &str) -> Result<(), AppError> {
    let quantity = existing
        .quantity
        .checked_add(item.quantity)
        .ok_or_else(|| overflow(index))?;

    if existing.unit_price != item.unit_price && !quantity.is_zero() {
        let value = line_value(existing, index)?
            .checked_add(line_value(&item, index)?)
            .ok_or_else(|| overflow(index))?;
        existing.unit_price = value
            .checked_div(quantity)
            .filter(|price| price.checked_mul(quantity) == Some(value))
            .ok_or_else(|| {
                AppError::validation(
                    format!("itens.{}.preco_unitario", index),
                    "preço diferente para o mesmo produto sem média exata",
                )
            })?
            .normalize();
    } else {
        existing.unit_price = item.unit_price;
    }

    existing.quantity = quantity;
    existing.unit_of_measure = item.unit_of_measure;
    existing.product_description = item.product_description;
    Ok(())
}

fn parse_count(raw: &RawScalar, field: &str) -> Result<usize, AppError> {
    let text = raw.as_text().trim().to_string();
    text.parse::<usize>()
        .map_err(|_| AppError::validation(field, format!("contagem inválida: '{}'", text)))
}

fn required_text(raw: Option<&RawScalar>, field: &str) -> Result<String, AppError> {
    raw.map(|v| v.as_text().trim().to_string())
        .ok_or_else(|| AppError::validation(field, "campo obrigatório ausente"))
}

fn parse_access_key(raw: Option<&RawScalar>) -> Result<String, AppError> {
    const FIELD: &str = "informacoes.chave_acesso";
    let key: String = required_text(raw, FIELD)?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if key.is_empty() {
        return Err(AppError::validation(FIELD, "não pode ser vazia"));
    }
    if !key.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation(FIELD, "deve conter apenas dígitos"));
    }
    if key.len() != 44 {
        tracing::debug!("Chave de acesso com {} dígitos (esperado 44): {}", key.len(), key);
    }
    Ok(key)
}

fn parse_tax_id(raw: Option<&RawScalar>) -> Result<String, AppError> {
    const FIELD: &str = "empresa.cnpj";
    let tax_id: String = required_text(raw, FIELD)?
        .chars()
        .filter(|c| !matches!(*c, '.' | '/' | '-') && !c.is_whitespace())
        .collect();

    if tax_id.is_empty() {
        return Err(AppError::validation(FIELD, "não pode ser vazio"));
    }
    if !tax_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation(FIELD, "deve conter apenas dígitos e pontuação"));
    }
    Ok(tax_id)
}

/// Converte valores monetários e quantidades. Aceita "1.234,56", "R$ 3,50", "3.50" e números JSON.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    // Com vírgula, o formato é brasileiro: ponto é separador de milhar.
    let canonical = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    Decimal::from_str(&canonical)
        .or_else(|_| Decimal::from_scientific(&canonical))
        .ok()
}

fn parse_amount(raw: Option<&RawScalar>, field: &str) -> Result<Decimal, AppError> {
    let text = required_text(raw, field)?;
    let value = parse_decimal(&text)
        .ok_or_else(|| AppError::validation(field, format!("valor numérico inválido: '{}'", text)))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::validation(field, "não pode ser negativo"));
    }
    Ok(value)
}

/// Converte as datas da nota para UTC. Sem fuso explícito, assume horário de Brasília.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let brt = FixedOffset::east_opt(BRT_OFFSET_SECS)?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_TZ_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return brt.from_local_datetime(&naive).single().map(|dt| dt.with_timezone(&Utc));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return brt.from_local_datetime(&naive).single().map(|dt| dt.with_timezone(&Utc));
        }
    }
    None
}

fn parse_datetime(raw: Option<&RawScalar>, field: &str) -> Result<DateTime<Utc>, AppError> {
    let text = required_text(raw, field)?;
    parse_timestamp(&text)
        .ok_or_else(|| AppError::validation(field, format!("data inválida: '{}'", text)))
}
