mod common;

use rust_decimal::Decimal;
use serde_json::json;

use nfce_backend::{
    common::error::AppError,
    models::{document::InvoiceDocument, user::NewChatUser},
    services::{normalizer::normalize, InvoiceService},
};

use common::*;

#[tokio::test]
async fn example_receipt_creates_one_row_per_entity() {
    let Some(pool) = test_pool().await else { return };
    let user_id = register_user(&pool).await;
    let service = InvoiceService::new(pool.clone());

    let access_key = format!("41240{}", unique_digits(39));
    let product_code = format!("789{}", unique_digits(10));
    let doc: InvoiceDocument = serde_json::from_value(json!({
        "empresa": { "cnpj": "12.345.678/0001-90", "razao_social": "Mercado Exemplo" },
        "informacoes": {
            "chave_acesso": access_key,
            "numero": "12",
            "serie": "1",
            "protocolo_autorizacao": "141240000000001",
            "data_autorizacao": "10/05/2024 14:32:10",
            "data_emissao": "10/05/2024 14:30:00"
        },
        "tributos": { "federal": "0,10", "estadual": "0,20", "municipal": "0,00" },
        "itens": {
            "1": {
                "codigo_produto": product_code,
                "descricao_produto": "AGUA MINERAL 500ML",
                "quantidade": "2",
                "preco_unitario": "3,50",
                "unidade_medida": "UN"
            }
        }
    }))
    .unwrap();

    let invoice = normalize(&doc).unwrap();
    service.persist(user_id, &invoice).await.unwrap();

    assert_eq!(count_invoices(&pool, &access_key).await, 1);
    assert_eq!(count_companies(&pool, "12345678000190").await, 1);
    assert_eq!(count_products(&pool, &product_code).await, 1);
    assert_eq!(count_lines(&pool, &access_key).await, 1);

    let detail = service.find_by_access_key(&access_key).await.unwrap().unwrap();
    assert_eq!(detail.invoice.user_id, user_id);
    assert_eq!(detail.lines[0].quantity, Decimal::from(2));
    assert_eq!(detail.lines[0].unit_price, Decimal::new(350, 2));
}

#[tokio::test]
async fn persisting_the_same_invoice_twice_is_idempotent() {
    let Some(pool) = test_pool().await else { return };
    let user_id = register_user(&pool).await;
    let service = InvoiceService::new(pool.clone());

    let access_key = unique_digits(44);
    let tax_id = unique_digits(14);
    let codes = [unique_digits(13), unique_digits(13)];
    let invoice = invoice(
        &access_key,
        &tax_id,
        vec![
            item(&codes[0], Decimal::from(1), Decimal::new(999, 2)),
            item(&codes[1], Decimal::new(1500, 3), Decimal::new(2290, 2)),
        ],
    );

    let first = service.persist(user_id, &invoice).await.unwrap();
    let second = service.persist(user_id, &invoice).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(count_invoices(&pool, &access_key).await, 1);
    assert_eq!(count_lines(&pool, &access_key).await, 2);
    assert_eq!(count_companies(&pool, &tax_id).await, 1);
    for code in &codes {
        assert_eq!(count_products(&pool, code).await, 1);
    }
}

#[tokio::test]
async fn reingestion_updates_the_header_and_replaces_lines() {
    let Some(pool) = test_pool().await else { return };
    let user_id = register_user(&pool).await;
    let other_user = register_user(&pool).await;
    let service = InvoiceService::new(pool.clone());

    let access_key = unique_digits(44);
    let tax_id = unique_digits(14);
    let kept = unique_digits(13);
    let dropped = unique_digits(13);
    let added = unique_digits(13);

    let original = invoice(
        &access_key,
        &tax_id,
        vec![
            item(&kept, Decimal::from(1), Decimal::new(500, 2)),
            item(&dropped, Decimal::from(3), Decimal::new(100, 2)),
        ],
    );
    let id = service.persist(user_id, &original).await.unwrap();

    let mut revised = invoice(
        &access_key,
        &tax_id,
        vec![
            item(&kept, Decimal::from(4), Decimal::new(450, 2)),
            item(&added, Decimal::from(1), Decimal::new(1200, 2)),
        ],
    );
    revised.number = "9999".into();
    revised.taxes.federal = Decimal::new(88, 2);
    revised.company.legal_name = "Supermercado Exemplo S.A.".into();
    assert_eq!(service.persist(other_user, &revised).await.unwrap(), id);

    let detail = service.find_by_access_key(&access_key).await.unwrap().unwrap();
    assert_eq!(detail.invoice.id, id);
    assert_eq!(detail.invoice.number, "9999");
    assert_eq!(detail.invoice.user_id, other_user);
    assert_eq!(detail.invoice.federal_tax, Decimal::new(88, 2));
    assert_eq!(detail.company.legal_name, "Supermercado Exemplo S.A.");

    let mut codes: Vec<&str> = detail.lines.iter().map(|l| l.product_code.as_str()).collect();
    codes.sort();
    let mut expected = vec![kept.as_str(), added.as_str()];
    expected.sort();
    assert_eq!(codes, expected);

    let kept_line = detail.lines.iter().find(|l| l.product_code == kept).unwrap();
    assert_eq!(kept_line.quantity, Decimal::from(4));
    assert_eq!(kept_line.unit_price, Decimal::new(450, 2));

    // O produto que saiu da nota continua no catálogo
    assert_eq!(count_products(&pool, &dropped).await, 1);
}

#[tokio::test]
async fn companies_and_products_are_shared_across_invoices() {
    let Some(pool) = test_pool().await else { return };
    let user_id = register_user(&pool).await;
    let service = InvoiceService::new(pool.clone());

    let tax_id = unique_digits(14);
    let code = unique_digits(13);
    let first_key = unique_digits(44);
    let second_key = unique_digits(44);

    service
        .persist(user_id, &invoice(&first_key, &tax_id, vec![item(&code, Decimal::ONE, Decimal::ONE)]))
        .await
        .unwrap();
    let mut second = invoice(&second_key, &tax_id, vec![item(&code, Decimal::TWO, Decimal::ONE)]);
    second.items[0].product_description = "DESCRICAO NOVA".into();
    service.persist(user_id, &second).await.unwrap();

    assert_eq!(count_companies(&pool, &tax_id).await, 1);
    assert_eq!(count_products(&pool, &code).await, 1);
    assert_eq!(count_invoices(&pool, &first_key).await, 1);
    assert_eq!(count_invoices(&pool, &second_key).await, 1);

    let first = service.find_by_access_key(&first_key).await.unwrap().unwrap();
    let second = service.find_by_access_key(&second_key).await.unwrap().unwrap();
    assert_eq!(first.company.id, second.company.id);
    assert_eq!(first.lines[0].product_id, second.lines[0].product_id);
    assert_eq!(second.lines[0].product_description, "DESCRICAO NOVA");
}

#[tokio::test]
async fn unknown_user_is_rejected_without_writing() {
    let Some(pool) = test_pool().await else { return };
    let service = InvoiceService::new(pool.clone());

    let access_key = unique_digits(44);
    let tax_id = unique_digits(14);
    let result = service
        .persist(unique_user_id(), &invoice(&access_key, &tax_id, vec![]))
        .await;

    assert!(matches!(result, Err(AppError::NotFound { .. })));
    assert_eq!(count_invoices(&pool, &access_key).await, 0);
    assert_eq!(count_companies(&pool, &tax_id).await, 0);
}

#[tokio::test]
async fn failing_line_rolls_back_the_whole_invoice() {
    let Some(pool) = test_pool().await else { return };
    let user_id = register_user(&pool).await;
    let service = InvoiceService::new(pool.clone());

    let access_key = unique_digits(44);
    let tax_id = unique_digits(14);
    // Códigos em ordem: o primeiro item é gravado antes do segundo falhar no CHECK do banco
    let good = format!("1{}", unique_digits(12));
    let bad = format!("2{}", unique_digits(12));
    let broken = invoice(
        &access_key,
        &tax_id,
        vec![
            item(&good, Decimal::ONE, Decimal::ONE),
            item(&bad, Decimal::from(-1), Decimal::ONE),
        ],
    );

    let result = service.persist(user_id, &broken).await;

    assert!(matches!(result, Err(AppError::DatabaseError(_))));
    assert_eq!(count_invoices(&pool, &access_key).await, 0);
    assert_eq!(count_companies(&pool, &tax_id).await, 0);
    assert_eq!(count_products(&pool, &good).await, 0);
}

#[tokio::test]
async fn concurrent_writes_of_the_same_key_keep_one_row() {
    let Some(pool) = test_pool().await else { return };
    let user_id = register_user(&pool).await;
    let service = InvoiceService::new(pool.clone());

    let access_key = unique_digits(44);
    let tax_id = unique_digits(14);
    let codes = [unique_digits(13), unique_digits(13), unique_digits(13)];

    let mut a = invoice(
        &access_key,
        &tax_id,
        codes.iter().map(|c| item(c, Decimal::ONE, Decimal::ONE)).collect(),
    );
    a.number = "A".into();
    let mut b = a.clone();
    b.number = "B".into();
    b.items.reverse();

    let (sa, sb) = (service.clone(), service.clone());
    let ta = tokio::spawn(async move { sa.persist(user_id, &a).await });
    let tb = tokio::spawn(async move { sb.persist(user_id, &b).await });
    let id_a = ta.await.unwrap().unwrap();
    let id_b = tb.await.unwrap().unwrap();

    assert_eq!(id_a, id_b);
    assert_eq!(count_invoices(&pool, &access_key).await, 1);
    assert_eq!(count_lines(&pool, &access_key).await, 3);

    let detail = service.find_by_access_key(&access_key).await.unwrap().unwrap();
    assert!(detail.invoice.number == "A" || detail.invoice.number == "B");
}

#[tokio::test]
async fn persist_for_registers_the_user_in_the_same_transaction() {
    let Some(pool) = test_pool().await else { return };
    let service = InvoiceService::new(pool.clone());

    let user = NewChatUser {
        id: unique_user_id(),
        first_name: "João".into(),
        last_name: None,
        username: None,
    };
    let access_key = unique_digits(44);
    service
        .persist_for(&user, &invoice(&access_key, &unique_digits(14), vec![]))
        .await
        .unwrap();

    let detail = service.find_by_access_key(&access_key).await.unwrap().unwrap();
    assert_eq!(detail.invoice.user_id, user.id);
    assert!(detail.lines.is_empty());
}

#[tokio::test]
async fn unknown_access_key_reads_as_none() {
    let Some(pool) = test_pool().await else { return };
    let service = InvoiceService::new(pool);
    assert!(service.find_by_access_key(&unique_digits(44)).await.unwrap().is_none());
}

#[tokio::test]
async fn repeated_product_is_stored_with_the_document_value() {
    let Some(pool) = test_pool().await else { return };
    let user_id = register_user(&pool).await;
    let service = InvoiceService::new(pool.clone());

    let access_key = unique_digits(44);
    let code = unique_digits(13);
    let doc: InvoiceDocument = serde_json::from_value(json!({
        "empresa": { "cnpj": unique_digits(14), "razao_social": "Mercado Exemplo" },
        "informacoes": {
            "chave_acesso": access_key,
            "numero": "13",
            "serie": "1",
            "protocolo_autorizacao": "141240000000002",
            "data_autorizacao": "10/05/2024 14:32:10",
            "data_emissao": "10/05/2024 14:30:00"
        },
        "tributos": { "federal": "0", "estadual": "0", "municipal": "0" },
        "itens": {
            "1": { "codigo_produto": code, "descricao_produto": "PAO FRANCES", "quantidade": "2", "preco_unitario": "3,50", "unidade_medida": "UN" },
            "2": { "codigo_produto": code, "descricao_produto": "PAO FRANCES", "quantidade": "3", "preco_unitario": "3,40", "unidade_medida": "UN" }
        }
    }))
    .unwrap();

    let invoice = normalize(&doc).unwrap();
    service.persist(user_id, &invoice).await.unwrap();

    let detail = service.find_by_access_key(&access_key).await.unwrap().unwrap();
    assert_eq!(detail.lines.len(), 1);
    let stored: Decimal = detail.lines.iter().map(|l| l.quantity * l.unit_price).sum();
    assert_eq!(stored, Decimal::new(1720, 2));
    assert_eq!(detail.lines[0].quantity, Decimal::from(5));
}
