#![allow(dead_code)]

use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use nfce_backend::{
    db::schema,
    models::{
        invoice::{NormalizedCompany, NormalizedInvoice, NormalizedItem, TaxAmounts},
        user::NewChatUser,
    },
    services::UserService,
    db::UserRepository,
};

/// Pool de teste. Sem DATABASE_URL (ou sem banco acessível) os testes de banco são pulados.
pub async fn test_pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();

    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL não definida; pulando teste de banco");
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Banco indisponível ({}); pulando teste de banco", e);
            return None;
        }
    };

    schema::provision(&pool).await.expect("migrações devem rodar");
    Some(pool)
}

/// Sequência de dígitos única por chamada; os testes compartilham o banco.
pub fn unique_digits(len: usize) -> String {
    let mut digits = String::new();
    while digits.len() < len {
        digits.push_str(&Uuid::new_v4().as_u128().to_string());
    }
    digits.truncate(len);
    digits
}

pub fn unique_user_id() -> i64 {
    (Uuid::new_v4().as_u128() % (i64::MAX as u128)) as i64
}

pub async fn register_user(pool: &PgPool) -> i64 {
    let id = unique_user_id();
    let users = UserService::new(UserRepository::new(pool.clone()), pool.clone());
    users
        .register(&NewChatUser {
            id,
            first_name: "Maria".into(),
            last_name: Some("Souza".into()),
            username: Some("maria_s".into()),
        })
        .await
        .expect("registro do usuário");
    id
}

pub fn item(code: &str, quantity: Decimal, unit_price: Decimal) -> NormalizedItem {
    NormalizedItem {
        product_code: code.to_string(),
        product_description: format!("PRODUTO {}", code),
        quantity,
        unit_price,
        unit_of_measure: "UN".into(),
    }
}

pub fn invoice(access_key: &str, tax_id: &str, items: Vec<NormalizedItem>) -> NormalizedInvoice {
    let total = items.iter().map(|i| i.quantity * i.unit_price).sum();
    let item_count = items.len();
    let issued_at = "2024-05-10T17:30:00Z".parse().unwrap();
    NormalizedInvoice {
        access_key: access_key.to_string(),
        company: NormalizedCompany {
            tax_id: tax_id.to_string(),
            legal_name: "Supermercado Exemplo LTDA".into(),
        },
        number: "4521".into(),
        series: "1".into(),
        authorization_protocol: "333240012345678".into(),
        authorized_at: issued_at,
        issued_at,
        taxes: TaxAmounts {
            federal: Decimal::new(45, 2),
            state: Decimal::new(126, 2),
            municipal: Decimal::ZERO,
        },
        items,
        total,
        item_count,
    }
}

pub async fn count(pool: &PgPool, sql: &str, key: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(key)
        .fetch_one(pool)
        .await
        .expect("contagem")
}

pub async fn count_invoices(pool: &PgPool, access_key: &str) -> i64 {
    count(pool, "SELECT COUNT(*) FROM invoices WHERE access_key = $1", access_key).await
}

pub async fn count_lines(pool: &PgPool, access_key: &str) -> i64 {
    count(
        pool,
        "SELECT COUNT(*) FROM invoice_items ii JOIN invoices i ON i.id = ii.invoice_id WHERE i.access_key = $1",
        access_key,
    )
    .await
}

pub async fn count_companies(pool: &PgPool, tax_id: &str) -> i64 {
    count(pool, "SELECT COUNT(*) FROM companies WHERE tax_id = $1", tax_id).await
}

pub async fn count_products(pool: &PgPool, code: &str) -> i64 {
    count(pool, "SELECT COUNT(*) FROM products WHERE code = $1", code).await
}
