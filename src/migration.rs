//! Schema DDL for the PostgreSQL backend. Idempotent: every statement is
//! `IF NOT EXISTS`, so it runs on every start.

use crate::error::StoreError;
use sqlx::PgPool;

/// In dependency order. `order_product` has no key of its own; duplicate pairs
/// are kept out by the store, not by the schema.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS "user" (
        id SERIAL PRIMARY KEY,
        name VARCHAR(30) NOT NULL,
        address VARCHAR(200) NOT NULL,
        email VARCHAR(200) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS product (
        id SERIAL PRIMARY KEY,
        name VARCHAR(200) NOT NULL,
        price DOUBLE PRECISION NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id SERIAL PRIMARY KEY,
        order_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        user_id INTEGER NOT NULL REFERENCES "user"(id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS orders_user_id_idx ON orders (user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS order_product (
        order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        product_id INTEGER NOT NULL REFERENCES product(id) ON DELETE CASCADE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS order_product_order_id_idx ON order_product (order_id)",
];

/// Create tables and indexes in one transaction.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;
    for sql in SCHEMA {
        sqlx::query(sql).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!(statements = SCHEMA.len(), "schema applied");
    Ok(())
}
