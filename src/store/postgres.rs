//! PostgreSQL backend. Each call checks a connection out of the pool (or opens a
//! transaction for writes) and gives it back when the call returns, on success or error.

use super::Store;
use crate::error::StoreError;
use crate::migration::apply_migrations;
use crate::models::{Entity, Order, OrderInput, Product, ProductInput, User, UserInput};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgConnection, PgPool};
use std::str::FromStr;

const USER_COLUMNS: &str = "id, name, address, email";
const PRODUCT_COLUMNS: &str = "id, name, price";
const ORDER_COLUMNS: &str = "id, order_date, user_id";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    /// Create the database if missing, open a pool and apply the schema.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        ensure_database_exists(database_url).await?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        apply_migrations(&pool).await?;
        Ok(Self::new(pool))
    }
}

/// Row-lock `id` in `table` for the rest of the transaction, or fail with `MissingReference`.
async fn lock_row(
    conn: &mut PgConnection,
    table: &str,
    entity: Entity,
    id: i32,
    mode: &str,
) -> Result<(), StoreError> {
    let sql = format!("SELECT id FROM {} WHERE id = $1 FOR {}", table, mode);
    let found: Option<i32> = sqlx::query_scalar(&sql).bind(id).fetch_optional(&mut *conn).await?;
    match found {
        Some(_) => Ok(()),
        None => Err(StoreError::MissingReference { entity, id }),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, input: &UserInput) -> Result<User, StoreError> {
        let sql = format!(
            r#"INSERT INTO "user" (name, address, email) VALUES ($1, $2, $3) RETURNING {}"#,
            USER_COLUMNS
        );
        let mut tx = self.pool.begin().await?;
        let user: User = sqlx::query_as(&sql)
            .bind(&input.name)
            .bind(&input.address)
            .bind(&input.email)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(user_id = user.id, "insert user");
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!(r#"SELECT {} FROM "user" ORDER BY id"#, USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>, StoreError> {
        let sql = format!(r#"SELECT {} FROM "user" WHERE id = $1"#, USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn update_user(&self, id: i32, input: &UserInput) -> Result<Option<User>, StoreError> {
        let sql = format!(
            r#"UPDATE "user" SET name = $1, address = $2, email = $3 WHERE id = $4 RETURNING {}"#,
            USER_COLUMNS
        );
        let mut tx = self.pool.begin().await?;
        let user: Option<User> = sqlx::query_as(&sql)
            .bind(&input.name)
            .bind(&input.address)
            .bind(&input.email)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(user_id = id, updated = user.is_some(), "update user");
        Ok(user)
    }

    async fn delete_user(&self, id: i32) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        // FOR UPDATE conflicts with create_order's FOR SHARE on the same row.
        match lock_row(&mut tx, r#""user""#, Entity::User, id, "UPDATE").await {
            Ok(()) => {}
            Err(StoreError::MissingReference { .. }) => return Ok(false),
            Err(e) => return Err(e),
        }
        let has_orders: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE user_id = $1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if has_orders {
            return Err(StoreError::UserHasOrders(id));
        }
        let result = sqlx::query(r#"DELETE FROM "user" WHERE id = $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(user_id = id, rows = result.rows_affected(), "delete user");
        Ok(result.rows_affected() > 0)
    }

    async fn create_product(&self, input: &ProductInput) -> Result<Product, StoreError> {
        let sql = format!(
            "INSERT INTO product (name, price) VALUES ($1, $2) RETURNING {}",
            PRODUCT_COLUMNS
        );
        let mut tx = self.pool.begin().await?;
        let product: Product = sqlx::query_as(&sql)
            .bind(&input.name)
            .bind(input.price)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(product_id = product.id, "insert product");
        Ok(product)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let sql = format!("SELECT {} FROM product ORDER BY id", PRODUCT_COLUMNS);
        Ok(sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_product(&self, id: i32) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {} FROM product WHERE id = $1", PRODUCT_COLUMNS);
        Ok(sqlx::query_as::<_, Product>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn update_product(&self, id: i32, input: &ProductInput) -> Result<Option<Product>, StoreError> {
        let sql = format!(
            "UPDATE product SET name = $1, price = $2 WHERE id = $3 RETURNING {}",
            PRODUCT_COLUMNS
        );
        let mut tx = self.pool.begin().await?;
        let product: Option<Product> = sqlx::query_as(&sql)
            .bind(&input.name)
            .bind(input.price)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(product_id = id, updated = product.is_some(), "update product");
        Ok(product)
    }

    async fn delete_product(&self, id: i32) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(product_id = id, rows = result.rows_affected(), "delete product");
        Ok(result.rows_affected() > 0)
    }

    async fn create_order(&self, input: &OrderInput) -> Result<Order, StoreError> {
        let sql = format!(
            "INSERT INTO orders (user_id, order_date) VALUES ($1, COALESCE($2, NOW())) RETURNING {}",
            ORDER_COLUMNS
        );
        let mut tx = self.pool.begin().await?;
        lock_row(&mut tx, r#""user""#, Entity::User, input.user_id, "SHARE").await?;
        let order: Order = sqlx::query_as(&sql)
            .bind(input.user_id)
            .bind(input.order_date)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(order_id = order.id, user_id = order.user_id, "insert order");
        Ok(order)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let sql = format!("SELECT {} FROM orders ORDER BY id", ORDER_COLUMNS);
        Ok(sqlx::query_as::<_, Order>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_order(&self, id: i32) -> Result<Option<Order>, StoreError> {
        let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
        Ok(sqlx::query_as::<_, Order>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn delete_order(&self, id: i32) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(order_id = id, rows = result.rows_affected(), "delete order");
        Ok(result.rows_affected() > 0)
    }

    async fn orders_for_user(&self, user_id: i32) -> Result<Vec<Order>, StoreError> {
        let sql = format!("SELECT {} FROM orders WHERE user_id = $1 ORDER BY id", ORDER_COLUMNS);
        Ok(sqlx::query_as::<_, Order>(&sql).bind(user_id).fetch_all(&self.pool).await?)
    }

    async fn products_for_order(&self, order_id: i32) -> Result<Vec<Product>, StoreError> {
        let sql = "SELECT DISTINCT p.id, p.name, p.price FROM product p \
                   JOIN order_product op ON op.product_id = p.id \
                   WHERE op.order_id = $1 ORDER BY p.id";
        Ok(sqlx::query_as::<_, Product>(sql).bind(order_id).fetch_all(&self.pool).await?)
    }

    async fn add_product_to_order(&self, order_id: i32, product_id: i32) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        // The order row lock serializes concurrent adds for the same order.
        lock_row(&mut tx, "orders", Entity::Order, order_id, "UPDATE").await?;
        lock_row(&mut tx, "product", Entity::Product, product_id, "SHARE").await?;
        let present: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM order_product WHERE order_id = $1 AND product_id = $2)",
        )
        .bind(order_id)
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;
        if present {
            return Ok(false);
        }
        sqlx::query("INSERT INTO order_product (order_id, product_id) VALUES ($1, $2)")
            .bind(order_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(order_id, product_id, "insert order_product");
        Ok(true)
    }

    async fn remove_product_from_order(&self, order_id: i32, product_id: i32) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_row(&mut tx, "orders", Entity::Order, order_id, "UPDATE").await?;
        lock_row(&mut tx, "product", Entity::Product, product_id, "SHARE").await?;
        let result = sqlx::query("DELETE FROM order_product WHERE order_id = $1 AND product_id = $2")
            .bind(order_id)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(order_id, product_id, rows = result.rows_affected(), "delete order_product");
        Ok(result.rows_affected() > 0)
    }
}

/// Connect to the server's `postgres` database and create the target database if it is missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let opts = PgConnectOptions::from_str(database_url)?;
    let db_name = match target_database(&opts) {
        Some(name) => name,
        None => return Ok(()),
    };
    let mut conn = opts.database("postgres").connect().await?;
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Database named by the connection options, unless it is absent or the `postgres` maintenance db.
fn target_database(opts: &PgConnectOptions) -> Option<String> {
    opts.get_database()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "postgres")
        .map(str::to_string)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
