//! Persistence: the `Store` trait and its PostgreSQL and in-memory backends.
//!
//! Every mutating call commits before returning. Lookups by id return `None`
//! for a missing row; callers decide whether that is a 400 or a 404.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgStore};

use crate::config::{AppConfig, StorageBackend};
use crate::error::StoreError;
use crate::models::{Order, OrderInput, Product, ProductInput, User, UserInput};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip used by the readiness check.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn create_user(&self, input: &UserInput) -> Result<User, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn get_user(&self, id: i32) -> Result<Option<User>, StoreError>;
    async fn update_user(&self, id: i32, input: &UserInput) -> Result<Option<User>, StoreError>;
    /// Fails with `UserHasOrders` while any order references the user.
    async fn delete_user(&self, id: i32) -> Result<bool, StoreError>;

    async fn create_product(&self, input: &ProductInput) -> Result<Product, StoreError>;
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;
    async fn get_product(&self, id: i32) -> Result<Option<Product>, StoreError>;
    async fn update_product(&self, id: i32, input: &ProductInput) -> Result<Option<Product>, StoreError>;
    /// Also drops the product from every order.
    async fn delete_product(&self, id: i32) -> Result<bool, StoreError>;

    /// Fails with `MissingReference` when `input.user_id` does not exist.
    async fn create_order(&self, input: &OrderInput) -> Result<Order, StoreError>;
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;
    async fn get_order(&self, id: i32) -> Result<Option<Order>, StoreError>;
    async fn delete_order(&self, id: i32) -> Result<bool, StoreError>;
    async fn orders_for_user(&self, user_id: i32) -> Result<Vec<Order>, StoreError>;
    async fn products_for_order(&self, order_id: i32) -> Result<Vec<Product>, StoreError>;

    /// Returns `false` (and changes nothing) when the pair is already present.
    /// Fails with `MissingReference` when the order or product does not exist.
    async fn add_product_to_order(&self, order_id: i32, product_id: i32) -> Result<bool, StoreError>;
    /// Returns `false` when the product is not in the order.
    /// Fails with `MissingReference` when the order or product does not exist.
    async fn remove_product_from_order(&self, order_id: i32, product_id: i32) -> Result<bool, StoreError>;
}

/// Open the configured backend. For PostgreSQL this creates the database if
/// needed and applies the schema before returning.
pub async fn connect(config: &AppConfig) -> Result<Arc<dyn Store>, StoreError> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let store = PgStore::connect(&config.database_url, config.max_connections).await?;
            Ok(Arc::new(store))
        }
    }
}
