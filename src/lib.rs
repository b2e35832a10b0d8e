//! Shop API: users, products and orders over PostgreSQL, served as a JSON REST backend.

pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod models;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{AppConfig, StorageBackend};
pub use error::{AppError, ConfigError, StoreError};
pub use migration::apply_migrations;
pub use models::{Entity, Order, OrderInput, Product, ProductInput, User, UserInput};
pub use response::Message;
pub use routes::{app, common_routes_with_ready, shop_routes};
pub use state::AppState;
pub use store::{connect, ensure_database_exists, MemoryStore, PgStore, Store};
