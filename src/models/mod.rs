//! Entities (users, products, orders) and their validated request inputs.

pub mod order;
pub mod product;
pub mod user;

pub use order::{Order, OrderInput};
pub use product::{Product, ProductInput};
pub use user::{User, UserInput};

use std::fmt;

/// The three persisted entity kinds. Used to word errors and log lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    User,
    Product,
    Order,
}

impl Entity {
    /// Capitalized name, e.g. "User".
    pub fn title(self) -> &'static str {
        match self {
            Entity::User => "User",
            Entity::Product => "Product",
            Entity::Order => "Order",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::User => "user",
            Entity::Product => "product",
            Entity::Order => "order",
        })
    }
}
