//! Product rows and the create/update payload.

use crate::service::{FieldErrors, Fields};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NAME_MAX: usize = 200;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: f64,
}

/// Body of `POST /products` and `PUT /products/:id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub price: f64,
}

impl ProductInput {
    pub const FIELDS: &'static [&'static str] = &["name", "price"];

    pub fn from_json(body: Value) -> Result<Self, FieldErrors> {
        let mut fields = Fields::from_body(body, Self::FIELDS)?;
        let name = fields.required_str("name", NAME_MAX);
        let price = fields.required_amount("price");
        let errors = fields.into_errors();
        match (name, price) {
            (Some(name), Some(price)) if errors.is_empty() => Ok(ProductInput { name, price }),
            _ => Err(errors),
        }
    }

    pub fn into_product(self, id: i32) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
        }
    }
}
