//! Order rows and the create payload.

use crate::service::{FieldErrors, Fields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An order belongs to exactly one user through `user_id`. Its products live in
/// the `order_product` association and are never rendered with the order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i32,
    pub order_date: DateTime<Utc>,
    pub user_id: i32,
}

/// Body of `POST /orders`. `order_date` defaults to the insert time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderInput {
    pub user_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_date: Option<DateTime<Utc>>,
}

impl OrderInput {
    pub const FIELDS: &'static [&'static str] = &["user_id", "order_date"];

    pub fn from_json(body: Value) -> Result<Self, FieldErrors> {
        let mut fields = Fields::from_body(body, Self::FIELDS)?;
        let user_id = fields.required_id("user_id");
        let order_date = fields.optional_datetime("order_date");
        let errors = fields.into_errors();
        match user_id {
            Some(user_id) if errors.is_empty() => Ok(OrderInput { user_id, order_date }),
            _ => Err(errors),
        }
    }
}
