//! HTTP handlers for users, products and orders.

pub mod orders;
pub mod products;
pub mod users;

use crate::error::AppError;
use crate::models::Entity;

/// Path ids are integers; anything else is an invalid id for `entity`.
/// Integers that match no row are left to the store lookup.
pub(crate) fn parse_id(raw: &str, entity: Entity) -> Result<i32, AppError> {
    raw.parse::<i32>().map_err(|_| AppError::InvalidId(entity))
}
