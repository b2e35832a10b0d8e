//! Payload validation shared by the entity input types.

pub mod validation;
pub use validation::{FieldErrors, Fields};
