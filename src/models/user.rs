//! User rows and the create/update payload.

use crate::service::{FieldErrors, Fields};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NAME_MAX: usize = 30;
pub const ADDRESS_MAX: usize = 200;
pub const EMAIL_MAX: usize = 200;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub email: String,
}

/// Body of `POST /users` and `PUT /users/:id`. All fields are required on both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserInput {
    pub name: String,
    pub address: String,
    pub email: String,
}

impl UserInput {
    pub const FIELDS: &'static [&'static str] = &["name", "address", "email"];

    pub fn from_json(body: Value) -> Result<Self, FieldErrors> {
        let mut fields = Fields::from_body(body, Self::FIELDS)?;
        let name = fields.required_str("name", NAME_MAX);
        let address = fields.required_str("address", ADDRESS_MAX);
        let email = fields.required_email("email", EMAIL_MAX);
        let errors = fields.into_errors();
        match (name, address, email) {
            (Some(name), Some(address), Some(email)) if errors.is_empty() => Ok(UserInput {
                name,
                address,
                email,
            }),
            _ => Err(errors),
        }
    }

    pub fn into_user(self, id: i32) -> User {
        User {
            id,
            name: self.name,
            address: self.address,
            email: self.email,
        }
    }
}
