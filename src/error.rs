//! Typed errors and HTTP mapping.

use crate::models::Entity;
use crate::response::Message;
use crate::service::FieldErrors;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("user {0} still owns orders")]
    UserHasOrders(i32),
    #[error("{entity} {id} does not exist")]
    MissingReference { entity: Entity, id: i32 },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation: {0}")]
    Validation(FieldErrors),
    #[error("invalid {0} id")]
    InvalidId(Entity),
    #[error("{} not found", .0.title())]
    NotFound(Entity),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    /// Body rejected by the JSON extractor; keeps the extractor's status (400, 413, 415, 422).
    #[error("rejected body: {message}")]
    Rejected { status: StatusCode, message: String },
    #[error(transparent)]
    Store(StoreError),
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UserHasOrders(id) => AppError::Conflict(format!("User {} has orders", id)),
            StoreError::MissingReference { entity, .. } => AppError::InvalidId(entity),
            e => AppError::Store(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl AppError {
    /// Status code and the client-facing message for non-validation errors.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, errors.to_string()),
            AppError::InvalidId(entity) => (StatusCode::BAD_REQUEST, format!("Invalid {} id", entity)),
            AppError::NotFound(entity) => (StatusCode::NOT_FOUND, format!("{} not found", entity.title())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Rejected { status, message } => (*status, message.clone()),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Validation(errors) = self {
            return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
        }
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(Message { message })).into_response()
    }
}
