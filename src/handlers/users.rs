//! User CRUD handlers plus the user's order list.

use super::parse_id;
use crate::error::AppError;
use crate::models::{Entity, UserInput};
use crate::response::{created, message, ok};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let input = UserInput::from_json(body)?;
    let user = state.store.create_user(&input).await?;
    tracing::info!(user_id = user.id, "user created");
    Ok(created(user))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store.list_users().await?))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, Entity::User)?;
    let user = state
        .store
        .get_user(id)
        .await?
        .ok_or(AppError::NotFound(Entity::User))?;
    Ok(ok(user))
}

/// Full overwrite of name, address and email.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, Entity::User)?;
    let Json(body) = body?;
    let input = UserInput::from_json(body)?;
    let user = state
        .store
        .update_user(id, &input)
        .await?
        .ok_or(AppError::InvalidId(Entity::User))?;
    tracing::info!(user_id = id, "user updated");
    Ok(ok(user))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, Entity::User)?;
    if !state.store.delete_user(id).await? {
        return Err(AppError::InvalidId(Entity::User));
    }
    tracing::info!(user_id = id, "user deleted");
    Ok(message(format!("User {} deleted", id)))
}

/// Orders owned by a user, via the `user_id` foreign key.
pub async fn orders(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, Entity::User)?;
    if state.store.get_user(id).await?.is_none() {
        return Err(AppError::NotFound(Entity::User));
    }
    Ok(ok(state.store.orders_for_user(id).await?))
}
