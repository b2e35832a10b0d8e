//! Product CRUD handlers.

use super::parse_id;
use crate::error::AppError;
use crate::models::{Entity, ProductInput};
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
    let input = ProductInput::from_json(body)?;
    let product = state.store.create_product(&input).await?;
    tracing::info!(product_id = product.id, "product created");
    Ok(created(product))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store.list_products().await?))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, Entity::Product)?;
    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or(AppError::NotFound(Entity::Product))?;
    Ok(ok(product))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, Entity::Product)?;
    let Json(body) = body?;
    let input = ProductInput::from_json(body)?;
    let product = state
        .store
        .update_product(id, &input)
        .await?
        .ok_or(AppError::InvalidId(Entity::Product))?;
    tracing::info!(product_id = id, "product updated");
    Ok(ok(product))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, Entity::Product)?;
    if !state.store.delete_product(id).await? {
        return Err(AppError::InvalidId(Entity::Product));
    }
    tracing::info!(product_id = id, "product deleted");
    Ok(message(format!("Product {} deleted", id)))
}
