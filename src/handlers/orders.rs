//! Order handlers and the order <-> product association endpoints.

use super::parse_id;
use crate::error::AppError;
use crate::models::{Entity, OrderInput};
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
    let input = OrderInput::from_json(body)?;
    let order = state.store.create_order(&input).await?;
    tracing::info!(order_id = order.id, user_id = order.user_id, "order created");
    Ok(created(order))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.store.list_orders().await?))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, Entity::Order)?;
    let order = state
        .store
        .get_order(id)
        .await?
        .ok_or(AppError::NotFound(Entity::Order))?;
    Ok(ok(order))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, Entity::Order)?;
    if !state.store.delete_order(id).await? {
        return Err(AppError::InvalidId(Entity::Order));
    }
    tracing::info!(order_id = id, "order deleted");
    Ok(message(format!("Order {} deleted", id)))
}

/// `GET /orders/:order_id/user/:user_id`: the order, as a one-element list, when it belongs to the user.
pub async fn for_user(
    State(state): State<AppState>,
    Path((order_id, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let order_id = parse_id(&order_id, Entity::Order)?;
    let user_id = parse_id(&user_id, Entity::User)?;
    if state.store.get_user(user_id).await?.is_none() {
        return Err(AppError::NotFound(Entity::User));
    }
    let order = state
        .store
        .get_order(order_id)
        .await?
        .filter(|o| o.user_id == user_id)
        .ok_or(AppError::NotFound(Entity::Order))?;
    Ok(ok(vec![order]))
}

pub async fn products(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order_id = parse_id(&order_id, Entity::Order)?;
    if state.store.get_order(order_id).await?.is_none() {
        return Err(AppError::NotFound(Entity::Order));
    }
    Ok(ok(state.store.products_for_order(order_id).await?))
}

pub async fn add_product(
    State(state): State<AppState>,
    Path((order_id, product_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let order_id = parse_id(&order_id, Entity::Order)?;
    let product_id = parse_id(&product_id, Entity::Product)?;
    if !state.store.add_product_to_order(order_id, product_id).await? {
        return Err(AppError::BadRequest("Product already exists in order".into()));
    }
    tracing::info!(order_id, product_id, "product added to order");
    Ok(message(format!("Product {} added to order {}", product_id, order_id)))
}

pub async fn remove_product(
    State(state): State<AppState>,
    Path((order_id, product_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let order_id = parse_id(&order_id, Entity::Order)?;
    let product_id = parse_id(&product_id, Entity::Product)?;
    if !state.store.remove_product_from_order(order_id, product_id).await? {
        return Err(AppError::BadRequest("Product not in order".into()));
    }
    tracing::info!(order_id, product_id, "product removed from order");
    Ok(message(format!("Product {} removed from order {}", product_id, order_id)))
}
