//! Entity routes: users, products, orders and the order/product association.

use crate::handlers::{orders, products, users};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn shop_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:id",
            get(users::read).put(users::update).delete(users::delete),
        )
        .route("/users/:id/orders", get(users::orders))
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/:id",
            get(products::read).put(products::update).delete(products::delete),
        )
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/:order_id", get(orders::read).delete(orders::delete))
        .route("/orders/:order_id/products", get(orders::products))
        .route("/orders/:order_id/user/:user_id", get(orders::for_user))
        .route(
            "/orders/:order_id/add_product/:product_id",
            post(orders::add_product),
        )
        .route(
            "/orders/:order_id/delete_product/:product_id",
            delete(orders::remove_product),
        )
        .with_state(state)
}
