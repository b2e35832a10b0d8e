//! Router-level tests: the full application over the in-memory store.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, DefaultBodyLimit},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use shop_api::{app, AppError, AppState, MemoryStore};
use std::sync::Arc;
use tower::ServiceExt;

fn router() -> Router {
    app(AppState::new(Arc::new(MemoryStore::new())), 64 * 1024)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn create_user(app: &Router, name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/users",
        Some(json!({"name": name, "address": "1 Main St", "email": "a@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn create_product(app: &Router, name: &str, price: f64) -> i64 {
    let (status, body) = send(app, Method::POST, "/products", Some(json!({"name": name, "price": price}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn create_order(app: &Router, user_id: i64) -> i64 {
    let (status, body) = send(app, Method::POST, "/orders", Some(json!({"user_id": user_id}))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

fn message(text: &str) -> Value {
    json!({ "message": text })
}

#[tokio::test]
async fn create_user_returns_assigned_id() {
    let app = router();
    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({"name": "Alice", "address": "1 Main St", "email": "a@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["name"], "Alice");
    assert_eq!(body["address"], "1 Main St");
    assert_eq!(body["email"], "a@x.com");
}

#[tokio::test]
async fn create_user_missing_field_is_keyed_by_name() {
    let app = router();
    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({"address": "1 Main St", "email": "a@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"name": ["Missing data for required field."]}));
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = router();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_users_contains_both() {
    let app = router();
    let a = create_user(&app, "Alice").await;
    let b = create_user(&app, "Bob").await;
    let (status, body) = send(&app, Method::GET, "/users", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(|u| u["id"].as_i64().unwrap()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&a) && ids.contains(&b));
}

#[tokio::test]
async fn get_update_delete_user() {
    let app = router();
    let id = create_user(&app, "Alice").await;

    let (status, body) = send(&app, Method::GET, &format!("/users/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/users/{}", id),
        Some(json!({"name": "Alicia", "address": "2 High St", "email": "alicia@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": id, "name": "Alicia", "address": "2 High St", "email": "alicia@x.com"}));

    let (status, body) = send(&app, Method::DELETE, &format!("/users/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, message(&format!("User {} deleted", id)));

    let (status, _) = send(&app, Method::GET, &format!("/users/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_and_delete_unknown_user() {
    let app = router();
    let (status, body) = send(
        &app,
        Method::PUT,
        "/users/99",
        Some(json!({"name": "Ghost", "address": "nowhere", "email": "g@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message("Invalid user id"));

    let (status, body) = send(&app, Method::DELETE, "/users/99", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message("Invalid user id"));
}

#[tokio::test]
async fn reads_of_missing_entities_are_404() {
    let app = router();
    for (uri, text) in [
        ("/users/5", "User not found"),
        ("/products/5", "Product not found"),
        ("/orders/5", "Order not found"),
        ("/orders/5/products", "Order not found"),
    ] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body, message(text));
    }
}

#[tokio::test]
async fn non_numeric_id_is_invalid() {
    let app = router();
    let (status, body) = send(&app, Method::GET, "/users/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message("Invalid user id"));
}

#[tokio::test]
async fn zero_and_negative_ids_are_not_found() {
    let app = router();
    for (uri, text) in [
        ("/users/0", "User not found"),
        ("/users/-3", "User not found"),
        ("/products/0", "Product not found"),
        ("/orders/-1", "Order not found"),
    ] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body, message(text));
    }
}

#[tokio::test]
async fn update_unknown_product() {
    let app = router();
    let (status, body) = send(&app, Method::PUT, "/products/99", Some(json!({"name": "Kettle", "price": 3.5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message("Invalid product id"));
}

#[tokio::test]
async fn update_user_with_invalid_body() {
    let app = router();
    let id = create_user(&app, "Alice").await;
    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/users/{}", id),
        Some(json!({"name": "A".repeat(31), "address": "1 Main St"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "email": ["Missing data for required field."],
            "name": ["Longer than maximum length 30."]
        })
    );

    let (_, body) = send(&app, Method::GET, &format!("/users/{}", id), None).await;
    assert_eq!(body["name"], "Alice");
}

#[tokio::test]
async fn non_object_body_is_a_schema_error() {
    let app = router();
    let (status, body) = send(&app, Method::POST, "/users", Some(json!(["Alice"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"_schema": ["Invalid input type."]}));
}

#[tokio::test]
async fn bad_emails_are_rejected() {
    let app = router();
    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({"name": "Alice", "address": "1 Main St", "email": "not-an-email"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"email": ["Not a valid email address."]}));

    let long_email = format!("{}@x.com", "a".repeat(200));
    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({"name": "Alice", "address": "1 Main St", "email": long_email})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"email": ["Longer than maximum length 200."]}));
}

#[tokio::test]
async fn oversized_streamed_body_keeps_413() {
    let app = Router::new()
        .route(
            "/",
            post(|body: Result<Json<Value>, JsonRejection>| async move { body.map(|_| ()).map_err(AppError::from) }),
        )
        .layer(DefaultBodyLimit::max(8));
    let (status, body) = send(&app, Method::POST, "/", Some(json!({"name": "far too long for eight bytes"}))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn product_crud() {
    let app = router();
    let id = create_product(&app, "Kettle", 24.99).await;

    let (status, body) = send(&app, Method::GET, &format!("/products/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": id, "name": "Kettle", "price": 24.99}));

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/products/{}", id),
        Some(json!({"name": "Kettle XL", "price": 30.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Kettle XL");

    let (status, body) = send(&app, Method::GET, "/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/products/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::DELETE, &format!("/products/{}", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message("Invalid product id"));
}

#[tokio::test]
async fn product_validation_errors() {
    let app = router();
    let (status, body) = send(&app, Method::POST, "/products", Some(json!({"name": "Kettle", "price": "free"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"price": ["Not a valid number."]}));
}

#[tokio::test]
async fn create_order_for_unknown_user() {
    let app = router();
    let (status, body) = send(&app, Method::POST, "/orders", Some(json!({"user_id": 7}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message("Invalid user id"));
}

#[tokio::test]
async fn create_order_serializes_user_and_date() {
    let app = router();
    let user = create_user(&app, "Alice").await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/orders",
        Some(json!({"user_id": user, "order_date": "2024-03-01T12:00:00Z"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], user);
    assert_eq!(body["order_date"], "2024-03-01T12:00:00Z");
    assert!(body.get("products").is_none());
}

#[tokio::test]
async fn adding_same_product_twice() {
    let app = router();
    let user = create_user(&app, "Alice").await;
    let product = create_product(&app, "Kettle", 24.99).await;
    let order = create_order(&app, user).await;
    let uri = format!("/orders/{}/add_product/{}", order, product);

    let (status, _) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("already exists"));

    let (status, body) = send(&app, Method::GET, &format!("/orders/{}/products", order), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"id": product, "name": "Kettle", "price": 24.99}]));
}

#[tokio::test]
async fn add_product_to_missing_order_or_product() {
    let app = router();
    let user = create_user(&app, "Alice").await;
    let product = create_product(&app, "Kettle", 1.0).await;
    let order = create_order(&app, user).await;

    let (status, body) = send(&app, Method::POST, &format!("/orders/99/add_product/{}", product), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message("Invalid order id"));

    let (status, body) = send(&app, Method::POST, &format!("/orders/{}/add_product/99", order), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message("Invalid product id"));
}

#[tokio::test]
async fn removing_product_not_in_order() {
    let app = router();
    let user = create_user(&app, "Alice").await;
    let kettle = create_product(&app, "Kettle", 24.99).await;
    let toaster = create_product(&app, "Toaster", 40.0).await;
    let order = create_order(&app, user).await;
    send(&app, Method::POST, &format!("/orders/{}/add_product/{}", order, kettle), None).await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/orders/{}/delete_product/{}", order, toaster),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message("Product not in order"));

    let (_, body) = send(&app, Method::GET, &format!("/orders/{}/products", order), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/orders/{}/delete_product/{}", order, kettle),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, Method::GET, &format!("/orders/{}/products", order), None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn remove_product_with_missing_order_or_product() {
    let app = router();
    let user = create_user(&app, "Alice").await;
    let product = create_product(&app, "Kettle", 1.0).await;
    let order = create_order(&app, user).await;

    let (status, body) = send(&app, Method::DELETE, &format!("/orders/99/delete_product/{}", product), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message("Invalid order id"));

    let (status, body) = send(&app, Method::DELETE, &format!("/orders/{}/delete_product/99", order), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message("Invalid product id"));
}

#[tokio::test]
async fn delete_unknown_order() {
    let app = router();
    let (status, body) = send(&app, Method::DELETE, "/orders/99", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, message("Invalid order id"));
}

#[tokio::test]
async fn order_for_user_checks_ownership() {
    let app = router();
    let alice = create_user(&app, "Alice").await;
    let bob = create_user(&app, "Bob").await;
    let order = create_order(&app, alice).await;

    let (status, body) = send(&app, Method::GET, &format!("/orders/{}/user/{}", order, alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], order);

    let (status, _) = send(&app, Method::GET, &format!("/orders/{}/user/{}", order, bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, &format!("/orders/{}/user/99", order), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, message("User not found"));
}

#[tokio::test]
async fn user_orders_listing() {
    let app = router();
    let alice = create_user(&app, "Alice").await;
    let bob = create_user(&app, "Bob").await;
    create_order(&app, alice).await;
    create_order(&app, alice).await;
    create_order(&app, bob).await;

    let (status, body) = send(&app, Method::GET, &format!("/users/{}/orders", alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o["user_id"] == alice));

    let (_, body) = send(&app, Method::GET, "/orders", None).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn user_with_orders_cannot_be_deleted() {
    let app = router();
    let user = create_user(&app, "Alice").await;
    let order = create_order(&app, user).await;

    let (status, _) = send(&app, Method::DELETE, &format!("/users/{}", user), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&app, Method::GET, &format!("/users/{}", user), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::DELETE, &format!("/orders/{}", order), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, &format!("/users/{}", user), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_product_detaches_it_from_orders() {
    let app = router();
    let user = create_user(&app, "Alice").await;
    let product = create_product(&app, "Kettle", 10.0).await;
    let order = create_order(&app, user).await;
    send(&app, Method::POST, &format!("/orders/{}/add_product/{}", order, product), None).await;

    send(&app, Method::DELETE, &format!("/products/{}", product), None).await;
    let (status, body) = send(&app, Method::GET, &format!("/orders/{}/products", order), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn health_ready_version() {
    let app = router();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "database": "ok"}));

    let (status, body) = send(&app, Method::GET, "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "shop-api");
}
