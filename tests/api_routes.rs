//! Router-level tests against the in-memory store.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use herambha_storefront::api::payments::{sign, SIGNATURE_HEADER};
use herambha_storefront::api::{self, AppState, USER_ID_HEADER};
use herambha_storefront::config::AppConfig;
use herambha_storefront::seed;

const WEBHOOK_SECRET: &str = "whsec_test";

async fn app_with(config: AppConfig) -> Router {
    let state = AppState::in_memory(config);
    seed::seed_if_empty(state.catalog.as_ref()).await.unwrap();
    api::router(state)
}

async fn app() -> Router {
    app_with(AppConfig {
        admin_emails: vec!["owner@herambha.in".into()],
        webhook_secret: Some(SecretString::from(WEBHOOK_SECRET.to_string())),
        ..AppConfig::default()
    })
    .await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>, user: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(uid) = user {
        builder = builder.header(USER_ID_HEADER, uid);
    }
    let request = match body {
        Some(body) => builder.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, request).await
}

async fn sign_in(app: &Router, uid: &str, email: &str) -> (StatusCode, Value) {
    call(app, Method::POST, "/api/users", Some(json!({"uid": uid, "email": email})), None).await
}

fn customer_info() -> Value {
    json!({
        "name": "Asha Rao", "email": "asha@example.com", "phone": "9876543210",
        "address": "12 MG Road, Near Metro", "city": "Bengaluru", "state": "Karnataka", "zipCode": "560001"
    })
}

fn order_body(total: u64) -> Value {
    json!({
        "userId": "u1",
        "userEmail": "asha@example.com",
        "items": [{
            "productId": "badam-normal-500g", "productName": "Badam (Normal)", "productPrice": 540,
            "productWeight": "500g", "productImage": "/images/badam-normal.jpg", "quantity": 2
        }],
        "totalAmount": total,
        "customerInfo": customer_info(),
        "paymentMethod": "PhonePe"
    })
}

async fn place_order(app: &Router) -> String {
    let (status, order) = call(app, Method::POST, "/api/orders", Some(order_body(1080)), None).await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    order["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = call(&app().await, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_catalog_queries() {
    let app = app().await;
    let (status, featured) = call(&app, Method::GET, "/api/products/featured", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(featured.as_array().unwrap().len(), 6);

    let (_, categories) = call(&app, Method::GET, "/api/products/categories", None, None).await;
    assert!(categories.as_array().unwrap().iter().any(|c| c == "Spices"));

    let (_, spices) = call(&app, Method::GET, "/api/products/category/Spices", None, None).await;
    assert_eq!(spices.as_array().unwrap().len(), 4);

    let (_, cheap) = call(&app, Method::GET, "/api/products?sortBy=price&sortOrder=asc&maxPrice=200", None, None).await;
    let cheap = cheap.as_array().unwrap();
    assert_eq!(cheap[0]["id"], "dry-khajoor-250g");

    let (status, body) = call(&app, Method::GET, "/api/products/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");
}

#[tokio::test]
async fn test_user_upsert_is_idempotent() {
    let app = app().await;
    let (status, created) = sign_in(&app, "u1", "asha@example.com").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "customer");

    let (status, again) = sign_in(&app, "other-uid", "asha@example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["uid"], "u1");

    let (status, _) = call(&app, Method::GET, "/api/users/ghost", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_address_book_cap_and_default() {
    let app = app().await;
    sign_in(&app, "u1", "asha@example.com").await;
    for i in 0..4 {
        let address = json!({
            "fullName": "Asha Rao", "phone": "9876543210", "addressLine1": format!("{i} MG Road"),
            "city": "Bengaluru", "state": "Karnataka", "zipCode": "560001"
        });
        let (status, _) = call(&app, Method::POST, "/api/users/u1/addresses", Some(address), None).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let fifth = json!({
        "fullName": "Asha Rao", "phone": "9876543210", "addressLine1": "5 MG Road",
        "city": "Bengaluru", "state": "Karnataka", "zipCode": "560001"
    });
    let (status, body) = call(&app, Method::POST, "/api/users/u1/addresses", Some(fifth), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Maximum 4 addresses allowed");

    let (_, user) = call(&app, Method::GET, "/api/users/u1", None, None).await;
    let addresses = user["addresses"].as_array().unwrap();
    assert_eq!(addresses.iter().filter(|a| a["isDefault"] == true).count(), 1);
    assert_eq!(addresses[0]["isDefault"], true);

    let first = addresses[0]["id"].as_str().unwrap();
    let (status, user) = call(&app, Method::DELETE, &format!("/api/users/u1/addresses/{first}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let addresses = user["addresses"].as_array().unwrap();
    assert_eq!(addresses.len(), 3);
    assert_eq!(addresses[0]["isDefault"], true);

    let last = addresses[2]["id"].as_str().unwrap();
    let (_, user) = call(&app, Method::PUT, &format!("/api/users/u1/addresses/{last}/default"), None, None).await;
    let defaults: Vec<_> = user["addresses"].as_array().unwrap().iter().filter(|a| a["isDefault"] == true).map(|a| a["id"].clone()).collect();
    assert_eq!(defaults, [json!(last)]);
}

#[tokio::test]
async fn test_wishlist_duplicate_and_missing() {
    let app = app().await;
    sign_in(&app, "u1", "asha@example.com").await;
    let item = json!({"productId": "kismis-250g"});
    let (status, body) = call(&app, Method::POST, "/api/users/u1/wishlist", Some(item.clone()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wishlist"].as_array().unwrap().len(), 1);

    let (status, body) = call(&app, Method::POST, "/api/users/u1/wishlist", Some(item), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Product already in wishlist");

    let (status, _) = call(&app, Method::DELETE, "/api/users/u1/wishlist/kismis-250g", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::DELETE, "/api/users/u1/wishlist/kismis-250g", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_lifecycle() {
    let app = app().await;
    let id = place_order(&app).await;

    let (status, order) = call(&app, Method::GET, &format!("/api/orders/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["paymentStatus"], "pending");
    assert_eq!(order["orderStatus"], "processing");

    let bad = json!({"paymentStatus": "completed", "utrNumber": "12345"});
    let (status, _) = call(&app, Method::PUT, &format!("/api/orders/{id}/payment"), Some(bad), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, order) = call(&app, Method::GET, &format!("/api/orders/{id}"), None, None).await;
    assert_eq!(order["paymentStatus"], "pending");

    let good = json!({"paymentStatus": "completed", "utrNumber": "123456789012"});
    let (status, order) = call(&app, Method::PUT, &format!("/api/orders/{id}/payment"), Some(good), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["paymentStatus"], "completed");
    assert_eq!(order["utrNumber"], "123456789012");

    let (_, mine) = call(&app, Method::GET, "/api/orders/user/u1", None, None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_order_rejects_bad_payloads() {
    let app = app().await;
    let (status, body) = call(&app, Method::POST, "/api/orders", Some(order_body(999)), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let mut invalid = order_body(1080);
    invalid["customerInfo"]["phone"] = json!("12345");
    invalid["customerInfo"]["zipCode"] = json!("12345");
    let (status, body) = call(&app, Method::POST, "/api/orders", Some(invalid), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"].get("phone").is_some(), "{body}");
    assert!(body["fields"].get("zip_code").is_some(), "{body}");

    let (status, _) = call(&app, Method::GET, "/api/orders/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_routes_need_admin() {
    let app = app().await;
    sign_in(&app, "u1", "asha@example.com").await;
    sign_in(&app, "boss", "Owner@Herambha.in").await;
    let id = place_order(&app).await;

    let (status, _) = call(&app, Method::GET, "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&app, Method::GET, "/api/orders", None, Some("u1")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, all) = call(&app, Method::GET, "/api/orders", None, Some("boss")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);

    let ship = json!({"orderStatus": "shipped"});
    let (status, _) = call(&app, Method::PUT, &format!("/api/orders/{id}/status"), Some(ship.clone()), Some("boss")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let paid = json!({"paymentStatus": "completed"});
    call(&app, Method::PUT, &format!("/api/orders/{id}/payment"), Some(paid), None).await;
    let (status, order) = call(&app, Method::PUT, &format!("/api/orders/{id}/status"), Some(ship), Some("boss")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["orderStatus"], "shipped");

    let product = json!({
        "id": "saffron-1g", "name": "Saffron", "description": "Kashmiri saffron threads, hand picked.",
        "price": 450, "weight": "1g", "stock": 10, "imageUrl": "https://cdn.herambha.in/saffron.jpg", "category": "Spices"
    });
    let (status, _) = call(&app, Method::POST, "/api/products", Some(product.clone()), Some("u1")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let mut unnamed = product.clone();
    unnamed.as_object_mut().unwrap().remove("id");
    unnamed["name"] = json!("S");
    let (status, body) = call(&app, Method::POST, "/api/products", Some(unnamed), Some("boss")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["name"].is_string());
    let (status, _) = call(&app, Method::POST, "/api/products", Some(product.clone()), Some("boss")).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(&app, Method::POST, "/api/products", Some(product), Some("boss")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, body) = call(&app, Method::DELETE, "/api/products/saffron-1g", None, Some("boss")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product deleted successfully");
}

fn webhook_request(body: &Value, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri("/api/payments/webhook").header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_payment_webhook() {
    let app = app().await;
    let id = place_order(&app).await;
    let note = json!({"orderId": id, "paymentStatus": "completed", "utrNumber": "998877665544"});

    let (status, _) = send(&app, webhook_request(&note, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, webhook_request(&note, Some(sign(b"wrong", note.to_string().as_bytes())))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let signature = sign(WEBHOOK_SECRET.as_bytes(), note.to_string().as_bytes());
    let (status, order) = send(&app, webhook_request(&note, Some(signature))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["paymentStatus"], "completed");
    assert_eq!(order["utrNumber"], "998877665544");
}

#[tokio::test]
async fn test_webhook_disabled_without_secret() {
    let app = app_with(AppConfig::default()).await;
    let note = json!({"orderId": "x", "paymentStatus": "completed"});
    let (status, _) = send(&app, webhook_request(&note, Some("00".into()))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
