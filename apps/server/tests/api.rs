//! End-to-end tests driving the router in-process against an in-memory
//! database: login, role gating, catalog CRUD, checkout, history and
//! dashboard.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use kiosk_db::{Database, DbConfig};
use kiosk_server::{auth, routes, AppState, ServerConfig};

async fn test_app() -> (Router, AppState) {
    let config = ServerConfig::for_tests();
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    auth::ensure_admin(&db, &config).await.unwrap();

    let offset = config.report_offset().unwrap();
    let state = AppState::new(db, config, offset);
    (routes::router(state.clone()), state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

async fn admin_token(app: &Router, state: &AppState) -> String {
    login(
        app,
        &state.config.bootstrap_admin_username,
        &state.config.bootstrap_admin_password,
    )
    .await
}

/// Creates a seller user through the API and returns a token for them.
async fn seller_token(app: &Router, admin: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/users",
        Some(admin),
        Some(json!({
            "username": "vendedor01",
            "fullName": "Vendedor Uno",
            "password": "vendedor-pass-1",
            "role": "seller"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    login(app, "vendedor01", "vendedor-pass-1").await
}

async fn create_product(app: &Router, admin: &str, name: &str, price_cents: i64, stock: i64) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/products",
        Some(admin),
        Some(json!({ "name": name, "priceCents": price_cents, "stock": stock })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create product failed: {body}");
    body
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let (app, _) = test_app().await;

    for uri in ["/api/products", "/api/sales", "/api/dashboard", "/api/users"] {
        let (status, body) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["code"], "UNAUTHORIZED", "{uri}");
    }
}

#[tokio::test]
async fn test_login_and_me() {
    let (app, state) = test_app().await;

    // Wrong password and unknown user look identical
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let token = admin_token(&app, &state).await;
    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn test_seller_cannot_mutate_catalog() {
    let (app, state) = test_app().await;
    let admin = admin_token(&app, &state).await;
    let seller = seller_token(&app, &admin).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(&seller),
        Some(json!({ "name": "Chocolate Barra", "priceCents": 1500, "stock": 3 })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // Reads are fine for sellers
    let (status, _) = send(&app, Method::GET, "/api/products", Some(&seller), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_checkout_flow_end_to_end() {
    let (app, state) = test_app().await;
    let admin = admin_token(&app, &state).await;
    let seller = seller_token(&app, &admin).await;

    let product = create_product(&app, &admin, "Chocolate Barra", 1500, 5).await;
    let product_id = product["id"].as_str().unwrap();
    assert!(product["barcode"].as_str().unwrap().starts_with("KSK"));

    // Seller sells two units for cash
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales/checkout",
        Some(&seller),
        Some(json!({ "items": [{ "productId": product_id, "qty": 2 }] })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "checkout failed: {body}");
    assert_eq!(body["totalCents"], 3000);
    let sale_id = body["saleId"].as_str().unwrap().to_string();

    // Stock decremented
    let (_, products) = send(&app, Method::GET, "/api/products", Some(&seller), None).await;
    assert_eq!(products[0]["stock"], 3);

    // History shows the sale with its items
    let (status, sales) = send(&app, Method::GET, "/api/sales", Some(&seller), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sales.as_array().unwrap().len(), 1);
    assert_eq!(sales[0]["paymentMethod"], "CASH");

    let (status, detail) = send(
        &app,
        Method::GET,
        &format!("/api/sales/{sale_id}"),
        Some(&seller),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["totalCents"], 3000);
    assert_eq!(detail["items"][0]["qty"], 2);
    assert_eq!(detail["items"][0]["productName"], "Chocolate Barra");

    // Dashboard reflects the sale and the (now low) stock
    let (status, dashboard) = send(&app, Method::GET, "/api/dashboard", Some(&seller), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["kpis"]["soldTodayCents"], 3000);
    assert_eq!(dashboard["kpis"]["salesCountToday"], 1);
    assert_eq!(dashboard["kpis"]["ticketAverageTodayCents"], 3000);
    assert_eq!(dashboard["topProducts"][0]["qtySold"], 2);
    assert_eq!(dashboard["recentSales"][0]["itemsCount"], 1);
    assert_eq!(dashboard["lowStockProducts"][0]["id"], product_id);

    // Barcode lookup round-trip
    let barcode = product["barcode"].as_str().unwrap();
    let (status, found) = send(
        &app,
        Method::GET,
        &format!("/api/products/barcode/{barcode}"),
        Some(&seller),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], product_id);

    let (_, missing) = send(
        &app,
        Method::GET,
        "/api/products/barcode/0000000000000",
        Some(&seller),
        None,
    )
    .await;
    assert!(missing.is_null());
}

#[tokio::test]
async fn test_checkout_insufficient_stock_is_conflict() {
    let (app, state) = test_app().await;
    let admin = admin_token(&app, &state).await;

    let product = create_product(&app, &admin, "Galletas Vainilla", 2000, 2).await;
    let product_id = product["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales/checkout",
        Some(&admin),
        Some(json!({ "items": [{ "productId": product_id, "qty": 3 }] })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    // No partial effect
    let (_, products) = send(&app, Method::GET, "/api/products", Some(&admin), None).await;
    assert_eq!(products[0]["stock"], 2);
    let (_, sales) = send(&app, Method::GET, "/api/sales", Some(&admin), None).await;
    assert_eq!(sales.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_checkout_empty_cart_is_validation_error() {
    let (app, state) = test_app().await;
    let admin = admin_token(&app, &state).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales/checkout",
        Some(&admin),
        Some(json!({ "items": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_checkout_unknown_product_is_not_found() {
    let (app, state) = test_app().await;
    let admin = admin_token(&app, &state).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales/checkout",
        Some(&admin),
        Some(json!({
            "items": [{ "productId": "550e8400-e29b-41d4-a716-446655440000", "qty": 1 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PRODUCT_NOT_FOUND");
}

#[tokio::test]
async fn test_delete_product_in_use_is_conflict() {
    let (app, state) = test_app().await;
    let admin = admin_token(&app, &state).await;

    let product = create_product(&app, &admin, "Coca Cola 500ml", 1800, 12).await;
    let product_id = product["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/sales/checkout",
        Some(&admin),
        Some(json!({ "items": [{ "productId": product_id, "qty": 1 }], "paymentMethod": "MERCADO_PAGO" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/products/{product_id}"),
        Some(&admin),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "PRODUCT_IN_USE");
}

#[tokio::test]
async fn test_user_administration() {
    let (app, state) = test_app().await;
    let admin = admin_token(&app, &state).await;

    // Duplicate username rejected
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(&admin),
        Some(json!({
            "username": "admin",
            "fullName": "Impostor",
            "password": "long-enough-pass",
            "role": "admin"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DUPLICATE");

    // Self-delete blocked
    let (_, me) = send(&app, Method::GET, "/api/auth/me", Some(&admin), None).await;
    let my_id = me["id"].as_str().unwrap();
    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/users/{my_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "SELF_DELETE_BLOCKED");

    // Create, update, then delete a fresh user
    let (status, created) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(&admin),
        Some(json!({
            "username": "temporal",
            "fullName": "Temporal",
            "password": "temporal-pass-1",
            "role": "seller"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("/api/users/{user_id}"),
        Some(&admin),
        Some(json!({ "username": "temporal", "fullName": "Temporal Dos", "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["role"], "admin");
    assert_eq!(updated["fullName"], "Temporal Dos");

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/users/{user_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_delete_user_with_sales_is_conflict() {
    let (app, state) = test_app().await;
    let admin = admin_token(&app, &state).await;
    let seller = seller_token(&app, &admin).await;

    let product = create_product(&app, &admin, "Agua Sin Gas 600ml", 1200, 15).await;
    let product_id = product["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/sales/checkout",
        Some(&seller),
        Some(json!({ "items": [{ "productId": product_id, "qty": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Find the seller's id via the users list
    let (_, users) = send(&app, Method::GET, "/api/users", Some(&admin), None).await;
    let seller_id = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "vendedor01")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/users/{seller_id}"),
        Some(&admin),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "USER_HAS_SALES");
}
