//! HTTP surface.

mod admin;
mod cart;
mod crypto;
mod error;
mod products;
mod sales;

pub use error::{ApiError, ApiResult};

use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::config::Config;
use crate::publisher::EventPublisher;
use crate::store::Store;

pub const SERVICE_NAME: &str = "kicklab-storefront";

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub events: EventPublisher,
    pub config: Arc<Config>,
}

/// JSON body extractor whose rejection is an [`ApiError`].
#[derive(axum::extract::FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": SERVICE_NAME})) }))
        .route("/api/products", get(products::list_products).post(products::create_product))
        .route("/api/products/:id", get(products::get_product).put(products::update_product).delete(products::delete_product))
        .route("/api/search-suggestions", get(products::search_suggestions))
        .route("/api/sales-settings", get(sales::get_settings).post(sales::update_settings))
        .route("/api/cart/quote", post(cart::quote))
        .route("/api/checkout/whatsapp", post(cart::whatsapp_checkout))
        .route("/api/crypto/session", post(crypto::open_session))
        .route("/api/crypto/session/:id/status", get(crypto::session_status))
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/logout", post(admin::logout))
        .route("/api/admin/session", get(admin::session))
        .route("/api/admin/deposits", post(crypto::record_deposit))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth;
    use crate::domain::aggregates::{Product, ProductInput, SaleWindow, SalesSettings};
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::{header, HeaderMap, Method, Request, StatusCode};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const PASSWORD: &str = "hunter2";

    fn product(name: &str, price: i64, category: &str) -> Product {
        Product::create(ProductInput {
            name: Some(name.into()), price: Some(Decimal::new(price, 0)), category: Some(category.into()),
            description: Some(format!("{name} in {category}")), ..Default::default()
        }, |_| false).unwrap()
    }

    async fn state_with(products: Vec<Product>, settings: Option<SalesSettings>) -> AppState {
        let memory = MemoryStore::with_products(products);
        if let Some(settings) = settings {
            memory.write_sales_settings(&settings).await.unwrap();
        }
        let config = Config::from_lookup(|key| match key {
            "ADMIN_PASSWORD" => Some(PASSWORD.to_string()),
            "WHATSAPP_PHONE" => Some("+15550100200".to_string()),
            _ => None,
        }).unwrap();
        AppState { store: Store::Memory(memory), events: EventPublisher::default(), config: Arc::new(config) }
    }

    async fn app_with(products: Vec<Product>, settings: Option<SalesSettings>) -> Router {
        router(state_with(products, settings).await)
    }

    async fn app() -> Router {
        app_with(vec![product("Dunk Low", 100, "shoes"), product("Canvas Tote", 40, "bags")], None).await
    }

    fn admin_cookie() -> String {
        format!("{}={}", auth::COOKIE_NAME, auth::issue_token(PASSWORD, Utc::now()))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>, cookie: Option<&str>) -> (StatusCode, HeaderMap, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie { request = request.header(header::COOKIE, cookie); }
        let request = match body {
            Some(body) => request.header(header::CONTENT_TYPE, "application/json").body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }.unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (parts.status, parts.headers, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, _, body) = send(&app().await, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_catalog_applies_sales() {
        let settings = SalesSettings {
            global: Some(SaleWindow::new(Decimal::new(10, 0))),
            categories: [("bags".to_string(), SaleWindow::new(Decimal::new(25, 0)))].into(),
            ..Default::default()
        };
        let app = app_with(vec![product("Dunk Low", 100, "shoes"), product("Canvas Tote", 40, "bags")], Some(settings)).await;
        let (status, _, body) = send(&app, Method::GET, "/api/products", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], "canvas-tote");
        assert_eq!(body[0]["price"], json!(30.0));
        assert_eq!(body[0]["sale"], json!({ "type": "category", "percent": 25.0 }));
        assert_eq!(body[1]["price"], json!(90.0));
        assert_eq!(body[1]["originalPrice"], json!(100.0));
        assert_eq!(body[1]["sale"]["type"], "global");

        let (status, _, body) = send(&app, Method::GET, "/api/products/dunk-low", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"], json!(90.0));

        let (status, _, body) = send(&app, Method::GET, "/api/products/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "product `nope` not found");
    }

    #[tokio::test]
    async fn test_admin_login() {
        let app = app().await;
        let (status, _, body) = send(&app, Method::POST, "/api/admin/login", Some(json!({ "password": "wrong" })), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");

        let (status, headers, _) = send(&app, Method::POST, "/api/admin/login", Some(json!({ "password": format!(" {PASSWORD} ") })), None).await;
        assert_eq!(status, StatusCode::OK);
        let set_cookie = headers[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("admin_auth="));
        assert!(set_cookie.contains("HttpOnly"));
        let cookie = set_cookie.split(';').next().unwrap();

        let (_, _, body) = send(&app, Method::GET, "/api/admin/session", None, Some(cookie)).await;
        assert_eq!(body, json!({ "authenticated": true }));
        let (_, _, body) = send(&app, Method::GET, "/api/admin/session", None, Some("admin_auth=ok")).await;
        assert_eq!(body, json!({ "authenticated": false }));
    }

    #[tokio::test]
    async fn test_admin_logout_clears_cookie() {
        let app = app().await;
        let (status, headers, body) = send(&app, Method::POST, "/api/admin/logout", None, Some(&admin_cookie())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
        let set_cookie = headers[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("admin_auth=;"));
        assert!(set_cookie.contains("Max-Age=0"));
        assert!(!set_cookie.contains("Secure"));
    }

    #[tokio::test]
    async fn test_product_admin_crud() {
        let app = app().await;
        let cookie = admin_cookie();
        let new = json!({ "name": "Dunk Low", "price": 110, "sizes": ["42", " "], "category": "shoes" });

        let (status, _, _) = send(&app, Method::POST, "/api/products", Some(new.clone()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, body) = send(&app, Method::POST, "/api/products", Some(new), Some(&cookie)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "dunk-low-2");
        assert_eq!(body["sizes"], json!(["42"]));
        assert_eq!(body["thumbnail"], "/placeholder.svg");

        let (status, _, body) = send(&app, Method::POST, "/api/products", Some(json!({ "name": "No Price" })), Some(&cookie)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields");

        let patch = json!({ "id": "renamed", "onSale": true, "salePrice": 80 });
        let (status, _, body) = send(&app, Method::PUT, "/api/products/dunk-low-2", Some(patch), Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "dunk-low-2");
        assert_eq!(body["salePrice"], json!(80.0));

        let (_, _, body) = send(&app, Method::GET, "/api/products/dunk-low-2", None, None).await;
        assert_eq!(body["price"], json!(80.0));
        assert_eq!(body["sale"]["type"], "manual");

        let (status, _, body) = send(&app, Method::DELETE, "/api/products/dunk-low-2", None, Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
        let (status, _, _) = send(&app, Method::DELETE, "/api/products/dunk-low-2", None, Some(&cookie)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_product_prices_are_bounded_and_rounded() {
        let app = app().await;
        let cookie = admin_cookie();
        let (status, _, body) = send(&app, Method::POST, "/api/products", Some(json!({ "name": "Big", "price": 7.0e28 })), Some(&cookie)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid price");

        let (status, _, body) = send(&app, Method::POST, "/api/products", Some(json!({ "name": "Slide", "price": 19.999 })), Some(&cookie)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["price"], json!(20.0));

        let (status, _, _) = send(&app, Method::PUT, "/api/products/slide", Some(json!({ "price": 1.0e11 })), Some(&cookie)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _, body) = send(&app, Method::POST, "/api/cart/quote", Some(json!({ "items": [{ "id": "slide", "qty": 99 }] })), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subtotal"]["amount"], json!(1980.0));
    }

    #[tokio::test]
    async fn test_manual_sale_at_zero_percent() {
        let mut watch = product("Chrono", 1000, "bags");
        watch.on_sale = true;
        watch.sale_price = Some(Decimal::new(99_999, 2));
        let app = app_with(vec![watch], None).await;
        let (status, _, body) = send(&app, Method::GET, "/api/products/chrono", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sale"], json!({ "type": "manual", "percent": 0.0 }));
        assert!((body["price"].as_f64().unwrap() - 999.99).abs() < 1e-9);
        assert_eq!(body["originalPrice"], json!(1000.0));
    }

    #[tokio::test]
    async fn test_sales_settings_roundtrip() {
        let app = app().await;
        let (status, headers, body) = send(&app, Method::GET, "/api/sales-settings", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        assert_eq!(body["flash"]["items"], json!([]));

        let update = json!({ "flash": { "items": [{ "id": "dunk-low", "percent": 20 }] }, "categories": { "SHOES": { "percent": 5 } } });
        let (status, _, _) = send(&app, Method::POST, "/api/sales-settings", Some(update.clone()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _, body) = send(&app, Method::POST, "/api/sales-settings", Some(update), Some(&admin_cookie())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["updatedAt"].is_string());
        assert!(body["categories"]["shoes"].is_object());

        let (_, _, body) = send(&app, Method::GET, "/api/products/dunk-low", None, None).await;
        assert_eq!(body["sale"], json!({ "type": "flash", "percent": 20.0 }));
        assert_eq!(body["price"], json!(80.0));
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let app = app().await;
        let request = Request::builder().method(Method::POST).uri("/api/crypto/session")
            .header(header::CONTENT_TYPE, "application/json").body(Body::from("{not json")).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap(), json!({ "error": "Invalid JSON" }));
    }

    #[tokio::test]
    async fn test_crypto_session_flow() {
        let app = app().await;
        let (status, _, body) = send(&app, Method::POST, "/api/crypto/session", Some(json!({ "amount": 0, "asset": "usdt", "address": "T1" })), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid amount");

        let open = json!({ "amount": 25, "asset": "usdt", "address": " TAddr1 ", "network": "trx", "tagOrMemo": "" });
        let (status, _, body) = send(&app, Method::POST, "/api/crypto/session", Some(open), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["instructions"], json!({ "asset": "USDT", "amount": 25.0, "address": "TAddr1", "network": "TRX", "tagOrMemo": null }));
        let status_uri = format!("/api/crypto/session/{}/status", body["id"].as_str().unwrap());

        let (_, _, body) = send(&app, Method::GET, &status_uri, None, None).await;
        assert_eq!(body, json!({ "status": "pending" }));

        let deposit = json!({
            "txId": "0xabc", "coin": "usdt", "network": "TRX", "address": "taddr1",
            "amount": 25, "status": 1, "insertTime": Utc::now().timestamp_millis()
        });
        let (status, _, _) = send(&app, Method::POST, "/api/admin/deposits", Some(deposit.clone()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _, _) = send(&app, Method::POST, "/api/admin/deposits", Some(deposit), Some(&admin_cookie())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, _, body) = send(&app, Method::GET, &status_uri, None, None).await;
        assert_eq!(body["status"], "paid");
        assert_eq!(body["confirmations"][0]["txId"], "0xabc");

        let (status, _, _) = send(&app, Method::GET, "/api/crypto/session/not-a-uuid/status", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_session_paid_once_across_polls() {
        let state = state_with(vec![], None).await;
        let app = router(state.clone());
        let open = json!({ "amount": 0.5, "asset": "bnb", "address": "bnb1shop", "network": "bep2", "tagOrMemo": "order-9" });
        let (_, _, body) = send(&app, Method::POST, "/api/crypto/session", Some(open), None).await;
        let id: uuid::Uuid = body["id"].as_str().unwrap().parse().unwrap();
        let status_uri = format!("/api/crypto/session/{id}/status");

        let deposit = json!({
            "txId": "tx-9", "coin": "BNB", "network": "BEP2", "address": "BNB1SHOP", "addressTag": "order-9",
            "amount": 0.5, "status": 1, "insertTime": Utc::now().timestamp_millis()
        });
        send(&app, Method::POST, "/api/admin/deposits", Some(deposit), Some(&admin_cookie())).await;

        let (_, _, first) = send(&app, Method::GET, &status_uri, None, None).await;
        assert_eq!(first["status"], "paid");
        let paid_at = state.store.get_crypto_session(id).await.unwrap().unwrap().paid_at;
        assert!(paid_at.is_some());

        let (_, _, second) = send(&app, Method::GET, &status_uri, None, None).await;
        assert_eq!(second, first);
        assert_eq!(state.store.get_crypto_session(id).await.unwrap().unwrap().paid_at, paid_at);
        assert!(!state.store.mark_crypto_session_paid(id, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_status_finds_deposit_sent_before_session() {
        let app = app().await;
        let deposit = json!({
            "txId": "early", "coin": "USDT", "network": "TRX", "address": "TEarly",
            "amount": 10, "status": 1, "insertTime": (Utc::now() - chrono::Duration::minutes(20)).timestamp_millis()
        });
        send(&app, Method::POST, "/api/admin/deposits", Some(deposit), Some(&admin_cookie())).await;
        let stale = json!({
            "txId": "stale", "coin": "USDT", "network": "TRX", "address": "TStale",
            "amount": 10, "status": 1, "insertTime": (Utc::now() - chrono::Duration::minutes(45)).timestamp_millis()
        });
        send(&app, Method::POST, "/api/admin/deposits", Some(stale), Some(&admin_cookie())).await;

        let (_, _, body) = send(&app, Method::POST, "/api/crypto/session", Some(json!({ "amount": 10, "asset": "usdt", "address": "TEarly" })), None).await;
        let (_, _, body) = send(&app, Method::GET, &format!("/api/crypto/session/{}/status", body["id"].as_str().unwrap()), None, None).await;
        assert_eq!(body["status"], "paid");
        assert_eq!(body["confirmations"][0]["txId"], "early");

        let (_, _, body) = send(&app, Method::POST, "/api/crypto/session", Some(json!({ "amount": 10, "asset": "usdt", "address": "TStale" })), None).await;
        let (_, _, body) = send(&app, Method::GET, &format!("/api/crypto/session/{}/status", body["id"].as_str().unwrap()), None, None).await;
        assert_eq!(body, json!({ "status": "pending" }));
    }

    #[tokio::test]
    async fn test_cart_quote_and_whatsapp() {
        let app = app().await;
        let items = json!({ "items": [
            { "id": "dunk-low", "size": "42", "qty": 2 },
            { "id": "ghost", "qty": 1 },
            { "id": "dunk-low", "size": "42", "quantity": 1 }
        ]});
        let (status, _, body) = send(&app, Method::POST, "/api/cart/quote", Some(items.clone()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"][0]["quantity"], 3);
        assert_eq!(body["subtotal"]["amount"], json!(300.0));
        assert_eq!(body["unavailable"], json!(["ghost"]));

        let (status, _, body) = send(&app, Method::POST, "/api/checkout/whatsapp", Some(items), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["url"].as_str().unwrap().starts_with("https://wa.me/15550100200?text="));
        assert_eq!(body["message"], "Hello! I'd like to order:\n• Dunk Low (size 42) x3 — $100.00 each\n—\nTotal: $300.00");

        let (status, _, body) = send(&app, Method::POST, "/api/checkout/whatsapp", Some(json!({ "items": [] })), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cart is empty");

        let (status, _, _) = send(&app, Method::POST, "/api/cart/quote", Some(json!({ "items": [{ "id": "dunk-low", "qty": 0 }] })), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_suggestions() {
        let app = app().await;
        let (_, _, body) = send(&app, Method::GET, "/api/search-suggestions?q=TOTE", None, None).await;
        assert_eq!(body, json!({ "items": [{ "id": "canvas-tote", "name": "Canvas Tote", "imageUrl": "/placeholder.svg" }] }));
        let (_, _, body) = send(&app, Method::GET, "/api/search-suggestions?query=shoes", None, None).await;
        assert_eq!(body["items"][0]["id"], "dunk-low");
        let (_, _, body) = send(&app, Method::GET, "/api/search-suggestions?q=%20", None, None).await;
        assert_eq!(body, json!({ "items": [] }));
    }
}
