//! Integration tests for the storefront REST API
//!
//! These tests drive the full router the way the front end does:
//! - Session cookie issue and reuse
//! - Cart merge, quantity updates, removal and clearing
//! - Wishlist de-duplication
//! - Currency switching and converted totals
//! - Checkout validation and order placement

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

use storefront::router::create_app_router;
use storefront::store::{AppState, SharedState};

/// Helper function to create a test app instance
fn create_test_app() -> axum::Router {
    create_test_app_with_state().0
}

/// Test app plus a handle on its state, for inspecting stored sessions
fn create_test_app_with_state() -> (axum::Router, SharedState) {
    let state = Arc::new(AppState::default());
    (create_app_router(Arc::clone(&state)), state)
}

/// Sends a request with an optional session cookie; returns status, the new
/// session cookie (if one was issued) and the JSON body
async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    session: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = session {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().split(';').next().unwrap().to_string());

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, cookie, body)
}

/// Opens a session and returns its cookie
async fn open_session(app: &axum::Router) -> String {
    let (status, cookie, _) = send(app, "GET", "/cart", None, None).await;
    assert_eq!(status, StatusCode::OK);
    cookie.expect("first request should issue a session cookie")
}

fn kinds(body: &Value) -> Vec<String> {
    body["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_session_cookie_issued_once() {
    let app = create_test_app();
    let cookie = open_session(&app).await;
    assert!(cookie.starts_with("cart_session="));

    let (status, reissued, body) = send(&app, "GET", "/cart", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(reissued.is_none());
    assert_eq!(body["count"], 0);
    assert_eq!(body["total"], "0");
    assert_eq!(body["currency"], "AED");
}

#[tokio::test]
async fn test_cart_scenario() {
    let app = create_test_app();
    let session = open_session(&app).await;
    let add = json!({ "productId": 3 });

    let (status, _, body) =
        send(&app, "POST", "/cart/items", Some(&session), Some(add.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], "1199");
    assert_eq!(body["count"], 1);
    assert_eq!(kinds(&body), vec!["cart_item_added"]);

    let (_, _, body) = send(&app, "POST", "/cart/items", Some(&session), Some(add)).await;
    assert_eq!(body["total"], "2398");
    assert_eq!(body["count"], 2);
    assert_eq!(body["lineCount"], 1);
    assert_eq!(kinds(&body), vec!["cart_quantity_incremented"]);
    assert_eq!(body["notifications"][0]["quantity"], 2);

    let (_, _, body) = send(
        &app,
        "PATCH",
        "/cart/items/3",
        Some(&session),
        Some(json!({ "quantity": 5 })),
    )
    .await;
    assert_eq!(body["total"], "5995");
    assert_eq!(body["count"], 5);
    assert_eq!(body["items"][0]["quantity"], 5);
    assert_eq!(body["items"][0]["lineTotal"], "5995");

    let (_, _, body) = send(&app, "DELETE", "/cart/items/3", Some(&session), None).await;
    assert_eq!(body["total"], "0");
    assert_eq!(body["count"], 0);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(kinds(&body), vec!["cart_item_removed"]);

    let (_, _, body) = send(&app, "DELETE", "/cart/items/3", Some(&session), None).await;
    assert!(kinds(&body).is_empty(), "removing an absent item is silent");
}

#[tokio::test]
async fn test_zero_quantity_removes_line() {
    let app = create_test_app();
    let session = open_session(&app).await;
    send(&app, "POST", "/cart/items", Some(&session), Some(json!({ "productId": 1 }))).await;
    send(&app, "POST", "/cart/items", Some(&session), Some(json!({ "productId": 2 }))).await;

    let (status, _, body) = send(
        &app,
        "PATCH",
        "/cart/items/1",
        Some(&session),
        Some(json!({ "quantity": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lineCount"], 1);
    assert_eq!(body["items"][0]["id"], 2);
    assert_eq!(kinds(&body), vec!["cart_item_removed"]);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = create_test_app();
    let session = open_session(&app).await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/cart/items",
        Some(&session),
        Some(json!({ "productId": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product 999 not found in catalog");
}

#[tokio::test]
async fn test_clear_cart() {
    let app = create_test_app();
    let session = open_session(&app).await;
    send(&app, "POST", "/cart/items", Some(&session), Some(json!({ "productId": 4 }))).await;

    let (_, _, body) = send(&app, "DELETE", "/cart", Some(&session), None).await;
    assert_eq!(body["count"], 0);
    assert_eq!(kinds(&body), vec!["cart_cleared"]);
    assert_eq!(body["notifications"][0]["message"], "Cart cleared");
}

#[tokio::test]
async fn test_wishlist_deduplicates() {
    let app = create_test_app();
    let session = open_session(&app).await;
    let add = json!({ "productId": 7 });

    let (_, _, body) =
        send(&app, "POST", "/wishlist/items", Some(&session), Some(add.clone())).await;
    assert_eq!(kinds(&body), vec!["wishlist_item_added"]);

    let (_, _, body) = send(&app, "POST", "/wishlist/items", Some(&session), Some(add)).await;
    assert_eq!(kinds(&body), vec!["wishlist_item_already_present"]);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["inWishlist"], true);

    let (_, _, body) = send(&app, "DELETE", "/wishlist/items/7", Some(&session), None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 0);

    let (status, _, body) = send(&app, "DELETE", "/wishlist/items/7", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(kinds(&body).is_empty());
}

#[tokio::test]
async fn test_currency_switch_converts_every_price() {
    let app = create_test_app();
    let session = open_session(&app).await;
    send(&app, "POST", "/cart/items", Some(&session), Some(json!({ "productId": 1 }))).await;

    let usd = json!({ "currency": "USD" });
    let (_, _, body) = send(&app, "PUT", "/settings", Some(&session), Some(usd.clone())).await;
    assert_eq!(body["currency"], "USD");
    assert_eq!(body["currencySymbol"], "$");

    // 4599 * 0.27 = 1241.73
    let (_, _, cart) = send(&app, "GET", "/cart", Some(&session), None).await;
    assert_eq!(cart["total"], "1242");
    assert_eq!(cart["items"][0]["unitPrice"], "1242");
    assert_eq!(cart["items"][0]["price"], "4599", "catalog price stays in AED");

    // Re-selecting the same currency changes nothing
    send(&app, "PUT", "/settings", Some(&session), Some(usd)).await;
    let (_, _, again) = send(&app, "GET", "/cart", Some(&session), None).await;
    assert_eq!(again["total"], cart["total"]);

    let (_, _, quote) = send(
        &app,
        "POST",
        "/checkout/quote",
        Some(&session),
        Some(json!({ "shippingMethod": "express" })),
    )
    .await;
    // (4599 + 50) * 0.27 = 1255.23
    assert_eq!(quote["shipping"], "14");
    assert_eq!(quote["total"], "1255");
}

#[tokio::test]
async fn test_settings_location() {
    let app = create_test_app();
    let session = open_session(&app).await;

    let (_, _, body) = send(&app, "GET", "/settings", Some(&session), None).await;
    assert_eq!(body["location"], "أبوظبي");
    assert_eq!(body["locations"].as_array().unwrap().len(), 7);

    let dubai = json!({ "location": "دبي" });
    let (_, _, body) = send(&app, "PUT", "/settings", Some(&session), Some(dubai)).await;
    assert_eq!(body["location"], "دبي");
    assert_eq!(body["currency"], "AED");
}

#[tokio::test]
async fn test_checkout_places_order() {
    let app = create_test_app();
    let session = open_session(&app).await;
    send(&app, "POST", "/cart/items", Some(&session), Some(json!({ "productId": 6 }))).await;
    send(&app, "POST", "/cart/items", Some(&session), Some(json!({ "productId": 6 }))).await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/checkout",
        Some(&session),
        Some(json!({
            "shippingMethod": "express",
            "shippingInfo": {
                "fullName": "Omar Khalid",
                "phone": "+971501234567",
                "address": "Marina Walk, Tower 3",
                "city": "Dubai",
                "emirate": "Dubai"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["orderNumber"].as_str().unwrap().starts_with("ORD-"));
    assert_eq!(body["step"], "confirmation");
    assert_eq!(body["subtotal"], "1998");
    assert_eq!(body["shipping"], "50");
    assert_eq!(body["total"], "2048");
    assert_eq!(body["lines"][0]["quantity"], 2);
    assert_eq!(kinds(&body), vec!["cart_cleared", "order_placed"]);

    let (_, _, cart) = send(&app, "GET", "/cart", Some(&session), None).await;
    assert_eq!(cart["count"], 0);
}

#[tokio::test]
async fn test_checkout_rejections() {
    let app = create_test_app();
    let session = open_session(&app).await;
    let info = json!({
        "fullName": "Omar Khalid",
        "phone": "",
        "address": "Marina Walk",
        "city": "Dubai"
    });

    let (status, _, body) = send(
        &app,
        "POST",
        "/checkout",
        Some(&session),
        Some(json!({ "shippingInfo": info.clone() })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cart is empty");

    send(&app, "POST", "/cart/items", Some(&session), Some(json!({ "productId": 2 }))).await;
    let (status, _, body) = send(
        &app,
        "POST",
        "/checkout",
        Some(&session),
        Some(json!({ "shippingInfo": info })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required field: phone");

    let (_, _, cart) = send(&app, "GET", "/cart", Some(&session), None).await;
    assert_eq!(cart["count"], 1, "a rejected checkout keeps the cart");
}

#[tokio::test]
async fn test_product_listing() {
    let app = create_test_app();
    let session = open_session(&app).await;
    send(&app, "POST", "/wishlist/items", Some(&session), Some(json!({ "productId": 5 }))).await;

    let (status, _, body) = send(
        &app,
        "GET",
        "/products?sort=price-high&categories=processors,storage&minPrice=700",
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let products = body["products"].as_array().unwrap();
    let ids: Vec<_> = products.iter().map(|p| p["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![5, 7]);
    assert_eq!(products[0]["inWishlist"], true);
    assert_eq!(products[1]["inWishlist"], false);
    assert_eq!(body["maxPrice"], "5000");
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = create_test_app();
    let alice = open_session(&app).await;
    let bob = open_session(&app).await;
    assert_ne!(alice, bob);

    send(&app, "POST", "/cart/items", Some(&alice), Some(json!({ "productId": 8 }))).await;

    let (_, _, body) = send(&app, "GET", "/cart", Some(&bob), None).await;
    assert_eq!(body["count"], 0);
    let (_, _, body) = send(&app, "GET", "/cart", Some(&alice), None).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_read_only_requests_store_no_session() {
    let (app, state) = create_test_app_with_state();

    for _ in 0..10 {
        for uri in ["/products", "/settings", "/cart", "/wishlist"] {
            let (status, cookie, _) = send(&app, "GET", uri, None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert!(cookie.is_some());
        }
        let quote = json!({ "shippingMethod": "express" });
        send(&app, "POST", "/checkout/quote", None, Some(quote)).await;
    }
    assert_eq!(state.sessions.len(), 0);

    // The cookie handed out by a read is honoured once something is stored
    let session = open_session(&app).await;
    send(&app, "POST", "/cart/items", Some(&session), Some(json!({ "productId": 1 }))).await;
    assert_eq!(state.sessions.len(), 1);
    let (_, reissued, cart) = send(&app, "GET", "/cart", Some(&session), None).await;
    assert!(reissued.is_none());
    assert_eq!(cart["count"], 1);
}

#[tokio::test]
async fn test_forged_session_cookie_is_replaced() {
    let (app, state) = create_test_app_with_state();

    for i in 0..10 {
        let forged = format!("cart_session=attacker-{}", i);
        let (status, cookie, _) = send(&app, "GET", "/settings", Some(&forged), None).await;
        assert_eq!(status, StatusCode::OK);
        let cookie = cookie.expect("a forged id gets a fresh session cookie");
        assert_ne!(cookie, forged);
    }
    assert_eq!(state.sessions.len(), 0);

    let forged = "cart_session=attacker-mutation";
    let add = json!({ "productId": 2 });
    let (status, cookie, _) = send(&app, "POST", "/cart/items", Some(forged), Some(add)).await;
    assert_eq!(status, StatusCode::OK);
    let cookie = cookie.unwrap();
    assert!(!state.sessions.contains_key("attacker-mutation"));
    assert!(state.sessions.contains_key(cookie.trim_start_matches("cart_session=")));
}

#[tokio::test]
async fn test_failed_checkout_stores_no_session() {
    let (app, state) = create_test_app_with_state();
    let order = json!({
        "shippingInfo": {
            "fullName": "Omar Khalid",
            "phone": "+971501234567",
            "address": "Marina Walk",
            "city": "Dubai"
        }
    });

    let (status, cookie, _) = send(&app, "POST", "/checkout", None, Some(order)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(cookie.is_none());
    assert_eq!(state.sessions.len(), 0);
}
