use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use futures_util::StreamExt;
use serde_json::{json, Value};
use std::time::Duration;
use tierwise_api::{
    app,
    middleware::auth::{issue_token, ROLE_ADMIN, ROLE_CUSTOMER},
    state::{AppState, AuthConfig},
};
use tierwise_cart::HubConfig;
use tierwise_shared::models::events::NotificationKind;
use tower::ServiceExt;

const SECRET: &str = "integration-secret";

fn test_state() -> AppState {
    AppState::in_memory(
        AuthConfig { secret: SECRET.to_string(), expiration: 3600 },
        HubConfig::default(),
    )
}

fn token(sub: &str, role: &str) -> String {
    issue_token(SECRET, sub, role, 3600).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn tier_named<'a>(tiers: &'a Value, name: &str) -> &'a Value {
    tiers
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == name)
        .unwrap_or_else(|| panic!("tier {} missing", name))
}

#[tokio::test]
async fn test_health() {
    let app = app(test_state());
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_public_tier_list_is_ordered() {
    let app = app(test_state());
    let (status, body) = send(&app, "GET", "/settings/price-tiers", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["tiers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["discount2", "discount1", "wholesale"]);
}

#[tokio::test]
async fn test_calculate_flags_applicable_tier() {
    let app = app(test_state());
    let (status, body) = send(
        &app,
        "GET",
        "/settings/price-tiers/calculate?cost_price=1000&quantity=7",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 7);
    let discount1 = tier_named(&body["tiers"], "discount1");
    assert_eq!(discount1["applies_now"], true);
    assert_eq!(discount1["calculated_price"], 2250.0);
    assert_eq!(tier_named(&body["tiers"], "wholesale")["applies_now"], false);
    assert_eq!(tier_named(&body["tiers"], "discount2")["applies_now"], false);
}

#[tokio::test]
async fn test_calculate_requires_cost_price() {
    let app = app(test_state());

    let (status, body) = send(&app, "GET", "/settings/price-tiers/calculate?quantity=3", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "cost_price is required");

    let (status, _) = send(&app, "GET", "/settings/price-tiers/calculate?cost_price=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calculate_defaults_to_single_unit() {
    let app = app(test_state());
    let (status, body) = send(&app, "GET", "/settings/price-tiers/calculate?cost_price=100", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 1);
    assert_eq!(tier_named(&body["tiers"], "wholesale")["applies_now"], true);
}

#[tokio::test]
async fn test_tier_writes_require_staff_role() {
    let app = app(test_state());
    let tier = json!({ "name": "bulk", "display_name": "Bulk 24+", "formula_type": "multiplier", "multiplier": 1.5, "min_quantity": 24 });

    let (status, _) = send(&app, "POST", "/settings/price-tiers", None, Some(tier.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "POST", "/settings/price-tiers", Some("not-a-jwt"), Some(tier.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let customer = token("customer-1", ROLE_CUSTOMER);
    let (status, _) = send(&app, "POST", "/settings/price-tiers", Some(&customer), Some(tier)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_tier_lifecycle() {
    let app = app(test_state());
    let admin = token("admin-1", ROLE_ADMIN);

    let (status, created) = send(
        &app,
        "POST",
        "/settings/price-tiers",
        Some(&admin),
        Some(json!({ "name": "bulk", "display_name": "Bulk 24+", "formula_type": "multiplier", "multiplier": 1.5, "min_quantity": 24 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 4);
    assert_eq!(created["order_index"], 4);

    let (status, updated) = send(
        &app,
        "PUT",
        "/settings/price-tiers/4",
        Some(&admin),
        Some(json!({ "multiplier": 1.4, "order_index": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["multiplier"], 1.4);
    assert_eq!(updated["order_index"], 4);
    assert_eq!(updated["display_name"], "Bulk 24+");

    let (status, fetched) = send(&app, "GET", "/settings/price-tiers/4", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["multiplier"], 1.4);

    let (status, _) = send(&app, "DELETE", "/settings/price-tiers/4", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/settings/price-tiers/4", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_rejects_invalid_tiers() {
    let app = app(test_state());
    let admin = token("admin-1", ROLE_ADMIN);

    let (status, _) = send(
        &app,
        "POST",
        "/settings/price-tiers",
        Some(&admin),
        Some(json!({ "name": "", "display_name": "Nameless", "formula_type": "multiplier" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/settings/price-tiers",
        Some(&admin),
        Some(json!({ "name": "odd", "display_name": "Odd", "formula_type": "compound_interest" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/settings/price-tiers",
        Some(&admin),
        Some(json!({ "name": "plain", "display_name": "Plain" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "formula_type is required");

    let (status, _) = send(
        &app,
        "PUT",
        "/settings/price-tiers/2",
        Some(&admin),
        Some(json!({ "formula_type": "compound_interest" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "DELETE", "/settings/price-tiers/1", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "the default price tier cannot be deleted");

    let (status, _) = send(&app, "PUT", "/settings/price-tiers/99", Some(&admin), Some(json!({ "multiplier": 3.0 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reorder_changes_resolution() {
    let app = app(test_state());
    let admin = token("admin-1", ROLE_ADMIN);

    // Put the 6+ tier ahead of the 12+ tier
    let (status, _) = send(
        &app,
        "PUT",
        "/settings/price-tiers/reorder",
        Some(&admin),
        Some(json!({ "tiers": [{ "id": 2, "order_index": 1 }, { "id": 3, "order_index": 2 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        "GET",
        "/settings/price-tiers/calculate?cost_price=1000&quantity=20",
        None,
        None,
    )
    .await;
    assert_eq!(tier_named(&body["tiers"], "discount1")["applies_now"], true);
    assert_eq!(tier_named(&body["tiers"], "discount2")["applies_now"], false);
}

#[tokio::test]
async fn test_recalculate_products_uses_current_tiers() {
    let state = test_state();
    let app = app(state.clone());
    let admin = token("admin-1", ROLE_ADMIN);

    let (status, _) = send(
        &app,
        "PUT",
        "/settings/price-tiers/1",
        Some(&admin),
        Some(json!({ "multiplier": 3.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", "/settings/price-tiers/recalculate-products", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_products"], 3);
    assert_eq!(body["updated"], 3);
    assert_eq!(body["errors"], 0);
    assert_eq!(body["tiers_applied"], 3);

    let product = state.products.get_product(1).await.unwrap().unwrap();
    assert_eq!(product.wholesale_price, 12000.0);
    assert_eq!(product.discount1_price, 9000.0);
    assert_eq!(product.discount2_price, 7000.0);
}

#[tokio::test]
async fn test_cart_requires_token() {
    let app = app(test_state());
    let (status, _) = send(&app, "GET", "/cart/summary", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cart_reaches_next_tier() {
    let app = app(test_state());
    let customer = token("customer-1", ROLE_CUSTOMER);

    let (status, body) = send(
        &app,
        "POST",
        "/cart/items",
        Some(&customer),
        Some(json!({ "product_id": 1, "quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_quantity"], 5);
    assert_eq!(body["tier"]["name"], "wholesale");
    assert_eq!(body["items"][0]["unit_price"], 10000.0);
    assert_eq!(body["next_tier"]["quantity_to_unlock"], 1);

    let (_, body) = send(
        &app,
        "POST",
        "/cart/items",
        Some(&customer),
        Some(json!({ "product_id": 3, "quantity": 1 })),
    )
    .await;
    assert_eq!(body["total_quantity"], 6);
    assert_eq!(body["tier"]["name"], "discount1");
    assert_eq!(body["items"][0]["unit_price"], 9000.0);
    assert_eq!(body["subtotal"], 5.0 * 9000.0 + 1800.0 * 2.25);

    let (_, body) = send(&app, "DELETE", "/cart/items/3", Some(&customer), None).await;
    assert_eq!(body["total_quantity"], 5);
    assert_eq!(body["tier"]["name"], "wholesale");

    let (_, body) = send(&app, "PUT", "/cart/items/1", Some(&customer), Some(json!({ "quantity": 12 }))).await;
    assert_eq!(body["tier"]["name"], "discount2");
    assert!(body["next_tier"].is_null());
}

#[tokio::test]
async fn test_cart_rejects_bad_items() {
    let app = app(test_state());
    let customer = token("customer-1", ROLE_CUSTOMER);

    let (status, _) = send(
        &app,
        "POST",
        "/cart/items",
        Some(&customer),
        Some(json!({ "product_id": 42, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/cart/items",
        Some(&customer),
        Some(json!({ "product_id": 1, "quantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "PUT", "/cart/items/1", Some(&customer), Some(json!({ "quantity": 2 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_changes_publish_notifications() {
    let state = test_state();
    let app = app(state.clone());
    let customer = token("customer-1", ROLE_CUSTOMER);
    let mut rx = state.hub.subscribe();

    // First look at the cart only records a baseline
    send(&app, "GET", "/cart/summary", Some(&customer), None).await;
    send(&app, "POST", "/cart/items", Some(&customer), Some(json!({ "product_id": 1, "quantity": 5 }))).await;
    send(&app, "POST", "/cart/items", Some(&customer), Some(json!({ "product_id": 1, "quantity": 1 }))).await;

    let near = rx.try_recv().unwrap();
    assert_eq!(near.user_id, "customer-1");
    assert_eq!(near.notification.kind, NotificationKind::NearTier);
    assert_eq!(near.notification.items_needed, Some(1));

    let unlocked = rx.try_recv().unwrap();
    assert_eq!(unlocked.notification.kind, NotificationKind::TierUnlocked);
    assert_eq!(unlocked.notification.tier_id, Some(2));
    assert_eq!(unlocked.notification.tier_name, "Wholesale 6+");

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_guest_price_does_not_store_cart() {
    let state = test_state();
    let app = app(state.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/cart/guest-price",
        None,
        Some(json!({ "items": [{ "product_id": 1, "quantity": 10 }, { "product_id": 3, "quantity": 2 }] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_quantity"], 12);
    assert_eq!(body["tier"]["name"], "discount2");
    assert_eq!(body["subtotal"], 10.0 * 7000.0 + 2.0 * 3150.0);
    assert!(body["cart_id"].is_null());

    let (status, _) = send(
        &app,
        "POST",
        "/cart/guest-price",
        None,
        Some(json!({ "items": [{ "product_id": 77, "quantity": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_guest_login_issues_token() {
    let app = app(test_state());
    let (status, body) = send(&app, "POST", "/auth/guest", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let guest = body["token"].as_str().unwrap().to_string();
    let (status, body) = send(&app, "GET", "/cart/summary", Some(&guest), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_quantity"], 0);
}

#[tokio::test]
async fn test_notification_stream_only_carries_own_events() {
    let state = test_state();
    let app = app(state.clone());
    let customer = token("customer-1", ROLE_CUSTOMER);

    let request = Request::builder()
        .uri("/cart/notifications")
        .header("Authorization", format!("Bearer {}", customer))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");
    let mut stream = response.into_body().into_data_stream();

    // Another shopper reaches the 12+ tier first
    let other = token("customer-2", ROLE_CUSTOMER);
    send(&app, "POST", "/cart/items", Some(&other), Some(json!({ "product_id": 1, "quantity": 1 }))).await;
    send(&app, "POST", "/cart/items", Some(&other), Some(json!({ "product_id": 1, "quantity": 11 }))).await;

    // Then the caller reaches the 6+ tier
    send(&app, "POST", "/cart/items", Some(&customer), Some(json!({ "product_id": 1, "quantity": 1 }))).await;
    send(&app, "POST", "/cart/items", Some(&customer), Some(json!({ "product_id": 1, "quantity": 5 }))).await;

    let chunk = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("no notification within 2s")
        .unwrap()
        .unwrap();
    let frame = String::from_utf8(chunk.to_vec()).unwrap();

    assert!(frame.contains("event: tier_unlocked\n"), "unexpected frame: {}", frame);
    let data = frame
        .lines()
        .find_map(|line| line.strip_prefix("data: "))
        .unwrap();
    let payload: Value = serde_json::from_str(data).unwrap();
    assert_eq!(payload["type"], "tier_unlocked");
    assert_eq!(payload["tier_id"], 2);
    assert_eq!(payload["tier_name"], "Wholesale 6+");

    // Nothing else is queued for the caller
    let next = tokio::time::timeout(Duration::from_millis(200), stream.next()).await;
    assert!(next.is_err());
}
