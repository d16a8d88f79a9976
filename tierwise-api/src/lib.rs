use axum::{
    http::Method,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod cart;
pub mod error;
pub mod middleware;
pub mod price_tiers;
pub mod state;

pub use state::AppState;

use middleware::{admin_auth_middleware, customer_auth_middleware};

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(price_tier_routes(&state))
        .merge(cart_routes(&state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Reads are public, writes need staff credentials on the same paths
fn price_tier_routes(state: &AppState) -> Router<AppState> {
    let admin = from_fn_with_state(state.clone(), admin_auth_middleware);

    Router::new()
        .route(
            "/settings/price-tiers",
            get(price_tiers::list_tiers)
                .merge(post(price_tiers::create_tier).route_layer(admin.clone())),
        )
        .route("/settings/price-tiers/calculate", get(price_tiers::calculate))
        .route(
            "/settings/price-tiers/reorder",
            put(price_tiers::reorder_tiers).route_layer(admin.clone()),
        )
        .route(
            "/settings/price-tiers/recalculate-products",
            post(price_tiers::recalculate_products).route_layer(admin.clone()),
        )
        .route(
            "/settings/price-tiers/{id}",
            get(price_tiers::get_tier)
                .put(price_tiers::update_tier)
                .delete(price_tiers::delete_tier)
                .route_layer(admin),
        )
}

fn cart_routes(state: &AppState) -> Router<AppState> {
    let customer = from_fn_with_state(state.clone(), customer_auth_middleware);

    Router::new()
        .route("/cart/summary", get(cart::summary))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{product_id}",
            put(cart::update_item).merge(delete(cart::remove_item)),
        )
        .route("/cart/notifications", get(cart::notifications))
        .route_layer(customer)
        .route("/cart/guest-price", post(cart::guest_price))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
