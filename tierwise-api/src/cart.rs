use std::convert::Infallible;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tierwise_cart::CartSummary;
use tierwise_core::{active_tiers_or_empty, CartLine, Product};

use crate::{error::AppError, middleware::Claims, state::AppState};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: u32,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct GuestLine {
    pub product_id: u32,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct GuestPriceRequest {
    pub items: Vec<GuestLine>,
}

async fn require_product(state: &AppState, product_id: u32) -> Result<Product, AppError> {
    state
        .products
        .get_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("product {} not found", product_id)))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /cart/summary
pub async fn summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CartSummary>, AppError> {
    Ok(Json(state.hub.refresh(&claims.sub).await?))
}

/// POST /cart/items
pub async fn add_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartSummary>, AppError> {
    if req.quantity <= 0 {
        return Err(AppError::ValidationError("quantity must be positive".to_string()));
    }

    let product = require_product(&state, req.product_id).await?;
    state.carts.add_item(&claims.sub, &product, req.quantity).await?;
    Ok(Json(state.hub.refresh(&claims.sub).await?))
}

/// PUT /cart/items/{product_id}
pub async fn update_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(product_id): Path<u32>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartSummary>, AppError> {
    state.carts.set_quantity(&claims.sub, product_id, req.quantity).await?;
    Ok(Json(state.hub.refresh(&claims.sub).await?))
}

/// DELETE /cart/items/{product_id}
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(product_id): Path<u32>,
) -> Result<Json<CartSummary>, AppError> {
    state.carts.remove_item(&claims.sub, product_id).await?;
    Ok(Json(state.hub.refresh(&claims.sub).await?))
}

/// GET /cart/notifications
/// Server-sent price notifications for the caller's cart.
pub async fn notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let user_id = claims.sub;
    let rx = state.hub.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let user_id = user_id.clone();
        async move {
            match result {
                Ok(event) if event.user_id == user_id => Event::default()
                    .event(event.notification.kind.as_str())
                    .json_data(&event.notification)
                    .ok()
                    .map(Ok),
                Ok(_) => None,
                Err(e) => {
                    // Lagged receivers skip what they missed
                    tracing::warn!("notification stream lagged: {}", e);
                    None
                }
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// POST /cart/guest-price
/// Prices a cart held by the browser without storing it.
pub async fn guest_price(
    State(state): State<AppState>,
    Json(req): Json<GuestPriceRequest>,
) -> Result<Json<CartSummary>, AppError> {
    let mut lines = Vec::with_capacity(req.items.len());
    for (i, item) in req.items.iter().enumerate() {
        if item.quantity <= 0 {
            return Err(AppError::ValidationError("quantity must be positive".to_string()));
        }
        let product = require_product(&state, item.product_id).await?;
        lines.push(CartLine {
            cart_item_id: i as u32 + 1,
            product_id: product.id,
            product_name: product.name,
            variant_name: String::new(),
            quantity: item.quantity,
            cost_price: product.cost_price,
            wholesale_price: product.wholesale_price,
            image_url: product.image_url,
        });
    }

    let tiers = active_tiers_or_empty(state.tiers.as_ref()).await;
    Ok(Json(state.hub.builder().price_lines(&lines, &tiers)))
}
