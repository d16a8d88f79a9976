use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tierwise_catalog::{product_prices, quote_tiers, PriceTier, TierCalculation};
use tierwise_core::{TierOrder, TierUpdate};

use crate::{error::AppError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListTiersQuery {
    pub include_inactive: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TierListResponse {
    pub tiers: Vec<PriceTier>,
}

#[derive(Debug, Deserialize)]
pub struct CalculateQuery {
    pub cost_price: Option<String>,
    pub quantity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub tiers: Vec<TierOrder>,
}

#[derive(Debug, Serialize)]
pub struct RecalculationResponse {
    pub message: String,
    pub total_products: usize,
    pub updated: usize,
    pub errors: usize,
    pub tiers_applied: usize,
}

// ============================================================================
// Public Handlers
// ============================================================================

/// GET /settings/price-tiers
pub async fn list_tiers(
    State(state): State<AppState>,
    Query(query): Query<ListTiersQuery>,
) -> Result<Json<TierListResponse>, AppError> {
    let include_inactive = query.include_inactive.as_deref() == Some("true");
    let tiers = state.tiers.list_tiers(include_inactive).await?;
    Ok(Json(TierListResponse { tiers }))
}

/// GET /settings/price-tiers/calculate?cost_price=..&quantity=..
/// Prices every active tier for a cost and flags the one that applies.
pub async fn calculate(
    State(state): State<AppState>,
    Query(query): Query<CalculateQuery>,
) -> Result<Json<TierCalculation>, AppError> {
    let cost_price = query
        .cost_price
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::ValidationError("cost_price is required".to_string()))?
        .parse::<f64>()
        .map_err(|_| AppError::ValidationError("cost_price must be a valid number".to_string()))?;

    // An unreadable quantity prices a single unit
    let quantity = query
        .quantity
        .as_deref()
        .and_then(|q| q.parse::<i64>().ok())
        .unwrap_or(1);

    let tiers = state.tiers.list_tiers(false).await?;
    Ok(Json(quote_tiers(cost_price, quantity, &tiers)))
}

// ============================================================================
// Admin Handlers
// ============================================================================

/// GET /settings/price-tiers/{id}
pub async fn get_tier(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<PriceTier>, AppError> {
    state
        .tiers
        .get_tier(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError("price tier not found".to_string()))
}

/// POST /settings/price-tiers
pub async fn create_tier(
    State(state): State<AppState>,
    Json(tier): Json<PriceTier>,
) -> Result<(StatusCode, Json<PriceTier>), AppError> {
    tier.validate()?;

    let created = state.tiers.create_tier(tier).await?;
    tracing::info!(tier_id = created.id, name = %created.name, "price tier created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /settings/price-tiers/{id}
pub async fn update_tier(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(update): Json<TierUpdate>,
) -> Result<Json<PriceTier>, AppError> {
    update.validate()?;

    let updated = state.tiers.update_tier(id, &update).await?;
    tracing::info!(tier_id = id, "price tier updated");
    Ok(Json(updated))
}

/// DELETE /settings/price-tiers/{id}
pub async fn delete_tier(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<Value>, AppError> {
    state.tiers.delete_tier(id).await?;
    tracing::info!(tier_id = id, "price tier deleted");
    Ok(Json(json!({ "message": "price tier deleted" })))
}

/// PUT /settings/price-tiers/reorder
pub async fn reorder_tiers(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<Value>, AppError> {
    state.tiers.reorder_tiers(&req.tiers).await?;
    Ok(Json(json!({ "message": "order updated" })))
}

/// POST /settings/price-tiers/recalculate-products
/// Rewrites the stored price columns of every product from the active tiers.
pub async fn recalculate_products(
    State(state): State<AppState>,
) -> Result<Json<RecalculationResponse>, AppError> {
    let tiers = state.tiers.list_tiers(false).await?;
    if tiers.is_empty() {
        return Err(AppError::ValidationError("no price tiers configured".to_string()));
    }

    let products = state.products.list_products().await?;

    let mut updated = 0;
    let mut errors = 0;
    for product in &products {
        let prices = product_prices(product.cost_price, &tiers);
        match state.products.update_prices(product.id, prices).await {
            Ok(()) => updated += 1,
            Err(e) => {
                tracing::warn!(product_id = product.id, "price recalculation failed: {}", e);
                errors += 1;
            }
        }
    }

    tracing::info!(updated, errors, "product prices recalculated");
    Ok(Json(RecalculationResponse {
        message: "recalculation finished".to_string(),
        total_products: products.len(),
        updated,
        errors,
        tiers_applied: tiers.len(),
    }))
}
