use serde::{Deserialize, Serialize};
use crate::tier::{FormulaType, PriceTier};

/// One row of the per-tier breakdown shown next to the resolved price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierQuote {
    pub tier: PriceTier,
    pub price: f64,

    /// `quantity >= tier.min_quantity`, regardless of which tier resolved
    pub applies: bool,
}

/// Outcome of pricing a cost at a given quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceResolution {
    pub price: f64,
    pub tier: Option<PriceTier>,
    pub all_tiers: Vec<TierQuote>,
}

/// A tier as returned by the server-side calculate endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedTier {
    #[serde(flatten)]
    pub tier: PriceTier,
    pub calculated_price: f64,
    pub applies_now: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierCalculation {
    pub cost_price: f64,
    pub quantity: i64,
    pub tiers: Vec<CalculatedTier>,
}

/// The closest tier the buyer has not reached yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextTier {
    pub display_name: String,
    pub min_quantity: i64,
    pub quantity_to_unlock: i64,
}

/// Stored price columns of a product
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductPrices {
    pub wholesale_price: f64,
    pub discount1_price: f64,
    pub discount2_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegacyPrices {
    pub retail: f64,
    pub wholesale: f64,
    pub discount1: f64,
    pub discount2: f64,
}

const LEGACY_WHOLESALE: f64 = 2.5;
const LEGACY_DISCOUNT1: f64 = 2.25;
const LEGACY_DISCOUNT2: f64 = 1.75;

/// Applies the tier formula to a cost price. Unknown formulas leave the cost untouched.
pub fn price_for_tier(cost_price: f64, tier: &PriceTier) -> f64 {
    match &tier.formula_type {
        FormulaType::Multiplier => cost_price * tier.multiplier,
        FormulaType::PercentageMarkup => cost_price + cost_price * tier.percentage / 100.0,
        FormulaType::FlatAmount => cost_price + tier.flat_amount,
        FormulaType::Other(_) => cost_price,
    }
}

/// Active tiers ordered by `order_index`; equal indices keep input order.
fn active_by_priority(tiers: &[PriceTier]) -> Vec<&PriceTier> {
    let mut active: Vec<&PriceTier> = tiers.iter().filter(|t| t.active).collect();
    active.sort_by_key(|t| t.order_index);
    active
}

/// Picks the tier that prices an order of `quantity` units.
///
/// Among active tiers whose threshold is met, the lowest `order_index` wins.
/// When none qualifies the active default tier is used, and `None` is returned
/// when there is no default either.
pub fn resolve_applicable_tier(tiers: &[PriceTier], quantity: i64) -> Option<&PriceTier> {
    let active = active_by_priority(tiers);

    let mut applicable: Option<&PriceTier> = None;
    for tier in active.iter().copied() {
        if quantity >= tier.min_quantity {
            match applicable {
                Some(best) if tier.order_index >= best.order_index => {}
                _ => applicable = Some(tier),
            }
        }
    }

    if applicable.is_none() {
        applicable = active.into_iter().find(|t| t.is_default);
    }

    if let Some(tier) = applicable {
        tracing::debug!(tier_id = tier.id, quantity, "resolved price tier");
    }
    applicable
}

pub fn resolve_price(cost_price: f64, quantity: i64, tiers: &[PriceTier]) -> PriceResolution {
    let tier = resolve_applicable_tier(tiers, quantity);
    let price = tier.map_or(cost_price, |t| price_for_tier(cost_price, t));

    let all_tiers = active_by_priority(tiers)
        .into_iter()
        .map(|t| TierQuote {
            tier: t.clone(),
            price: price_for_tier(cost_price, t),
            applies: quantity >= t.min_quantity,
        })
        .collect();

    PriceResolution {
        price,
        tier: tier.cloned(),
        all_tiers,
    }
}

/// Prices every active tier and flags the one that applies right now.
pub fn quote_tiers(cost_price: f64, quantity: i64, tiers: &[PriceTier]) -> TierCalculation {
    let resolved_id = resolve_applicable_tier(tiers, quantity).map(|t| t.id);

    let mut flagged = false;
    let tiers = active_by_priority(tiers)
        .into_iter()
        .map(|t| {
            // ids are unique in storage, but only the first match is flagged either way
            let applies_now = !flagged && Some(t.id) == resolved_id;
            flagged |= applies_now;
            CalculatedTier {
                tier: t.clone(),
                calculated_price: price_for_tier(cost_price, t),
                applies_now,
            }
        })
        .collect();

    TierCalculation {
        cost_price,
        quantity,
        tiers,
    }
}

pub fn next_tier(tiers: &[PriceTier], quantity: i64) -> Option<NextTier> {
    tiers
        .iter()
        .filter(|t| t.active && t.min_quantity > quantity)
        .fold(None::<&PriceTier>, |best, t| match best {
            Some(b) if b.min_quantity <= t.min_quantity => Some(b),
            _ => Some(t),
        })
        .map(|t| NextTier {
            display_name: t.display_name.clone(),
            min_quantity: t.min_quantity,
            quantity_to_unlock: t.min_quantity - quantity,
        })
}

/// Computes the three stored price columns of a product from the tier set.
///
/// Tiers named `wholesale`, `discount1` and `discount2` map to their column;
/// other tiers map by `order_index` 3, 2 and 1. Columns no tier covers keep
/// the legacy multipliers.
pub fn product_prices(cost_price: f64, tiers: &[PriceTier]) -> ProductPrices {
    let mut prices = ProductPrices {
        wholesale_price: cost_price * LEGACY_WHOLESALE,
        discount1_price: cost_price * LEGACY_DISCOUNT1,
        discount2_price: cost_price * LEGACY_DISCOUNT2,
    };

    for tier in tiers.iter().filter(|t| t.active) {
        let price = price_for_tier(cost_price, tier);
        match (tier.name.as_str(), tier.order_index) {
            ("wholesale", _) => prices.wholesale_price = price,
            ("discount1", _) => prices.discount1_price = price,
            ("discount2", _) => prices.discount2_price = price,
            (_, 3) => prices.wholesale_price = price,
            (_, 2) => prices.discount1_price = price,
            (_, 1) => prices.discount2_price = price,
            _ => {}
        }
    }

    prices
}

/// Fixed multipliers used before tiers were configurable.
pub fn legacy_prices(cost_price: f64) -> LegacyPrices {
    LegacyPrices {
        retail: cost_price,
        wholesale: cost_price * LEGACY_WHOLESALE,
        discount1: cost_price * LEGACY_DISCOUNT1,
        discount2: cost_price * LEGACY_DISCOUNT2,
    }
}
