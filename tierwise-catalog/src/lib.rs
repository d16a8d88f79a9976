pub mod tier;
pub mod pricing;
pub mod format;

pub use tier::{FormulaType, PriceTier, TierValidationError};
pub use pricing::{
    legacy_prices, next_tier, price_for_tier, product_prices, quote_tiers, resolve_applicable_tier,
    resolve_price, CalculatedTier, LegacyPrices, NextTier, PriceResolution, ProductPrices,
    TierCalculation, TierQuote,
};
pub use format::{format_price, formula_description};
