use serde::{Deserialize, Serialize};
use tierwise_catalog::{FormulaType, PriceTier, ProductPrices, TierValidationError};

/// Catalog product as far as pricing is concerned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub cost_price: f64,
    #[serde(default)]
    pub wholesale_price: f64,
    #[serde(default)]
    pub discount1_price: f64,
    #[serde(default)]
    pub discount2_price: f64,
    #[serde(default)]
    pub image_url: String,
}

impl Product {
    pub fn set_prices(&mut self, prices: ProductPrices) {
        self.wholesale_price = prices.wholesale_price;
        self.discount1_price = prices.discount1_price;
        self.discount2_price = prices.discount2_price;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub cart_item_id: u32,
    pub product_id: u32,
    pub product_name: String,
    #[serde(default)]
    pub variant_name: String,
    pub quantity: i64,
    pub cost_price: f64,

    /// Stored wholesale price, used when no tier resolves
    #[serde(default)]
    pub wholesale_price: f64,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: u32,
    pub user_id: String,
    pub items: Vec<CartLine>,
}

/// Partial update of a stored tier.
///
/// Absent fields keep their stored value, as do empty strings and an
/// `order_index` of zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierUpdate {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub formula_type: Option<FormulaType>,
    pub multiplier: Option<f64>,
    pub percentage: Option<f64>,
    pub flat_amount: Option<f64>,
    pub min_quantity: Option<i64>,
    pub order_index: Option<i32>,
    pub active: Option<bool>,
    pub description: Option<String>,
    pub is_default: Option<bool>,
    pub show_in_public: Option<bool>,
    pub color_code: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&String> {
    value.as_ref().filter(|s| !s.is_empty())
}

impl TierUpdate {
    pub fn validate(&self) -> Result<(), TierValidationError> {
        match &self.formula_type {
            Some(FormulaType::Other(tag)) if !tag.is_empty() => {
                Err(TierValidationError::UnknownFormula(tag.clone()))
            }
            _ => Ok(()),
        }
    }

    pub fn apply_to(&self, tier: &mut PriceTier) {
        if let Some(name) = non_empty(&self.name) {
            tier.name = name.clone();
        }
        if let Some(display_name) = non_empty(&self.display_name) {
            tier.display_name = display_name.clone();
        }
        if let Some(formula) = self.formula_type.as_ref().filter(|f| f.is_known()) {
            tier.formula_type = formula.clone();
        }
        if let Some(multiplier) = self.multiplier {
            tier.multiplier = multiplier;
        }
        if let Some(percentage) = self.percentage {
            tier.percentage = percentage;
        }
        if let Some(flat_amount) = self.flat_amount {
            tier.flat_amount = flat_amount;
        }
        if let Some(min_quantity) = self.min_quantity {
            tier.min_quantity = min_quantity;
        }
        if let Some(order_index) = self.order_index.filter(|i| *i > 0) {
            tier.order_index = order_index;
        }
        if let Some(active) = self.active {
            tier.active = active;
        }
        if let Some(description) = non_empty(&self.description) {
            tier.description = description.clone();
        }
        if let Some(is_default) = self.is_default {
            tier.is_default = is_default;
        }
        if let Some(show_in_public) = self.show_in_public {
            tier.show_in_public = show_in_public;
        }
        if let Some(color_code) = non_empty(&self.color_code) {
            tier.color_code = color_code.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierOrder {
    pub id: u32,
    pub order_index: i32,
}
