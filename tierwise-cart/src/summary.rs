use serde::{Deserialize, Serialize};
use tierwise_catalog::{next_tier, price_for_tier, resolve_applicable_tier, NextTier, PriceTier};
use tierwise_core::{Cart, CartLine};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemSummary {
    pub cart_item_id: u32,
    pub product_id: u32,
    pub product_name: String,
    pub variant_name: String,
    pub quantity: i64,
    pub cost_price: f64,
    pub unit_price: f64,
    pub subtotal: f64,
    pub image_url: String,
}

/// Priced view of a cart: every line priced at the tier the whole cart reaches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub cart_id: Option<u32>,
    pub total_quantity: i64,
    pub subtotal: f64,
    pub items: Vec<CartItemSummary>,
    pub tier: Option<PriceTier>,
    pub next_tier: Option<NextTier>,
    pub all_tiers: Vec<PriceTier>,
}

impl CartSummary {
    pub fn empty() -> Self {
        Self {
            cart_id: None,
            total_quantity: 0,
            subtotal: 0.0,
            items: Vec::new(),
            tier: None,
            next_tier: None,
            all_tiers: Vec::new(),
        }
    }

    pub fn tier_id(&self) -> Option<u32> {
        self.tier.as_ref().map(|t| t.id)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SummaryBuilder {
    /// Applied to the cost when no tier resolves and the line has no stored wholesale price
    fallback_multiplier: f64,
}

impl Default for SummaryBuilder {
    fn default() -> Self {
        Self { fallback_multiplier: 2.0 }
    }
}

impl SummaryBuilder {
    pub fn new(fallback_multiplier: f64) -> Self {
        Self { fallback_multiplier }
    }

    pub fn build(&self, cart: Option<&Cart>, tiers: &[PriceTier]) -> CartSummary {
        match cart {
            Some(cart) => {
                let mut summary = self.price_lines(&cart.items, tiers);
                summary.cart_id = Some(cart.id);
                summary
            }
            None => CartSummary::empty(),
        }
    }

    /// Prices loose lines, e.g. a guest cart that is not stored anywhere.
    pub fn price_lines(&self, lines: &[CartLine], tiers: &[PriceTier]) -> CartSummary {
        let total_quantity: i64 = lines.iter().map(|l| l.quantity).sum();
        let tier = resolve_applicable_tier(tiers, total_quantity);

        let items: Vec<CartItemSummary> = lines
            .iter()
            .map(|line| {
                let unit_price = match tier {
                    Some(t) => price_for_tier(line.cost_price, t),
                    None if line.wholesale_price != 0.0 => line.wholesale_price,
                    None => line.cost_price * self.fallback_multiplier,
                };
                CartItemSummary {
                    cart_item_id: line.cart_item_id,
                    product_id: line.product_id,
                    product_name: line.product_name.clone(),
                    variant_name: line.variant_name.clone(),
                    quantity: line.quantity,
                    cost_price: line.cost_price,
                    unit_price,
                    subtotal: unit_price * line.quantity as f64,
                    image_url: line.image_url.clone(),
                }
            })
            .collect();

        let mut all_tiers: Vec<PriceTier> = tiers.iter().filter(|t| t.active).cloned().collect();
        all_tiers.sort_by_key(|t| t.order_index);

        CartSummary {
            cart_id: None,
            total_quantity,
            subtotal: items.iter().map(|i| i.subtotal).sum(),
            items,
            tier: tier.cloned(),
            next_tier: next_tier(tiers, total_quantity),
            all_tiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierwise_catalog::FormulaType;

    fn wholesale_tiers() -> Vec<PriceTier> {
        vec![
            PriceTier {
                id: 1,
                name: "retail".to_string(),
                display_name: "Retail".to_string(),
                multiplier: 3.0,
                order_index: 3,
                is_default: true,
                ..Default::default()
            },
            PriceTier {
                id: 2,
                name: "discount1".to_string(),
                display_name: "Wholesale 6+".to_string(),
                multiplier: 2.5,
                min_quantity: 6,
                order_index: 2,
                ..Default::default()
            },
            PriceTier {
                id: 3,
                name: "discount2".to_string(),
                display_name: "Wholesale 12+".to_string(),
                formula_type: FormulaType::FlatAmount,
                flat_amount: 50.0,
                min_quantity: 12,
                order_index: 1,
                ..Default::default()
            },
        ]
    }

    fn line(product_id: u32, quantity: i64, cost_price: f64) -> CartLine {
        CartLine {
            cart_item_id: product_id,
            product_id,
            product_name: format!("Product {}", product_id),
            variant_name: String::new(),
            quantity,
            cost_price,
            wholesale_price: 0.0,
            image_url: String::new(),
        }
    }

    #[test]
    fn test_whole_cart_quantity_picks_the_tier() {
        let cart = Cart {
            id: 42,
            user_id: "u-1".to_string(),
            items: vec![line(1, 4, 100.0), line(2, 3, 40.0)],
        };

        let summary = SummaryBuilder::default().build(Some(&cart), &wholesale_tiers());
        assert_eq!(summary.cart_id, Some(42));
        assert_eq!(summary.total_quantity, 7);
        assert_eq!(summary.tier_id(), Some(2));
        assert_eq!(summary.items[0].unit_price, 250.0);
        assert_eq!(summary.items[1].subtotal, 300.0);
        assert_eq!(summary.subtotal, 1300.0);

        let next = summary.next_tier.unwrap();
        assert_eq!(next.display_name, "Wholesale 12+");
        assert_eq!(next.quantity_to_unlock, 5);
        assert_eq!(summary.all_tiers.iter().map(|t| t.id).collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn test_no_tier_falls_back_to_stored_price_then_multiplier() {
        let mut stored = line(1, 2, 100.0);
        stored.wholesale_price = 180.0;
        let lines = vec![stored, line(2, 1, 10.0)];

        let summary = SummaryBuilder::new(2.0).price_lines(&lines, &[]);
        assert!(summary.tier.is_none());
        assert_eq!(summary.items[0].unit_price, 180.0);
        assert_eq!(summary.items[1].unit_price, 20.0);
        assert_eq!(summary.subtotal, 380.0);
    }

    #[test]
    fn test_missing_cart_is_empty() {
        let summary = SummaryBuilder::default().build(None, &wholesale_tiers());
        assert_eq!(summary, CartSummary::empty());
    }
}
