use tierwise_catalog::{FormulaType, PriceTier};
use tierwise_core::Product;

/// Tier set installed on a fresh store; mirrors the first migration.
pub fn default_tiers() -> Vec<PriceTier> {
    vec![
        PriceTier {
            id: 1,
            name: "wholesale".to_string(),
            display_name: "Wholesale".to_string(),
            formula_type: FormulaType::Multiplier,
            multiplier: 2.5,
            min_quantity: 0,
            order_index: 3,
            is_default: true,
            description: "Base price for any quantity".to_string(),
            color_code: "#6b7280".to_string(),
            ..Default::default()
        },
        PriceTier {
            id: 2,
            name: "discount1".to_string(),
            display_name: "Wholesale 6+".to_string(),
            formula_type: FormulaType::Multiplier,
            multiplier: 2.25,
            min_quantity: 6,
            order_index: 2,
            description: "Six or more items in the cart".to_string(),
            color_code: "#2563eb".to_string(),
            ..Default::default()
        },
        PriceTier {
            id: 3,
            name: "discount2".to_string(),
            display_name: "Wholesale 12+".to_string(),
            formula_type: FormulaType::Multiplier,
            multiplier: 1.75,
            min_quantity: 12,
            order_index: 1,
            description: "Twelve or more items in the cart".to_string(),
            color_code: "#16a34a".to_string(),
            ..Default::default()
        },
    ]
}

pub fn demo_products() -> Vec<Product> {
    [(1, "Linen shirt", 4000.0), (2, "Denim jacket", 12000.0), (3, "Cotton tee", 1800.0)]
        .into_iter()
        .map(|(id, name, cost_price)| {
            let mut product = Product {
                id,
                name: name.to_string(),
                cost_price,
                wholesale_price: 0.0,
                discount1_price: 0.0,
                discount2_price: 0.0,
                image_url: String::new(),
            };
            product.set_prices(tierwise_catalog::product_prices(cost_price, &default_tiers()));
            product
        })
        .collect()
}
