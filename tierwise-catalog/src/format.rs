use crate::tier::{FormulaType, PriceTier};

/// Formats an amount in Argentine pesos, e.g. `$ 1.234,56`.
pub fn format_price(price: f64) -> String {
    let cents = (price.abs() * 100.0).round() as u64;
    let units = (cents / 100).to_string();

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if price < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}$ {},{:02}", sign, grouped, cents % 100)
}

/// Human readable form of a tier formula for the admin screens.
pub fn formula_description(tier: &PriceTier) -> String {
    match &tier.formula_type {
        FormulaType::Multiplier => format!("Cost × {}", tier.multiplier),
        FormulaType::PercentageMarkup => format!("Cost + {}%", tier.percentage),
        FormulaType::FlatAmount => format!("Cost + ${}", tier.flat_amount),
        FormulaType::Other(_) => "Unknown formula".to_string(),
    }
}
