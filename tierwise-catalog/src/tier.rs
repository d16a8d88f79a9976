use serde::{Deserialize, Serialize};
use std::fmt;

/// How a tier derives a sale price from a cost price.
///
/// Tags outside the known set are kept verbatim in `Other` so that records
/// written by older tooling still load; pricing treats them as identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FormulaType {
    Multiplier,
    PercentageMarkup,
    FlatAmount,
    Other(String),
}

impl FormulaType {
    pub fn as_str(&self) -> &str {
        match self {
            FormulaType::Multiplier => "multiplier",
            FormulaType::PercentageMarkup => "percentage_markup",
            FormulaType::FlatAmount => "flat_amount",
            FormulaType::Other(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FormulaType::Other(_))
    }
}

impl From<String> for FormulaType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "multiplier" => FormulaType::Multiplier,
            "percentage_markup" => FormulaType::PercentageMarkup,
            "flat_amount" => FormulaType::FlatAmount,
            _ => FormulaType::Other(tag),
        }
    }
}

impl From<&str> for FormulaType {
    fn from(tag: &str) -> Self {
        FormulaType::from(tag.to_string())
    }
}

impl From<FormulaType> for String {
    fn from(formula: FormulaType) -> Self {
        match formula {
            FormulaType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FormulaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named pricing rule that becomes eligible once an order reaches `min_quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,

    /// Left empty when absent so that `validate` reports it
    #[serde(default = "missing_formula")]
    pub formula_type: FormulaType,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub flat_amount: f64,
    #[serde(default)]
    pub min_quantity: i64,

    /// Lower value wins among eligible tiers
    #[serde(default)]
    pub order_index: i32,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub description: String,

    /// Fallback when no tier meets its quantity threshold
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub show_in_public: bool,
    #[serde(default)]
    pub color_code: String,
}

fn missing_formula() -> FormulaType { FormulaType::Other(String::new()) }

fn default_multiplier() -> f64 { 1.0 }

fn default_true() -> bool { true }

impl Default for PriceTier {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            display_name: String::new(),
            formula_type: FormulaType::Multiplier,
            multiplier: 1.0,
            percentage: 0.0,
            flat_amount: 0.0,
            min_quantity: 0,
            order_index: 0,
            active: true,
            description: String::new(),
            is_default: false,
            show_in_public: true,
            color_code: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TierValidationError {
    #[error("name and display_name are required")]
    MissingName,

    #[error("formula_type is required")]
    MissingFormula,

    #[error("formula_type must be 'multiplier', 'percentage_markup' or 'flat_amount', got '{0}'")]
    UnknownFormula(String),
}

impl PriceTier {
    /// Checks a tier submitted for creation.
    pub fn validate(&self) -> Result<(), TierValidationError> {
        if self.name.trim().is_empty() || self.display_name.trim().is_empty() {
            return Err(TierValidationError::MissingName);
        }
        match &self.formula_type {
            FormulaType::Other(tag) if tag.is_empty() => return Err(TierValidationError::MissingFormula),
            FormulaType::Other(tag) => return Err(TierValidationError::UnknownFormula(tag.clone())),
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_formula_survives_serde() {
        let tier: PriceTier = serde_json::from_value(serde_json::json!({
            "id": 9,
            "name": "legacy",
            "display_name": "Legacy",
            "formula_type": "bogus",
        }))
        .unwrap();

        assert_eq!(tier.formula_type, FormulaType::Other("bogus".to_string()));
        assert_eq!(serde_json::to_value(&tier).unwrap()["formula_type"], "bogus");
    }

    #[test]
    fn test_missing_fields_take_model_defaults() {
        let tier: PriceTier = serde_json::from_value(serde_json::json!({
            "formula_type": "percentage_markup",
            "percentage": 20.0,
        }))
        .unwrap();

        assert_eq!(tier.formula_type, FormulaType::PercentageMarkup);
        assert_eq!(tier.multiplier, 1.0);
        assert!(tier.active);
        assert!(tier.show_in_public);
        assert!(!tier.is_default);
        assert_eq!(tier.min_quantity, 0);
    }

    #[test]
    fn test_absent_formula_is_reported_by_validate() {
        let tier: PriceTier = serde_json::from_value(serde_json::json!({
            "name": "bulk",
            "display_name": "Bulk",
        }))
        .unwrap();

        assert_eq!(tier.formula_type, FormulaType::Other(String::new()));
        assert_eq!(tier.validate(), Err(TierValidationError::MissingFormula));
    }

    #[test]
    fn test_validate() {
        let tier = PriceTier {
            name: "wholesale".to_string(),
            display_name: "Wholesale".to_string(),
            ..Default::default()
        };
        assert!(tier.validate().is_ok());

        let unnamed = PriceTier { display_name: "X".to_string(), ..Default::default() };
        assert_eq!(unnamed.validate(), Err(TierValidationError::MissingName));

        let bogus = PriceTier {
            formula_type: FormulaType::from("bogus"),
            ..tier
        };
        assert_eq!(
            bogus.validate(),
            Err(TierValidationError::UnknownFormula("bogus".to_string()))
        );
    }
}
