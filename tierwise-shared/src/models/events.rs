use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TierUnlocked,
    TierLost,
    NearTier,
    NearTierLoss,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TierUnlocked => "tier_unlocked",
            NotificationKind::TierLost => "tier_lost",
            NotificationKind::NearTier => "near_tier",
            NotificationKind::NearTierLoss => "near_tier_loss",
        }
    }
}

/// A pricing message for the customer, raised when a cart moves between tiers.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct PriceNotification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    /// Tier the de-duplication key is built from (the current tier, if any)
    pub tier_id: Option<u32>,
    pub tier_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_needed: Option<i64>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct CartNotification {
    pub user_id: String,
    pub notification: PriceNotification,
}
