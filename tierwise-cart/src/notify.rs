use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use tierwise_catalog::format_price;
use tierwise_shared::models::events::{NotificationKind, PriceNotification};
use crate::summary::CartSummary;

/// What was last shown to a user, used to drop repeats
#[derive(Debug, Clone, PartialEq)]
pub struct LastNotification {
    pub kind: NotificationKind,
    pub tier_id: Option<u32>,
    pub at: DateTime<Utc>,
}

/// Decides which pricing message, if any, a cart change deserves.
#[derive(Debug, Clone, Copy)]
pub struct NotificationPolicy {
    dedup_window: Duration,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self { dedup_window: Duration::milliseconds(3000) }
    }
}

struct Candidate {
    kind: NotificationKind,
    tier_id: Option<u32>,
    tier_name: String,
    message: String,
    savings: Option<f64>,
    items_needed: Option<i64>,
}

impl NotificationPolicy {
    pub fn new(dedup_window: Duration) -> Self {
        Self { dedup_window }
    }

    /// A repeat is the same kind for the same tier within the window.
    pub fn should_emit(
        &self,
        last: Option<&LastNotification>,
        kind: NotificationKind,
        tier_id: Option<u32>,
        now: DateTime<Utc>,
    ) -> bool {
        match last {
            None => true,
            Some(last) => {
                last.kind != kind || last.tier_id != tier_id || now - last.at > self.dedup_window
            }
        }
    }

    /// Compares two consecutive summaries of the same cart.
    ///
    /// Only the first matching rule is considered: unlocking a tier, losing a
    /// tier, being one unit short of the next tier after adding items, and
    /// sitting exactly on the current threshold after removing items.
    pub fn evaluate(
        &self,
        previous: &CartSummary,
        current: &CartSummary,
        last: Option<&LastNotification>,
        now: DateTime<Utc>,
    ) -> Option<PriceNotification> {
        let candidate = Self::candidate(previous, current)?;

        if !self.should_emit(last, candidate.kind, candidate.tier_id, now) {
            tracing::debug!(kind = candidate.kind.as_str(), "suppressed repeated price notification");
            return None;
        }

        Some(PriceNotification {
            id: Uuid::new_v4(),
            kind: candidate.kind,
            message: candidate.message,
            tier_id: candidate.tier_id,
            tier_name: candidate.tier_name,
            savings: candidate.savings,
            items_needed: candidate.items_needed,
            timestamp: now.timestamp_millis(),
        })
    }

    fn candidate(previous: &CartSummary, current: &CartSummary) -> Option<Candidate> {
        let prev_tier = previous.tier.as_ref();
        let curr_tier = current.tier.as_ref();

        if let (Some(prev), Some(curr)) = (prev_tier, curr_tier) {
            if curr.id != prev.id && curr.min_quantity > prev.min_quantity {
                let savings = (previous.subtotal - current.subtotal > 0.0)
                    .then(|| previous.subtotal - current.subtotal);
                let message = match savings {
                    Some(amount) => format!(
                        "You now have {}! You are saving {} on this cart.",
                        curr.display_name,
                        format_price(amount)
                    ),
                    None => format!(
                        "You now have {}! Every product in your cart got a better price.",
                        curr.display_name
                    ),
                };
                return Some(Candidate {
                    kind: NotificationKind::TierUnlocked,
                    tier_id: Some(curr.id),
                    tier_name: curr.display_name.clone(),
                    message,
                    savings,
                    items_needed: None,
                });
            }
            if curr.id != prev.id && curr.min_quantity < prev.min_quantity {
                return Some(Candidate {
                    kind: NotificationKind::TierLost,
                    tier_id: Some(curr.id),
                    tier_name: curr.display_name.clone(),
                    message: format!("You are back to {}. Prices have changed.", curr.display_name),
                    savings: None,
                    items_needed: None,
                });
            }
        }

        if let Some(next) = current.next_tier.as_ref().filter(|n| n.quantity_to_unlock == 1) {
            if current.total_quantity > previous.total_quantity {
                return Some(Candidate {
                    kind: NotificationKind::NearTier,
                    tier_id: current.tier_id(),
                    tier_name: next.display_name.clone(),
                    message: format!("Add 1 more item to get {}!", next.display_name),
                    savings: None,
                    items_needed: Some(1),
                });
            }
            return None;
        }

        match (prev_tier, curr_tier) {
            (Some(prev), Some(curr))
                if curr.id == prev.id
                    && current.total_quantity == curr.min_quantity
                    && current.total_quantity < previous.total_quantity =>
            {
                Some(Candidate {
                    kind: NotificationKind::NearTierLoss,
                    tier_id: Some(curr.id),
                    tier_name: curr.display_name.clone(),
                    message: format!(
                        "Careful! Removing one more item will lose {}.",
                        curr.display_name
                    ),
                    savings: None,
                    items_needed: None,
                })
            }
            _ => None,
        }
    }
}
