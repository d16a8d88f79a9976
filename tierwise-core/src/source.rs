use tierwise_catalog::PriceTier;
use crate::repository::TierRepository;

/// Loads the active tier snapshot for one pricing pass.
///
/// A failing store prices as if no tiers were configured; the resolver
/// already handles an empty set.
pub async fn active_tiers_or_empty(repo: &dyn TierRepository) -> Vec<PriceTier> {
    match repo.list_tiers(false).await {
        Ok(tiers) => tiers,
        Err(e) => {
            tracing::error!("Failed to load price tiers, pricing at cost: {}", e);
            Vec::new()
        }
    }
}
