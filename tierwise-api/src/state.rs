use std::sync::Arc;
use tierwise_cart::{HubConfig, SummaryHub};
use tierwise_core::{CartRepository, ProductRepository, TierRepository};
use tierwise_store::seed::{default_tiers, demo_products};
use tierwise_store::{InMemoryCartRepository, InMemoryProductRepository, InMemoryTierRepository};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub tiers: Arc<dyn TierRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub hub: Arc<SummaryHub>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        tiers: Arc<dyn TierRepository>,
        products: Arc<dyn ProductRepository>,
        carts: Arc<dyn CartRepository>,
        auth: AuthConfig,
        hub_config: HubConfig,
    ) -> Self {
        let hub = Arc::new(SummaryHub::new(carts.clone(), tiers.clone(), hub_config));
        Self { tiers, products, carts, hub, auth }
    }

    /// Process-local stores seeded with the default tiers and a few products.
    pub fn in_memory(auth: AuthConfig, hub_config: HubConfig) -> Self {
        Self::new(
            Arc::new(InMemoryTierRepository::new(default_tiers())),
            Arc::new(InMemoryProductRepository::new(demo_products())),
            Arc::new(InMemoryCartRepository::new()),
            auth,
            hub_config,
        )
    }
}
