use async_trait::async_trait;
use tierwise_catalog::{PriceTier, ProductPrices};
use crate::models::{Cart, Product, TierOrder, TierUpdate};
use crate::RepositoryResult;

/// Repository trait for price tier definitions
#[async_trait]
pub trait TierRepository: Send + Sync {
    /// Tiers ordered by `order_index`; inactive ones only when asked for.
    async fn list_tiers(&self, include_inactive: bool) -> RepositoryResult<Vec<PriceTier>>;

    async fn get_tier(&self, id: u32) -> RepositoryResult<Option<PriceTier>>;

    /// Stores a new tier. An `order_index` of zero is replaced by the next free
    /// index, and a default tier clears the flag on every other tier.
    async fn create_tier(&self, tier: PriceTier) -> RepositoryResult<PriceTier>;

    async fn update_tier(&self, id: u32, update: &TierUpdate) -> RepositoryResult<PriceTier>;

    /// Fails with `Rejected` for the default tier.
    async fn delete_tier(&self, id: u32) -> RepositoryResult<()>;

    async fn reorder_tiers(&self, order: &[TierOrder]) -> RepositoryResult<()>;
}

/// Repository trait for product catalog access
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list_products(&self) -> RepositoryResult<Vec<Product>>;

    async fn get_product(&self, id: u32) -> RepositoryResult<Option<Product>>;

    async fn update_prices(&self, id: u32, prices: ProductPrices) -> RepositoryResult<()>;
}

/// Repository trait for the active cart of each user
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn get_cart(&self, user_id: &str) -> RepositoryResult<Option<Cart>>;

    /// Adds `quantity` units of a product, creating the cart when needed.
    async fn add_item(&self, user_id: &str, product: &Product, quantity: i64) -> RepositoryResult<Cart>;

    /// Sets the quantity of a line; zero or less removes it.
    async fn set_quantity(&self, user_id: &str, product_id: u32, quantity: i64) -> RepositoryResult<Cart>;

    async fn remove_item(&self, user_id: &str, product_id: u32) -> RepositoryResult<Cart>;
}
