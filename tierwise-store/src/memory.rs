use std::collections::{BTreeMap, HashMap};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tierwise_catalog::{PriceTier, ProductPrices};
use tierwise_core::{
    Cart, CartLine, CartRepository, Product, ProductRepository, RepositoryError, RepositoryResult,
    TierOrder, TierRepository, TierUpdate,
};

// ============================================================================
// Price tiers
// ============================================================================

struct TierTable {
    tiers: Vec<PriceTier>,
    next_id: u32,
}

pub struct InMemoryTierRepository {
    table: RwLock<TierTable>,
}

impl InMemoryTierRepository {
    pub fn new(tiers: Vec<PriceTier>) -> Self {
        let next_id = tiers.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        Self {
            table: RwLock::new(TierTable { tiers, next_id }),
        }
    }
}

impl Default for InMemoryTierRepository {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn clear_default_except(tiers: &mut [PriceTier], keep: u32) {
    for tier in tiers.iter_mut().filter(|t| t.id != keep) {
        tier.is_default = false;
    }
}

#[async_trait]
impl TierRepository for InMemoryTierRepository {
    async fn list_tiers(&self, include_inactive: bool) -> RepositoryResult<Vec<PriceTier>> {
        let table = self.table.read().await;
        let mut tiers: Vec<PriceTier> = table
            .tiers
            .iter()
            .filter(|t| include_inactive || t.active)
            .cloned()
            .collect();
        tiers.sort_by_key(|t| t.order_index);
        Ok(tiers)
    }

    async fn get_tier(&self, id: u32) -> RepositoryResult<Option<PriceTier>> {
        let table = self.table.read().await;
        Ok(table.tiers.iter().find(|t| t.id == id).cloned())
    }

    async fn create_tier(&self, mut tier: PriceTier) -> RepositoryResult<PriceTier> {
        let mut table = self.table.write().await;

        tier.id = table.next_id;
        table.next_id += 1;

        if tier.order_index == 0 {
            tier.order_index = table.tiers.iter().map(|t| t.order_index).max().unwrap_or(0) + 1;
        }
        if tier.is_default {
            clear_default_except(&mut table.tiers, tier.id);
        }

        table.tiers.push(tier.clone());
        Ok(tier)
    }

    async fn update_tier(&self, id: u32, update: &TierUpdate) -> RepositoryResult<PriceTier> {
        let mut table = self.table.write().await;

        let pos = table
            .tiers
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("price tier {}", id)))?;

        if update.is_default == Some(true) && !table.tiers[pos].is_default {
            clear_default_except(&mut table.tiers, id);
        }

        let tier = &mut table.tiers[pos];
        update.apply_to(tier);
        Ok(tier.clone())
    }

    async fn delete_tier(&self, id: u32) -> RepositoryResult<()> {
        let mut table = self.table.write().await;

        let pos = table
            .tiers
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("price tier {}", id)))?;

        if table.tiers[pos].is_default {
            return Err(RepositoryError::Rejected("the default price tier cannot be deleted".to_string()));
        }

        table.tiers.remove(pos);
        Ok(())
    }

    async fn reorder_tiers(&self, order: &[TierOrder]) -> RepositoryResult<()> {
        let mut table = self.table.write().await;
        for entry in order {
            // Unknown ids are skipped
            if let Some(tier) = table.tiers.iter_mut().find(|t| t.id == entry.id) {
                tier.order_index = entry.order_index;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Products
// ============================================================================

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<BTreeMap<u32, Product>>,
}

impl InMemoryProductRepository {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products.into_iter().map(|p| (p.id, p)).collect()),
        }
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list_products(&self) -> RepositoryResult<Vec<Product>> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn get_product(&self, id: u32) -> RepositoryResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn update_prices(&self, id: u32, prices: ProductPrices) -> RepositoryResult<()> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("product {}", id)))?;
        product.set_prices(prices);
        Ok(())
    }
}

// ============================================================================
// Carts
// ============================================================================

#[derive(Default)]
struct CartTable {
    carts: HashMap<String, Cart>,
    next_cart_id: u32,
    next_item_id: u32,
}

#[derive(Default)]
pub struct InMemoryCartRepository {
    table: RwLock<CartTable>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cart_of<'a>(carts: &'a mut HashMap<String, Cart>, user_id: &str) -> RepositoryResult<&'a mut Cart> {
    carts
        .get_mut(user_id)
        .ok_or_else(|| RepositoryError::NotFound(format!("cart of {}", user_id)))
}

fn line_position(cart: &Cart, product_id: u32) -> RepositoryResult<usize> {
    cart.items
        .iter()
        .position(|l| l.product_id == product_id)
        .ok_or_else(|| RepositoryError::NotFound(format!("product {} in cart", product_id)))
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn get_cart(&self, user_id: &str) -> RepositoryResult<Option<Cart>> {
        Ok(self.table.read().await.carts.get(user_id).cloned())
    }

    async fn add_item(&self, user_id: &str, product: &Product, quantity: i64) -> RepositoryResult<Cart> {
        let mut guard = self.table.write().await;
        let table = &mut *guard;

        if !table.carts.contains_key(user_id) {
            table.next_cart_id += 1;
            table.carts.insert(
                user_id.to_string(),
                Cart { id: table.next_cart_id, user_id: user_id.to_string(), items: Vec::new() },
            );
        }
        let cart = cart_of(&mut table.carts, user_id)?;

        match cart.items.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => line.quantity += quantity,
            None => {
                table.next_item_id += 1;
                cart.items.push(CartLine {
                    cart_item_id: table.next_item_id,
                    product_id: product.id,
                    product_name: product.name.clone(),
                    variant_name: String::new(),
                    quantity,
                    cost_price: product.cost_price,
                    wholesale_price: product.wholesale_price,
                    image_url: product.image_url.clone(),
                });
            }
        }
        cart.items.retain(|l| l.quantity > 0);

        Ok(cart.clone())
    }

    async fn set_quantity(&self, user_id: &str, product_id: u32, quantity: i64) -> RepositoryResult<Cart> {
        let mut table = self.table.write().await;
        let cart = cart_of(&mut table.carts, user_id)?;
        let pos = line_position(cart, product_id)?;

        if quantity <= 0 {
            cart.items.remove(pos);
        } else {
            cart.items[pos].quantity = quantity;
        }
        Ok(cart.clone())
    }

    async fn remove_item(&self, user_id: &str, product_id: u32) -> RepositoryResult<Cart> {
        let mut table = self.table.write().await;
        let cart = cart_of(&mut table.carts, user_id)?;
        let pos = line_position(cart, product_id)?;
        cart.items.remove(pos);
        Ok(cart.clone())
    }
}
