use async_trait::async_trait;
use sqlx::PgPool;
use tierwise_core::{Cart, CartLine, CartRepository, Product, RepositoryError, RepositoryResult};
use crate::database::storage_error;

pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Lines are joined with the live product row so cost changes show up immediately
#[derive(sqlx::FromRow)]
struct LineRow {
    id: i32,
    product_id: i32,
    product_name: String,
    variant_name: String,
    quantity: i64,
    cost_price: f64,
    wholesale_price: f64,
    image_url: String,
}

impl From<LineRow> for CartLine {
    fn from(row: LineRow) -> Self {
        CartLine {
            cart_item_id: row.id as u32,
            product_id: row.product_id as u32,
            product_name: row.product_name,
            variant_name: row.variant_name,
            quantity: row.quantity,
            cost_price: row.cost_price,
            wholesale_price: row.wholesale_price,
            image_url: row.image_url,
        }
    }
}

impl PgCartRepository {
    async fn cart_id(&self, user_id: &str) -> RepositoryResult<Option<i32>> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(row.map(|(id,)| id))
    }

    async fn require_cart(&self, user_id: &str) -> RepositoryResult<i32> {
        self.cart_id(user_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("cart of {}", user_id)))
    }

    async fn load(&self, cart_id: i32, user_id: &str) -> RepositoryResult<Cart> {
        let lines = sqlx::query_as::<_, LineRow>(
            "SELECT ci.id, ci.product_id, p.name AS product_name, ci.variant_name, ci.quantity, \
             p.cost_price, p.wholesale_price, p.image_url \
             FROM cart_items ci JOIN products p ON p.id = ci.product_id \
             WHERE ci.cart_id = $1 ORDER BY ci.id",
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(Cart {
            id: cart_id as u32,
            user_id: user_id.to_string(),
            items: lines.into_iter().map(CartLine::from).collect(),
        })
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn get_cart(&self, user_id: &str) -> RepositoryResult<Option<Cart>> {
        match self.cart_id(user_id).await? {
            Some(cart_id) => Ok(Some(self.load(cart_id, user_id).await?)),
            None => Ok(None),
        }
    }

    async fn add_item(&self, user_id: &str, product: &Product, quantity: i64) -> RepositoryResult<Cart> {
        let (cart_id,): (i32,) = sqlx::query_as(
            "INSERT INTO carts (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id RETURNING id",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3) \
             ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity",
        )
        .bind(cart_id)
        .bind(product.id as i32)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND quantity <= 0")
            .bind(cart_id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        self.load(cart_id, user_id).await
    }

    async fn set_quantity(&self, user_id: &str, product_id: u32, quantity: i64) -> RepositoryResult<Cart> {
        let cart_id = self.require_cart(user_id).await?;

        let result = if quantity <= 0 {
            sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
                .bind(cart_id)
                .bind(product_id as i32)
                .execute(&self.pool)
                .await
        } else {
            sqlx::query("UPDATE cart_items SET quantity = $3 WHERE cart_id = $1 AND product_id = $2")
                .bind(cart_id)
                .bind(product_id as i32)
                .bind(quantity)
                .execute(&self.pool)
                .await
        }
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("product {} in cart", product_id)));
        }
        self.load(cart_id, user_id).await
    }

    async fn remove_item(&self, user_id: &str, product_id: u32) -> RepositoryResult<Cart> {
        self.set_quantity(user_id, product_id, 0).await
    }
}
