use async_trait::async_trait;
use sqlx::PgPool;
use tierwise_catalog::ProductPrices;
use tierwise_core::{Product, ProductRepository, RepositoryError, RepositoryResult};
use crate::database::storage_error;

pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    cost_price: f64,
    wholesale_price: f64,
    discount1_price: f64,
    discount2_price: f64,
    image_url: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id as u32,
            name: row.name,
            cost_price: row.cost_price,
            wholesale_price: row.wholesale_price,
            discount1_price: row.discount1_price,
            discount2_price: row.discount2_price,
            image_url: row.image_url,
        }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list_products(&self) -> RepositoryResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, cost_price, wholesale_price, discount1_price, discount2_price, image_url \
             FROM products WHERE deleted_at IS NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_product(&self, id: u32) -> RepositoryResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, cost_price, wholesale_price, discount1_price, discount2_price, image_url \
             FROM products WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(row.map(Product::from))
    }

    async fn update_prices(&self, id: u32, prices: ProductPrices) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE products SET wholesale_price = $1, discount1_price = $2, discount2_price = $3 \
             WHERE id = $4 AND deleted_at IS NULL",
        )
        .bind(prices.wholesale_price)
        .bind(prices.discount1_price)
        .bind(prices.discount2_price)
        .bind(id as i32)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("product {}", id)));
        }
        Ok(())
    }
}
