use async_trait::async_trait;
use sqlx::PgPool;
use tierwise_catalog::{FormulaType, PriceTier};
use tierwise_core::{RepositoryError, RepositoryResult, TierOrder, TierRepository, TierUpdate};
use crate::database::storage_error;

pub struct PgTierRepository {
    pool: PgPool,
}

impl PgTierRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TierRow {
    id: i32,
    name: String,
    display_name: String,
    formula_type: String,
    multiplier: f64,
    percentage: f64,
    flat_amount: f64,
    min_quantity: i64,
    order_index: i32,
    active: bool,
    description: String,
    is_default: bool,
    show_in_public: bool,
    color_code: String,
}

impl From<TierRow> for PriceTier {
    fn from(row: TierRow) -> Self {
        PriceTier {
            id: row.id as u32,
            name: row.name,
            display_name: row.display_name,
            formula_type: FormulaType::from(row.formula_type),
            multiplier: row.multiplier,
            percentage: row.percentage,
            flat_amount: row.flat_amount,
            min_quantity: row.min_quantity,
            order_index: row.order_index,
            active: row.active,
            description: row.description,
            is_default: row.is_default,
            show_in_public: row.show_in_public,
            color_code: row.color_code,
        }
    }
}

const TIER_COLUMNS: &str = "id, name, display_name, formula_type, multiplier, percentage, flat_amount, \
     min_quantity, order_index, active, description, is_default, show_in_public, color_code";

impl PgTierRepository {
    async fn fetch(&self, id: u32) -> RepositoryResult<Option<PriceTier>> {
        let sql = format!(
            "SELECT {} FROM price_tiers WHERE id = $1 AND deleted_at IS NULL",
            TIER_COLUMNS
        );
        let row = sqlx::query_as::<_, TierRow>(&sql)
            .bind(id as i32)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(row.map(PriceTier::from))
    }
}

#[async_trait]
impl TierRepository for PgTierRepository {
    async fn list_tiers(&self, include_inactive: bool) -> RepositoryResult<Vec<PriceTier>> {
        let sql = format!(
            "SELECT {} FROM price_tiers WHERE deleted_at IS NULL AND (active OR $1) ORDER BY order_index ASC, id ASC",
            TIER_COLUMNS
        );
        let rows = sqlx::query_as::<_, TierRow>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(rows.into_iter().map(PriceTier::from).collect())
    }

    async fn get_tier(&self, id: u32) -> RepositoryResult<Option<PriceTier>> {
        self.fetch(id).await
    }

    async fn create_tier(&self, tier: PriceTier) -> RepositoryResult<PriceTier> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        if tier.is_default {
            sqlx::query("UPDATE price_tiers SET is_default = FALSE WHERE is_default")
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }

        let order_index = if tier.order_index == 0 {
            let (max,): (i32,) = sqlx::query_as(
                "SELECT COALESCE(MAX(order_index), 0) FROM price_tiers WHERE deleted_at IS NULL",
            )
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_error)?;
            max + 1
        } else {
            tier.order_index
        };

        let sql = format!(
            "INSERT INTO price_tiers (name, display_name, formula_type, multiplier, percentage, flat_amount, \
             min_quantity, order_index, active, description, is_default, show_in_public, color_code) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING {}",
            TIER_COLUMNS
        );
        let row = sqlx::query_as::<_, TierRow>(&sql)
            .bind(&tier.name)
            .bind(&tier.display_name)
            .bind(tier.formula_type.as_str())
            .bind(tier.multiplier)
            .bind(tier.percentage)
            .bind(tier.flat_amount)
            .bind(tier.min_quantity)
            .bind(order_index)
            .bind(tier.active)
            .bind(&tier.description)
            .bind(tier.is_default)
            .bind(tier.show_in_public)
            .bind(&tier.color_code)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(row.into())
    }

    async fn update_tier(&self, id: u32, update: &TierUpdate) -> RepositoryResult<PriceTier> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        // Row lock so concurrent edits apply one after the other
        let sql = format!(
            "SELECT {} FROM price_tiers WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            TIER_COLUMNS
        );
        let mut tier: PriceTier = sqlx::query_as::<_, TierRow>(&sql)
            .bind(id as i32)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error)?
            .map(PriceTier::from)
            .ok_or_else(|| RepositoryError::NotFound(format!("price tier {}", id)))?;

        if update.is_default == Some(true) && !tier.is_default {
            sqlx::query("UPDATE price_tiers SET is_default = FALSE WHERE id <> $1")
                .bind(id as i32)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }

        update.apply_to(&mut tier);

        sqlx::query(
            "UPDATE price_tiers SET name = $1, display_name = $2, formula_type = $3, multiplier = $4, \
             percentage = $5, flat_amount = $6, min_quantity = $7, order_index = $8, active = $9, \
             description = $10, is_default = $11, show_in_public = $12, color_code = $13, updated_at = NOW() \
             WHERE id = $14",
        )
        .bind(&tier.name)
        .bind(&tier.display_name)
        .bind(tier.formula_type.as_str())
        .bind(tier.multiplier)
        .bind(tier.percentage)
        .bind(tier.flat_amount)
        .bind(tier.min_quantity)
        .bind(tier.order_index)
        .bind(tier.active)
        .bind(&tier.description)
        .bind(tier.is_default)
        .bind(tier.show_in_public)
        .bind(&tier.color_code)
        .bind(id as i32)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(tier)
    }

    async fn delete_tier(&self, id: u32) -> RepositoryResult<()> {
        let tier = self
            .fetch(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("price tier {}", id)))?;

        if tier.is_default {
            return Err(RepositoryError::Rejected("the default price tier cannot be deleted".to_string()));
        }

        sqlx::query("UPDATE price_tiers SET deleted_at = NOW() WHERE id = $1")
            .bind(id as i32)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn reorder_tiers(&self, order: &[TierOrder]) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        for entry in order {
            sqlx::query("UPDATE price_tiers SET order_index = $1, updated_at = NOW() WHERE id = $2")
                .bind(entry.order_index)
                .bind(entry.id as i32)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }
        tx.commit().await.map_err(storage_error)?;
        Ok(())
    }
}
