//! # Catalog Repository
//!
//! Master data and numbering-series administration: the routine writes that
//! surround the checkout transaction without participating in it.
//!
//! ## Series Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  insert_voucher_type("Boleta")                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  insert_series(vt, "B001", width 8)   ← created inactive               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  activate_series(series)              ← deactivates siblings in the    │
//! │       │                                 same transaction; exactly one  │
//! │       ▼                                 active series per voucher type │
//! │  checkouts allocate from it                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  set_series_number(series, n)         ← manual correction only; the   │
//! │                                         allocator probes past stale    │
//! │                                         values on the next checkout    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use caja_core::{StoreProduct, VoucherSeries, DEFAULT_CORRELATIVE_WIDTH};

/// Repository for master data and series administration.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Voucher types and series
    // =========================================================================

    /// Creates a voucher type. Returns its id.
    pub async fn insert_voucher_type(&self, name: &str) -> DbResult<String> {
        self.insert_named("voucher_types", name).await
    }

    /// Creates a numbering series for a voucher type, inactive, with the
    /// default correlative width. Returns its id.
    pub async fn insert_series(&self, voucher_type_id: &str, code: &str) -> DbResult<String> {
        self.insert_series_with_width(voucher_type_id, code, DEFAULT_CORRELATIVE_WIDTH)
            .await
    }

    /// Creates a numbering series with an explicit correlative width.
    pub async fn insert_series_with_width(
        &self,
        voucher_type_id: &str,
        code: &str,
        width: u32,
    ) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(voucher_type = %voucher_type_id, code = %code, "Creating series");

        sqlx::query(
            r#"
            INSERT INTO voucher_series (
                id, voucher_type_id, code, current_number, width, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, 1, ?4, 0, ?5, ?5)
            "#,
        )
        .bind(&id)
        .bind(voucher_type_id)
        .bind(code)
        .bind(width as i64)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Makes a series the single active one for its voucher type.
    ///
    /// Deactivates sibling series and activates the target inside one
    /// transaction, so "exactly one active series per voucher type" holds
    /// at every commit point (and the partial unique index never trips).
    pub async fn activate_series(&self, series_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let voucher_type_id: Option<String> =
            sqlx::query_scalar("SELECT voucher_type_id FROM voucher_series WHERE id = ?1")
                .bind(series_id)
                .fetch_optional(&mut *tx)
                .await?;

        let voucher_type_id = voucher_type_id
            .ok_or_else(|| DbError::not_found("VoucherSeries", series_id))?;

        let now = Utc::now();

        // Deactivate first; activating before the sibling drop would
        // violate the one-active partial index.
        sqlx::query(
            r#"
            UPDATE voucher_series
            SET is_active = 0, updated_at = ?2
            WHERE voucher_type_id = ?1 AND is_active = 1
            "#,
        )
        .bind(&voucher_type_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE voucher_series SET is_active = 1, updated_at = ?2 WHERE id = ?1")
            .bind(series_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(series = %series_id, "Series activated");
        Ok(())
    }

    /// Manually corrects a series counter.
    ///
    /// Administrative use only. Setting the counter behind already-issued
    /// vouchers is tolerated: the allocator probes forward past taken pairs
    /// on the next checkout.
    pub async fn set_series_number(&self, series_id: &str, number: i64) -> DbResult<()> {
        if number < 1 {
            return Err(DbError::QueryFailed(
                "series current_number must be >= 1".to_string(),
            ));
        }

        let result = sqlx::query(
            "UPDATE voucher_series SET current_number = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(series_id)
        .bind(number)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("VoucherSeries", series_id));
        }

        Ok(())
    }

    /// Gets a series by id.
    pub async fn get_series(&self, series_id: &str) -> DbResult<Option<VoucherSeries>> {
        let series: Option<VoucherSeries> = sqlx::query_as(
            r#"
            SELECT id, voucher_type_id, code, current_number, width, is_active,
                   created_at, updated_at
            FROM voucher_series
            WHERE id = ?1
            "#,
        )
        .bind(series_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(series)
    }

    // =========================================================================
    // Master data
    // =========================================================================

    /// Creates a store. Returns its id.
    pub async fn insert_store(&self, name: &str) -> DbResult<String> {
        self.insert_named("stores", name).await
    }

    /// Creates a customer. Returns its id.
    pub async fn insert_customer(&self, name: &str) -> DbResult<String> {
        self.insert_named("customers", name).await
    }

    /// Creates a user. Returns its id.
    pub async fn insert_user(&self, name: &str) -> DbResult<String> {
        self.insert_named("users", name).await
    }

    /// Creates a payment type. Returns its id.
    pub async fn insert_payment_type(&self, name: &str) -> DbResult<String> {
        self.insert_named("payment_types", name).await
    }

    /// Creates a product. Returns its id.
    pub async fn insert_product(&self, name: &str) -> DbResult<String> {
        self.insert_named("products", name).await
    }

    // Master-data tables share the (id, name, is_active, timestamps) shape.
    // The table name is always a compile-time constant, never caller input.
    async fn insert_named(&self, table: &'static str, name: &str) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let sql = format!(
            "INSERT INTO {} (id, name, is_active, created_at, updated_at) \
             VALUES (?1, ?2, 1, ?3, ?3)",
            table
        );

        sqlx::query(&sql)
            .bind(&id)
            .bind(name)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    // =========================================================================
    // Stock ledger administration
    // =========================================================================

    /// Creates a stock ledger row for a product at a store. Returns its id.
    pub async fn insert_store_product(
        &self,
        store_id: &str,
        product_id: &str,
        sell_price_cents: i64,
        stock: i64,
    ) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO store_products (
                id, store_id, product_id,
                buy_price_cents, sell_price_cents, tax_cents, profit_cents,
                stock, is_salable, created_at, updated_at
            ) VALUES (?1, ?2, ?3, 0, ?4, 0, 0, ?5, 1, ?6, ?6)
            "#,
        )
        .bind(&id)
        .bind(store_id)
        .bind(product_id)
        .bind(sell_price_cents)
        .bind(stock)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Gets the stock ledger row for a `(store, product)` pair.
    pub async fn get_store_product(
        &self,
        store_id: &str,
        product_id: &str,
    ) -> DbResult<Option<StoreProduct>> {
        let row: Option<StoreProduct> = sqlx::query_as(
            r#"
            SELECT id, store_id, product_id,
                   buy_price_cents, sell_price_cents, tax_cents, profit_cents,
                   stock, is_salable, created_at, updated_at
            FROM store_products
            WHERE store_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(store_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Receives inventory: adds `quantity` units to a stock ledger row.
    ///
    /// This is the receiving-workflow counterpart of the checkout decrement;
    /// it does not participate in the checkout transaction.
    pub async fn restock(
        &self,
        store_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE store_products
            SET stock = stock + ?3, updated_at = ?4
            WHERE store_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(store_id)
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StoreProduct", product_id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_activate_series_swaps_active_flag() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let vt = catalog.insert_voucher_type("Boleta").await.unwrap();
        let s1 = catalog.insert_series(&vt, "B001").await.unwrap();
        let s2 = catalog.insert_series(&vt, "B002").await.unwrap();

        catalog.activate_series(&s1).await.unwrap();
        assert!(catalog.get_series(&s1).await.unwrap().unwrap().is_active);

        catalog.activate_series(&s2).await.unwrap();
        assert!(!catalog.get_series(&s1).await.unwrap().unwrap().is_active);
        assert!(catalog.get_series(&s2).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_duplicate_series_code_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let vt = catalog.insert_voucher_type("Boleta").await.unwrap();
        catalog.insert_series(&vt, "B001").await.unwrap();

        let err = catalog.insert_series(&vt, "B001").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_set_series_number_validates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let vt = catalog.insert_voucher_type("Boleta").await.unwrap();
        let series = catalog.insert_series(&vt, "B001").await.unwrap();

        assert!(catalog.set_series_number(&series, 0).await.is_err());
        catalog.set_series_number(&series, 500).await.unwrap();

        let row = catalog.get_series(&series).await.unwrap().unwrap();
        assert_eq!(row.current_number, 500);
    }

    #[tokio::test]
    async fn test_restock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let store = catalog.insert_store("Main").await.unwrap();
        let product = catalog.insert_product("Cola 330ml").await.unwrap();
        catalog
            .insert_store_product(&store, &product, 250, 4)
            .await
            .unwrap();

        catalog.restock(&store, &product, 6).await.unwrap();

        let row = catalog
            .get_store_product(&store, &product)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.stock, 10);
    }
}
