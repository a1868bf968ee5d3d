//! # Sale Recorder
//!
//! The sale-recording transaction: one customer checkout, one atomic unit
//! of work.
//!
//! ## Checkout State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      record_sale(request, mode)                         │
//! │                                                                         │
//! │  validate (caja-core, before any I/O)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. BEGIN                                                               │
//! │  2. allocate voucher number     ── series row locked from here on      │
//! │  3. INSERT sale header          ── UNIQUE backstop → CorrelativeCollision│
//! │  4. INSERT sale details                                                │
//! │  5. decrement stock per line    ── ascending product id (lock order)   │
//! │  6. COMMIT ──────────────────────► Committed: Sale + details returned  │
//! │                                                                         │
//! │  Any error in 2-5 ──► Aborted: full rollback. The counter write, the   │
//! │  header, the details, every stock mutation - all of it is undone.      │
//! │  No partial state is ever visible outside the transaction.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lock Ordering
//! A single checkout may lock several stock rows. All acquisition follows
//! one global order - series lock first, then stock rows in ascending
//! product id - so two checkouts sharing more than one product can never
//! deadlock in a circular wait.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{series, stock};
use caja_core::validation::validate_checkout;
use caja_core::{CheckoutLine, CheckoutRequest, CoreError, Sale, SaleDetail, StockMode};

/// A successfully recorded sale, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSale {
    pub sale: Sale,
    pub details: Vec<SaleDetail>,
}

/// Repository for the checkout transaction and sale queries.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records one customer checkout as a single atomic transaction.
    ///
    /// See the module docs for the state machine. Per attempt the outcome is
    /// strictly two-state: Committed (a Sale with its details) or Aborted
    /// (an error, with no trace left in the store). Transient errors
    /// ([`DbError::is_transient`]) may be retried from scratch by the
    /// caller; the rollback guarantee makes retries idempotent.
    ///
    /// `mode` is the stock-mode switch read from configuration for this
    /// checkout (see [`SettingsRepository`](crate::SettingsRepository)).
    pub async fn record_sale(
        &self,
        request: &CheckoutRequest,
        mode: StockMode,
    ) -> DbResult<RecordedSale> {
        // Fails before any lock is taken or any row is touched.
        validate_checkout(request).map_err(CoreError::from)?;

        debug!(
            store = %request.store_id,
            voucher_type = %request.voucher_type_id,
            lines = request.lines.len(),
            "Recording sale"
        );

        // An early return anywhere below drops the transaction, which rolls
        // back everything including the allocator's counter write.
        let mut tx = self.pool.begin().await?;

        let allocation = series::allocate(&mut tx, &request.voucher_type_id).await?;

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            store_id: request.store_id.clone(),
            customer_id: request.customer_id.clone(),
            voucher_type_id: request.voucher_type_id.clone(),
            payment_type_id: request.payment_type_id.clone(),
            user_id: request.user_id.clone(),
            series_code: allocation.series_code.clone(),
            correlative: allocation.correlative.clone(),
            subtotal_cents: request.subtotal_cents,
            tax_cents: request.tax_cents,
            total_cents: request.total_cents,
            cash_received_cents: request.cash_received_cents,
            change_cents: request.change_cents,
            payment_reference: request.payment_reference.clone(),
            is_active: true,
            created_at: now,
        };

        let header = sqlx::query(
            r#"
            INSERT INTO sales (
                id, store_id, customer_id, voucher_type_id, payment_type_id,
                user_id, series_code, correlative,
                subtotal_cents, tax_cents, total_cents,
                cash_received_cents, change_cents,
                payment_reference, is_active, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13,
                ?14, ?15, ?16
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.store_id)
        .bind(&sale.customer_id)
        .bind(&sale.voucher_type_id)
        .bind(&sale.payment_type_id)
        .bind(&sale.user_id)
        .bind(&sale.series_code)
        .bind(&sale.correlative)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(sale.cash_received_cents)
        .bind(sale.change_cents)
        .bind(&sale.payment_reference)
        .bind(sale.is_active)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = header {
            return Err(translate_header_error(DbError::from(e), &allocation));
        }

        let mut details = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let detail = SaleDetail {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                line_total_cents: line.line_total().cents(),
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO sale_details (
                    id, sale_id, product_id, quantity,
                    unit_price_cents, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&detail.id)
            .bind(&detail.sale_id)
            .bind(&detail.product_id)
            .bind(detail.quantity)
            .bind(detail.unit_price_cents)
            .bind(detail.line_total_cents)
            .bind(detail.created_at)
            .execute(&mut *tx)
            .await?;

            details.push(detail);
        }

        // Stable lock order across concurrent multi-item checkouts.
        let mut lines: Vec<&CheckoutLine> = request.lines.iter().collect();
        lines.sort_by(|a, b| a.product_id.cmp(&b.product_id));

        for line in lines {
            stock::decrement(
                &mut tx,
                &request.store_id,
                &line.product_id,
                line.quantity,
                mode,
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            voucher = %sale.voucher_number(),
            total = sale.total_cents,
            "Sale recorded"
        );

        Ok(RecordedSale { sale, details })
    }

    /// Gets a sale by ID, with its details loaded.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<RecordedSale>> {
        let sale: Option<Sale> = sqlx::query_as(
            r#"
            SELECT id, store_id, customer_id, voucher_type_id, payment_type_id,
                   user_id, series_code, correlative,
                   subtotal_cents, tax_cents, total_cents,
                   cash_received_cents, change_cents,
                   payment_reference, is_active, created_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match sale {
            Some(sale) => {
                let details = self.get_details(&sale.id).await?;
                Ok(Some(RecordedSale { sale, details }))
            }
            None => Ok(None),
        }
    }

    /// Looks a sale up by its voucher identifier.
    pub async fn find_by_voucher(
        &self,
        series_code: &str,
        correlative: &str,
    ) -> DbResult<Option<Sale>> {
        let sale: Option<Sale> = sqlx::query_as(
            r#"
            SELECT id, store_id, customer_id, voucher_type_id, payment_type_id,
                   user_id, series_code, correlative,
                   subtotal_cents, tax_cents, total_cents,
                   cash_received_cents, change_cents,
                   payment_reference, is_active, created_at
            FROM sales
            WHERE series_code = ?1 AND correlative = ?2
            "#,
        )
        .bind(series_code)
        .bind(correlative)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all detail rows for a sale, in insertion order.
    ///
    /// All details of one sale share a timestamp and carry random ids, so
    /// `rowid` is the only column that reflects insertion order.
    pub async fn get_details(&self, sale_id: &str) -> DbResult<Vec<SaleDetail>> {
        let details: Vec<SaleDetail> = sqlx::query_as(
            r#"
            SELECT id, sale_id, product_id, quantity,
                   unit_price_cents, line_total_cents, created_at
            FROM sale_details
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    /// Soft-deletes a sale.
    ///
    /// The voucher identifier stays burned: the correlative is never
    /// reissued, and stock is NOT restored (returns are a separate
    /// inventory-receiving workflow).
    pub async fn void_sale(&self, sale_id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE sales SET is_active = 0 WHERE id = ?1 AND is_active = 1")
            .bind(sale_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        info!(sale_id = %sale_id, "Sale voided");
        Ok(())
    }

    /// Counts committed sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Translates a header-insert failure into its domain form.
///
/// The UNIQUE(series_code, correlative) backstop becomes
/// [`CoreError::CorrelativeCollision`] naming the colliding pair. It should
/// be unreachable while the series lock is held across the whole allocation;
/// seeing it means the lock discipline is broken, not that a retry would
/// help. Every other error passes through unchanged.
fn translate_header_error(err: DbError, allocation: &series::Allocation) -> DbError {
    if err.is_voucher_unique_violation() {
        return CoreError::CorrelativeCollision {
            series_code: allocation.series_code.clone(),
            correlative: allocation.correlative.clone(),
        }
        .into();
    }
    err
}

// =============================================================================
// Unit Tests
// =============================================================================
