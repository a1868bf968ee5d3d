//! # Stock Ledger Guard
//!
//! Bounded stock decrements for the checkout transaction.
//!
//! ## Decrement Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │           decrement(store, product, qty) under StockMode                │
//! │                                                                         │
//! │  Free mode (stock is informational):                                   │
//! │     new_stock = max(0, stock - qty)       ← overselling permitted,     │
//! │                                             floor clamped at zero      │
//! │                                                                         │
//! │  Strict mode (stock is a hard reservation):                            │
//! │     stock < qty  → InsufficientStock       ← sale rejected             │
//! │     stock >= qty → new_stock = stock - qty                             │
//! │                                                                         │
//! │  In BOTH modes the persisted stock is never negative.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The mode is an injected policy value read from configuration once per
//! checkout; this module holds no process-wide state.
//!
//! Like the allocator, this runs inside the caller's transaction and its
//! row lock is released only when that transaction commits or aborts. The
//! read-then-write (no blind `stock = stock - ?`) tolerates external manual
//! corrections between transactions.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use caja_core::validation::validate_quantity;
use caja_core::{CoreError, StockMode};

/// Decrements the stock of one `(store, product)` ledger row.
///
/// Runs inside the caller's transaction. Returns the new stock level.
///
/// ## Errors
/// - [`CoreError::ProductNotStocked`] - no ledger row for the pair
/// - [`CoreError::InsufficientStock`] - strict mode, stock < quantity
/// - `ValidationError::MustBePositive` - quantity <= 0 (caller bug)
pub async fn decrement(
    conn: &mut SqliteConnection,
    store_id: &str,
    product_id: &str,
    quantity: i64,
    mode: StockMode,
) -> DbResult<i64> {
    validate_quantity(quantity).map_err(CoreError::from)?;

    // Lock acquisition: write-before-read, same discipline as the series
    // allocator. 0 rows affected doubles as the existence check.
    let locked = sqlx::query(
        "UPDATE store_products SET stock = stock WHERE store_id = ?1 AND product_id = ?2",
    )
    .bind(store_id)
    .bind(product_id)
    .execute(&mut *conn)
    .await?;

    if locked.rows_affected() == 0 {
        return Err(CoreError::ProductNotStocked {
            store_id: store_id.to_string(),
            product_id: product_id.to_string(),
        }
        .into());
    }

    let stock: i64 = sqlx::query_scalar(
        "SELECT stock FROM store_products WHERE store_id = ?1 AND product_id = ?2",
    )
    .bind(store_id)
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;

    let new_stock = match mode {
        StockMode::Strict => {
            if stock < quantity {
                return Err(CoreError::InsufficientStock {
                    product_id: product_id.to_string(),
                    available: stock,
                    requested: quantity,
                }
                .into());
            }
            stock - quantity
        }
        // Stock floor: the clamp, not a rejection. Oversell relative to
        // recorded stock is permitted in this mode.
        StockMode::Free => (stock - quantity).max(0),
    };

    sqlx::query(
        r#"
        UPDATE store_products
        SET stock = ?3, updated_at = ?4
        WHERE store_id = ?1 AND product_id = ?2
        "#,
    )
    .bind(store_id)
    .bind(product_id)
    .bind(new_stock)
    .bind(chrono::Utc::now())
    .execute(&mut *conn)
    .await?;

    debug!(
        store = %store_id,
        product = %product_id,
        quantity,
        new_stock,
        "Decremented stock"
    );

    Ok(new_stock)
}
