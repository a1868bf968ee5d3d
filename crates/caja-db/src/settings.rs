//! # Settings Repository
//!
//! Key-value configuration storage. The only key the checkout path cares
//! about is `stock_mode`, the business-mode switch between rejecting
//! oversells and clamping stock at zero.
//!
//! The mode is read once per checkout and passed into the stock decrement as
//! a plain value - it is deliberately NOT cached in process state, so an
//! administrator flipping the switch takes effect on the next checkout.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use caja_core::StockMode;

/// Settings key for the stock-mode switch.
const STOCK_MODE_KEY: &str = "stock_mode";

/// Repository for configuration settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Reads the current stock mode.
    ///
    /// Missing or unrecognized values fall back to [`StockMode::Free`], the
    /// historical operating mode where stock is informational.
    pub async fn stock_mode(&self) -> DbResult<StockMode> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
                .bind(STOCK_MODE_KEY)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value
            .map(|v| StockMode::parse(&v))
            .unwrap_or_default())
    }

    /// Sets the stock mode.
    pub async fn set_stock_mode(&self, mode: StockMode) -> DbResult<()> {
        debug!(mode = mode.as_str(), "Setting stock mode");

        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?1, ?2)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(STOCK_MODE_KEY)
        .bind(mode.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
