//! # Domain Types
//!
//! Core domain types used throughout Caja POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  VoucherSeries  │   │      Sale       │   │  StoreProduct   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code "B001"    │   │  series_code    │   │  store_id       │       │
//! │  │  current_number │──►│  correlative    │   │  product_id     │       │
//! │  │  is_active      │   │  total_cents    │   │  stock          │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │ owns                ▲                 │
//! │                        ┌────────▼────────┐            │ references      │
//! │                        │   SaleDetail    │────────────┘                 │
//! │                        │  product, qty   │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: `(series_code, correlative)` for sales,
//!   the series `code` for numbering series
//!
//! Ownership: a Sale exclusively owns its SaleDetail rows (composition).
//! A VoucherSeries is referenced, not owned, by its Sales; a StoreProduct is
//! referenced, not owned, by SaleDetails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Voucher Type
// =============================================================================

/// A fiscal document category (e.g. receipt, invoice).
///
/// Identity is immutable once a series references it; voucher types can be
/// soft-disabled but never deleted while series exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct VoucherType {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name ("Boleta", "Factura", ...).
    pub name: String,

    /// Whether the voucher type is enabled (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Voucher Series
// =============================================================================

/// A numbering series under one voucher type.
///
/// ## Lifecycle
/// Created by an administrator. `current_number` advances only as a side
/// effect of successful sale recording or explicit manual correction; it is
/// never decremented automatically. At most one series per voucher type is
/// active at a time (enforced by the series activation routine, backed by a
/// partial unique index).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct VoucherSeries {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Voucher type this series numbers.
    pub voucher_type_id: String,

    /// Series code in the fiscal-authority pattern (e.g. "B001").
    pub code: String,

    /// Next correlative number to attempt. Monotonically non-decreasing;
    /// may trail reality after a manual correction, which the allocator
    /// tolerates by probing forward.
    pub current_number: i64,

    /// Fixed correlative width in decimal digits for this series.
    pub width: i64,

    /// Whether this is the active series for its voucher type.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Mode
// =============================================================================

/// Business-mode switch controlling oversell behavior.
///
/// This is external configuration read once per checkout and injected into
/// the stock decrement as a plain value - never a process-wide flag. In
/// either mode the persisted stock is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockMode {
    /// Reject the sale when requested quantity exceeds recorded stock.
    Strict,
    /// Permit overselling; the decrement clamps the stock at zero.
    /// Stock is informational in this mode, not a hard reservation.
    Free,
}

impl StockMode {
    /// Stable string form stored in the `settings` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            StockMode::Strict => "strict",
            StockMode::Free => "free",
        }
    }

    /// Parses the stored form; unknown values fall back to the default.
    pub fn parse(value: &str) -> StockMode {
        match value {
            "strict" => StockMode::Strict,
            _ => StockMode::Free,
        }
    }
}

impl Default for StockMode {
    fn default() -> Self {
        StockMode::Free
    }
}

// =============================================================================
// Store Product
// =============================================================================

/// The per-store stock ledger entry for a product.
///
/// Mutated by the checkout transaction (decrement) and, independently, by
/// inventory-receiving workflows. The checkout path guarantees `stock` never
/// goes below zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StoreProduct {
    pub id: String,
    pub store_id: String,
    pub product_id: String,
    pub buy_price_cents: i64,
    pub sell_price_cents: i64,
    pub tax_cents: i64,
    pub profit_cents: i64,
    /// On-hand units. Floor of zero enforced by the checkout decrement.
    pub stock: i64,
    /// Whether the product may be sold at this store.
    pub is_salable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoreProduct {
    /// Returns the sell price as Money.
    #[inline]
    pub fn sell_price(&self) -> Money {
        Money::from_cents(self.sell_price_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed fiscal voucher.
///
/// `(series_code, correlative)` is globally unique and, once written, never
/// reassigned or mutated. Created exactly once per successful checkout,
/// inside the sale-recording transaction; afterwards only the soft-delete
/// marker may change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub store_id: String,
    pub customer_id: String,
    pub voucher_type_id: String,
    pub payment_type_id: String,
    /// Cashier who recorded the sale.
    pub user_id: String,
    /// Series code of the voucher identifier (frozen).
    pub series_code: String,
    /// Zero-padded correlative of the voucher identifier (frozen).
    pub correlative: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub cash_received_cents: i64,
    pub change_cents: i64,
    /// Optional payment reference hash (card auth code, transfer id, ...).
    pub payment_reference: Option<String>,
    /// Soft-delete marker; never touched by the checkout path.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the human-facing voucher identifier, e.g. "B001-00000042".
    pub fn voucher_number(&self) -> String {
        format!("{}-{}", self.series_code, self.correlative)
    }

    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Detail
// =============================================================================

/// One line item of a sale.
///
/// Owned exclusively by its Sale; created only in the same transaction that
/// creates the Sale, never created, updated, or deleted independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleDetail {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Units sold (positive).
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Line total before tax (unit_price × quantity, frozen).
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleDetail {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Checkout Request
// =============================================================================

/// One line of a checkout request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub product_id: String,
    /// Units to sell (positive integer).
    pub quantity: i64,
    /// Unit price in cents (non-negative).
    pub unit_price_cents: i64,
}

impl CheckoutLine {
    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).times(self.quantity)
    }
}

/// A validated-upstream checkout request: everything the sale-recording
/// transaction needs for one customer checkout.
///
/// Monetary totals are computed by the caller (flat tax applied upstream);
/// the core only checks their signs. Line-item products must be pairwise
/// distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub store_id: String,
    pub customer_id: String,
    pub voucher_type_id: String,
    pub payment_type_id: String,
    pub user_id: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub cash_received_cents: i64,
    pub change_cents: i64,
    pub payment_reference: Option<String>,
    pub lines: Vec<CheckoutLine>,
}

// =============================================================================
// Unit Tests
// =============================================================================
