//! # Error Types
//!
//! Domain-specific error types for caja-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  caja-core errors (this file)                                          │
//! │  ├── CoreError        - Checkout/business errors                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  caja-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures (wraps CoreError)  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller boundary         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Taxonomy
//! - Configuration errors (`NoActiveSeries`, `CorrelativeOverflow`): fatal to
//!   the attempt, not retryable without administrative action.
//! - Business-rule errors (`ProductNotStocked`, `InsufficientStock`): fatal
//!   as submitted; retryable only after the caller corrects the request.
//! - Consistency-defense errors (`CorrelativeCollision`): should be
//!   unreachable given the allocator's locking discipline; observing one
//!   means a lock-discipline bug, surfaced as-is rather than retried.
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (series code, product id, etc.)
//! 3. Errors are enum variants, never String
//! 4. Every error aborts the whole checkout; there is no partial success

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Checkout and voucher-numbering errors.
///
/// These errors represent business rule violations or fiscal numbering
/// failures. They abort the sale-recording transaction that raised them.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No active numbering series exists for the requested voucher type.
    ///
    /// ## When This Occurs
    /// - The administrator never created a series for this voucher type
    /// - All series for the voucher type were deactivated
    ///
    /// Fatal to the checkout; an administrator must activate a series.
    #[error("No active series for voucher type {voucher_type_id}")]
    NoActiveSeries { voucher_type_id: String },

    /// The series' numeric range (or the allocator's probe budget) is
    /// exhausted.
    ///
    /// ## When This Occurs
    /// - `current_number` grew past `10^width - 1`
    /// - The collision probe walked more steps than its cap allows
    ///
    /// Fatal; requires administrative intervention (open a new series).
    #[error("Correlative {number} does not fit width {width}; series range exhausted")]
    CorrelativeOverflow { number: i64, width: u32 },

    /// The store has no stock ledger row for a sold product.
    ///
    /// ## When This Occurs
    /// - The product was never assigned to this store
    /// - The store-product row was removed while the sale was being built
    #[error("Product {product_id} is not stocked in store {store_id}")]
    ProductNotStocked {
        store_id: String,
        product_id: String,
    },

    /// Strict stock mode rejected an oversell.
    ///
    /// Only raised when the injected [`StockMode`](crate::types::StockMode)
    /// is `Strict`; in `Free` mode the decrement clamps at zero instead.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// The sale insert hit the UNIQUE(series_code, correlative) constraint.
    ///
    /// ## When This Occurs
    /// Never, if the series-row lock is held across the whole allocation.
    /// This variant exists as a belt-and-suspenders defense; seeing it in
    /// the wild indicates a lock-discipline bug, not a retryable condition.
    #[error("Voucher {series_code}-{correlative} already exists")]
    CorrelativeCollision {
        series_code: String,
        correlative: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Checkout request validation errors.
///
/// These occur before any I/O: a request that fails validation never opens
/// a transaction, takes a lock, or touches a counter.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The checkout carries no line items.
    #[error("Checkout must contain at least one line item")]
    EmptyCheckout,

    /// The checkout carries too many line items.
    #[error("Checkout cannot have more than {max} line items")]
    TooManyLines { max: usize },

    /// The same product appears on more than one line.
    ///
    /// Duplicate products in one checkout are a caller-side bug: allowing
    /// them would decrement the same stock row twice for one logical line.
    #[error("Product {product_id} appears more than once in the checkout")]
    DuplicateLineProduct { product_id: String },

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Quantity exceeds the per-line maximum.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A monetary amount is negative.
    #[error("{field} must not be negative")]
    NegativeAmount { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
