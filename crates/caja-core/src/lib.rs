//! # caja-core: Pure Business Logic for Caja POS
//!
//! This crate is the **heart** of Caja POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Caja POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Caller Boundary (HTTP / UI)                  │   │
//! │  │    request validation, auth, response formatting                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ caja-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │correlative │  │ validation│  │   │
//! │  │   │   Sale    │  │   Money   │  │ formatting │  │   rules   │  │   │
//! │  │   │  Series   │  │  (cents)  │  │  overflow  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    caja-db (Database Layer)                     │   │
//! │  │       SQLite queries, migrations, the checkout transaction      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, SaleDetail, VoucherSeries, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`correlative`] - Fixed-width fiscal correlative formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Checkout request validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use caja_core::correlative::format_correlative;
//! use caja_core::DEFAULT_CORRELATIVE_WIDTH;
//!
//! // Correlatives are fixed-width, zero-padded decimal strings
//! let first = format_correlative(1, DEFAULT_CORRELATIVE_WIDTH).unwrap();
//! assert_eq!(first, "00000001");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod correlative;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use caja_core::Money` instead of
// `use caja_core::money::Money`

pub use correlative::{format_correlative, max_correlative_for_width};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default fixed width of a fiscal correlative, in decimal digits.
///
/// ## Why 8?
/// The fiscal-authority voucher format pads the sequential portion to eight
/// digits ("00000001"). Individual series may configure a different width up
/// to [`MAX_CORRELATIVE_WIDTH`].
pub const DEFAULT_CORRELATIVE_WIDTH: u32 = 8;

/// Maximum configurable correlative width.
///
/// Bounded so `10^width` stays comfortably inside `i64` and voucher
/// identifiers keep a printable, fixed-format shape.
pub const MAX_CORRELATIVE_WIDTH: u32 = 12;

/// Maximum line items allowed in a single checkout.
///
/// ## Business Reason
/// Prevents runaway requests and ensures reasonable transaction sizes.
/// Can be made configurable per-store in future versions.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
