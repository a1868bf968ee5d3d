//! # caja-db: Database Layer for Caja POS
//!
//! This crate provides database access for the Caja POS system.
//! It uses SQLite for local storage with sqlx for async operations, and it
//! owns the one piece of the system with real correctness hazards: the
//! sale-recording transaction.
//!
//! ## Checkout Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      One Checkout, One Transaction                      │
//! │                                                                         │
//! │  CheckoutRequest (validated in caja-core)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     caja-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   BEGIN ──► allocate voucher number (series row locked)        │   │
//! │  │         ──► insert sale header + details                       │   │
//! │  │         ──► decrement stock per line (ascending product id)    │   │
//! │  │         ──► COMMIT            (any error ──► ROLLBACK)         │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, row state guarded by the write lock)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types (with transient/fatal classification)
//! - [`settings`] - Stock-mode switch storage
//! - [`repository`] - Repositories: series allocator, stock guard, sales,
//!   catalog master data
//!
//! ## Usage
//!
//! ```rust,ignore
//! use caja_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/caja.db")).await?;
//! let mode = db.settings().stock_mode().await?;
//! let recorded = db.sales().record_sale(&request, mode).await?;
//! println!("voucher {}", recorded.sale.voucher_number());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod settings;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use settings::SettingsRepository;

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::sale::{RecordedSale, SaleRepository};
pub use repository::series::Allocation;
