//! # Repository Module
//!
//! Database repository implementations for Caja POS.
//!
//! ## Two Kinds of Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Pool-scoped repositories (own their connection checkout):             │
//! │                                                                         │
//! │  SaleRepository     ── record_sale() runs the whole checkout           │
//! │  CatalogRepository  ── master data + series administration             │
//! │                                                                         │
//! │  Transaction-scoped components (run INSIDE a caller's transaction):    │
//! │                                                                         │
//! │  series::allocate() ── hands out the next voucher number; the series   │
//! │                        row stays locked until the transaction ends     │
//! │  stock::decrement() ── applies one bounded stock decrement under the   │
//! │                        same transaction                                │
//! │                                                                         │
//! │  record_sale() is the only composition point of the three: it opens    │
//! │  one transaction, calls allocate() once, decrement() once per line,    │
//! │  and commits or rolls back the whole unit.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`sale::SaleRepository`] - The checkout transaction and sale queries
//! - [`catalog::CatalogRepository`] - Master data and series lifecycle
//! - [`series`] / [`stock`] - Transaction-scoped allocation and decrements

pub mod catalog;
pub mod sale;
pub mod series;
pub mod stock;
