//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          CoreError (caja-core)             │
//! │       │                                   │                             │
//! │       └───────────────┬───────────────────┘                             │
//! │                       ▼                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │  Caller boundary ← decides retry via DbError::is_transient()           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retry Contract
//! The checkout transaction never leaves partial state behind, so a caller
//! may retry any transient failure from scratch: each retry either fully
//! succeeds once or fully fails. Retry policy belongs to the caller; this
//! crate never retries internally.

use thiserror::Error;

use caja_core::CoreError;

/// Database operation errors.
///
/// These errors wrap sqlx and domain errors and provide additional context
/// for debugging and caller-side handling.
#[derive(Debug, Error)]
pub enum DbError {
    /// Domain error raised inside a database operation.
    ///
    /// ## When This Occurs
    /// - `NoActiveSeries` / `CorrelativeOverflow` from the allocator
    /// - `ProductNotStocked` / `InsufficientStock` from the stock guard
    /// - `CorrelativeCollision` from the sale insert backstop
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate series code under one voucher type
    /// - Duplicate (store, product) stock row
    /// - Any UNIQUE index violation not handled more specifically
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A row lock (or the SQLite write lock) could not be acquired within
    /// the configured busy timeout.
    ///
    /// ## When This Occurs
    /// - Another checkout held the series/stock lock past the wait bound
    ///
    /// Transient: the losing transaction is fully rolled back and the whole
    /// checkout may be retried from scratch.
    #[error("Lock wait timed out: {0}")]
    LockTimeout(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether the caller may safely retry the whole operation from a fresh
    /// transaction.
    ///
    /// ## Classification
    /// ```text
    /// LockTimeout        → transient (lock holder finished meanwhile)
    /// ConnectionFailed   → transient (pool exhausted / connection loss)
    /// everything else    → fatal to the attempt as submitted
    /// ```
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::LockTimeout(_) | DbError::ConnectionFailed(_))
    }

    /// Whether this error is the UNIQUE(series_code, correlative) backstop.
    ///
    /// Used by the sale recorder to translate a raw constraint violation on
    /// the voucher identifier into `CoreError::CorrelativeCollision`.
    pub(crate) fn is_voucher_unique_violation(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { field, .. }
                if field.contains("sales.series_code") || field.contains("sales.correlative")
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound            → DbError::NotFound
/// sqlx::Error::Database (UNIQUE)      → DbError::UniqueViolation
/// sqlx::Error::Database (FK)          → DbError::ForeignKeyViolation
/// sqlx::Error::Database (locked/busy) → DbError::LockTimeout
/// sqlx::Error::PoolTimedOut/Closed    → DbError::ConnectionFailed
/// Other                               → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite error text for constraints:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>"
                // FK constraint: "FOREIGN KEY constraint failed"
                // Busy/locked: "database is locked" / "database table is locked"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("database is locked")
                    || msg.contains("database table is locked")
                {
                    DbError::LockTimeout(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionFailed("Connection pool exhausted".to_string())
            }

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================
