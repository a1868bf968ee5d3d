//! # Sequence Allocator
//!
//! Hands out the next fiscal correlative from the active numbering series of
//! a voucher type. This is the sole serialization point between concurrent
//! checkouts against the same series.
//!
//! ## Locking Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               allocate() inside the checkout transaction                │
//! │                                                                         │
//! │  1. UPDATE the active series row (no-op write)                         │
//! │     └── acquires the write lock; a concurrent checkout's allocate()    │
//! │         now blocks here until THIS transaction commits or aborts       │
//! │     └── 0 rows affected → NoActiveSeries, nothing was locked           │
//! │                                                                         │
//! │  2. Read current_number                                                │
//! │                                                                         │
//! │  3. Probe sales for (code, candidate); taken → candidate += 1, retry   │
//! │     └── current_number may trail reality after a manual correction     │
//! │         or an aborted allocation; probing forward skips burned pairs   │
//! │                                                                         │
//! │  4. UPDATE current_number = candidate + 1 (still under the same lock)  │
//! │     └── the counter never regresses; the next allocation never        │
//! │         re-probes numbers already known to be taken                    │
//! │                                                                         │
//! │  The lock outlives this call: it is released by the SURROUNDING        │
//! │  transaction's commit/rollback, never in between. Holding it across    │
//! │  the probe-and-write AND the eventual sale insert is what makes the    │
//! │  uniqueness guarantee hold under concurrency.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On rollback the current_number write is undone with everything else, so
//! an aborted checkout's number becomes available again to the next caller.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use caja_core::{format_correlative, CoreError, VoucherSeries};

/// Cap on probe steps within a single allocation.
///
/// The probe loop walks forward over correlatives already consumed by
/// existing sales. A healthy series needs zero or a handful of steps; a walk
/// this long means the series range is effectively exhausted (or the counter
/// was corrected absurdly far backwards), so the allocator gives up with
/// `CorrelativeOverflow` instead of scanning the whole number space.
pub const MAX_PROBE_STEPS: i64 = 1024;

/// A voucher number handed out by the allocator.
///
/// Valid only within the transaction that allocated it: if that transaction
/// rolls back, the pair may be issued again later.
#[derive(Debug, Clone)]
pub struct Allocation {
    /// Series row the number came from.
    pub series_id: String,
    /// Series code, e.g. "B001".
    pub series_code: String,
    /// Zero-padded correlative string, e.g. "00000042".
    pub correlative: String,
    /// Numeric value of the correlative.
    pub number: i64,
}

/// Allocates the next `(series_code, correlative)` pair for a voucher type.
///
/// Runs inside the caller's transaction; see the module docs for the locking
/// discipline. The series row stays locked until that transaction ends.
///
/// ## Errors
/// - [`CoreError::NoActiveSeries`] - no active series for the voucher type
/// - [`CoreError::CorrelativeOverflow`] - numeric range or probe budget
///   exhausted
/// - [`DbError::LockTimeout`](crate::DbError::LockTimeout) - another
///   checkout held the series lock past the busy timeout (transient)
pub async fn allocate(
    conn: &mut SqliteConnection,
    voucher_type_id: &str,
) -> DbResult<Allocation> {
    // Lock acquisition: a write on the series row, before any read of it.
    // Content is unchanged; what matters is that a concurrent allocator
    // blocks on this statement until we commit or roll back.
    let locked = sqlx::query(
        r#"
        UPDATE voucher_series
        SET current_number = current_number
        WHERE voucher_type_id = ?1 AND is_active = 1
        "#,
    )
    .bind(voucher_type_id)
    .execute(&mut *conn)
    .await?;

    if locked.rows_affected() == 0 {
        return Err(CoreError::NoActiveSeries {
            voucher_type_id: voucher_type_id.to_string(),
        }
        .into());
    }

    let series: VoucherSeries = sqlx::query_as(
        r#"
        SELECT id, voucher_type_id, code, current_number, width, is_active,
               created_at, updated_at
        FROM voucher_series
        WHERE voucher_type_id = ?1 AND is_active = 1
        "#,
    )
    .bind(voucher_type_id)
    .fetch_one(&mut *conn)
    .await?;

    let width = series.width as u32;
    let mut candidate = series.current_number.max(1);
    let mut steps = 0i64;

    // Probe forward until the pair is unused. The counter may trail reality,
    // so existing sales under the candidate pair are skipped, never reused.
    let correlative = loop {
        let correlative = format_correlative(candidate, width)?;

        let taken: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM sales WHERE series_code = ?1 AND correlative = ?2",
        )
        .bind(&series.code)
        .bind(&correlative)
        .fetch_optional(&mut *conn)
        .await?;

        if taken.is_none() {
            break correlative;
        }

        candidate += 1;
        steps += 1;
        if steps >= MAX_PROBE_STEPS {
            return Err(CoreError::CorrelativeOverflow {
                number: candidate,
                width,
            }
            .into());
        }
    };

    // Persist the successor while still holding the lock, so the counter
    // never regresses and already-probed numbers are not probed again.
    let next_number = candidate + 1;
    sqlx::query(
        "UPDATE voucher_series SET current_number = ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(&series.id)
    .bind(next_number)
    .bind(chrono::Utc::now())
    .execute(&mut *conn)
    .await?;

    debug!(
        series = %series.code,
        correlative = %correlative,
        probe_steps = steps,
        "Allocated voucher number"
    );

    Ok(Allocation {
        series_id: series.id,
        series_code: series.code,
        correlative,
        number: candidate,
    })
}
