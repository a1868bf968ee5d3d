//! # Correlative Module
//!
//! Fixed-width formatting for fiscal correlative numbers.
//!
//! ## What Is a Correlative?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Anatomy of a Voucher Identifier                        │
//! │                                                                         │
//! │        B001 - 00000042                                                  │
//! │        ────   ────────                                                  │
//! │          │        │                                                     │
//! │          │        └── correlative: sequential, zero-padded,            │
//! │          │            fixed width (8 digits by default)                │
//! │          │                                                              │
//! │          └── series code: fiscal-authority pattern, one active         │
//! │              series per voucher type                                   │
//! │                                                                         │
//! │  The pair (series code, correlative) is globally unique and never      │
//! │  reassigned once a sale commits under it.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The allocator in `caja-db` owns *which* number is handed out; this module
//! only owns the numeric range and the string shape.

use crate::error::CoreError;
use crate::MAX_CORRELATIVE_WIDTH;

/// Returns the highest correlative representable at the given width.
///
/// ## Example
/// ```rust
/// use caja_core::correlative::max_correlative_for_width;
///
/// assert_eq!(max_correlative_for_width(3), 999);
/// assert_eq!(max_correlative_for_width(8), 99_999_999);
/// ```
#[inline]
pub fn max_correlative_for_width(width: u32) -> i64 {
    10i64.pow(width.min(MAX_CORRELATIVE_WIDTH)) - 1
}

/// Formats a correlative number as a fixed-width, zero-padded decimal string.
///
/// ## Errors
/// Returns [`CoreError::CorrelativeOverflow`] when the number does not fit
/// the configured width (or the width itself is out of range). Overflow is
/// fatal for the series: the numbering range is exhausted and requires
/// administrative intervention (a new series).
///
/// ## Example
/// ```rust
/// use caja_core::correlative::format_correlative;
///
/// assert_eq!(format_correlative(42, 8).unwrap(), "00000042");
/// assert!(format_correlative(1000, 3).is_err());
/// ```
pub fn format_correlative(number: i64, width: u32) -> Result<String, CoreError> {
    if width == 0 || width > MAX_CORRELATIVE_WIDTH {
        return Err(CoreError::CorrelativeOverflow { number, width });
    }

    if number < 1 || number > max_correlative_for_width(width) {
        return Err(CoreError::CorrelativeOverflow { number, width });
    }

    Ok(format!("{:0>width$}", number, width = width as usize))
}

// =============================================================================
// Unit Tests
// =============================================================================
