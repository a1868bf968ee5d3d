//! # Validation Module
//!
//! Checkout request validation for Caja POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller boundary (HTTP handler / UI)                          │
//! │  ├── Schema checks, auth, field formats                                │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Non-empty checkout, distinct products                             │
//! │  └── Sign checks on quantities and amounts                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE(series_code, correlative)                                  │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A request that fails here never opens a transaction: no lock is taken,
//! no counter moves, no stock row is touched.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::CheckoutRequest;
use crate::{MAX_LINE_QUANTITY, MAX_SALE_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Checkout Validation
// =============================================================================

/// Validates a checkout request before any I/O happens.
///
/// ## Rules
/// - At least one line item, at most [`MAX_SALE_LINES`]
/// - Line-item products are pairwise distinct
/// - Every quantity is positive and at most [`MAX_LINE_QUANTITY`]
/// - Every unit price and monetary total is non-negative
/// - Referenced ids are non-empty strings
pub fn validate_checkout(request: &CheckoutRequest) -> ValidationResult<()> {
    validate_id(&request.store_id, "store_id")?;
    validate_id(&request.customer_id, "customer_id")?;
    validate_id(&request.voucher_type_id, "voucher_type_id")?;
    validate_id(&request.payment_type_id, "payment_type_id")?;
    validate_id(&request.user_id, "user_id")?;

    validate_amount(request.subtotal_cents, "subtotal")?;
    validate_amount(request.tax_cents, "tax")?;
    validate_amount(request.total_cents, "total")?;
    validate_amount(request.cash_received_cents, "cash received")?;
    validate_amount(request.change_cents, "change")?;

    if request.lines.is_empty() {
        return Err(ValidationError::EmptyCheckout);
    }

    if request.lines.len() > MAX_SALE_LINES {
        return Err(ValidationError::TooManyLines {
            max: MAX_SALE_LINES,
        });
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(request.lines.len());
    for line in &request.lines {
        validate_id(&line.product_id, "product_id")?;
        validate_quantity(line.quantity)?;
        validate_amount(line.unit_price_cents, "unit price")?;

        // One line per product: a duplicate would decrement the same stock
        // row twice for one logical line item.
        if !seen.insert(line.product_id.as_str()) {
            return Err(ValidationError::DuplicateLineProduct {
                product_id: line.product_id.clone(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::QuantityTooLarge {
            requested: qty,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary amount in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items, exact-change payments)
pub fn validate_amount(cents: i64, field: &str) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::NegativeAmount {
            field: field.to_string(),
        });
    }

    Ok(())
}

fn validate_id(id: &str, field: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CheckoutLine;

    fn request_with_lines(lines: Vec<CheckoutLine>) -> CheckoutRequest {
        CheckoutRequest {
            store_id: "st-1".into(),
            customer_id: "c-1".into(),
            voucher_type_id: "vt-1".into(),
            payment_type_id: "pt-1".into(),
            user_id: "u-1".into(),
            subtotal_cents: 1000,
            tax_cents: 180,
            total_cents: 1180,
            cash_received_cents: 2000,
            change_cents: 820,
            payment_reference: None,
            lines,
        }
    }

    fn line(product: &str, qty: i64) -> CheckoutLine {
        CheckoutLine {
            product_id: product.into(),
            quantity: qty,
            unit_price_cents: 250,
        }
    }

    #[test]
    fn test_valid_checkout() {
        let req = request_with_lines(vec![line("p-1", 3), line("p-2", 5)]);
        assert!(validate_checkout(&req).is_ok());
    }

    #[test]
    fn test_empty_checkout_rejected() {
        let req = request_with_lines(vec![]);
        assert!(matches!(
            validate_checkout(&req),
            Err(ValidationError::EmptyCheckout)
        ));
    }

    #[test]
    fn test_duplicate_product_rejected() {
        let req = request_with_lines(vec![line("p-1", 3), line("p-1", 2)]);
        assert!(matches!(
            validate_checkout(&req),
            Err(ValidationError::DuplicateLineProduct { .. })
        ));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let req = request_with_lines(vec![line("p-1", 0)]);
        assert!(matches!(
            validate_checkout(&req),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_negative_total_rejected() {
        let mut req = request_with_lines(vec![line("p-1", 1)]);
        req.total_cents = -5;
        assert!(matches!(
            validate_checkout(&req),
            Err(ValidationError::NegativeAmount { .. })
        ));
    }

    #[test]
    fn test_negative_unit_price_rejected() {
        let mut req = request_with_lines(vec![line("p-1", 1)]);
        req.lines[0].unit_price_cents = -1;
        assert!(matches!(
            validate_checkout(&req),
            Err(ValidationError::NegativeAmount { .. })
        ));
    }

    #[test]
    fn test_blank_ids_rejected() {
        let mut req = request_with_lines(vec![line("p-1", 1)]);
        req.user_id = "  ".into();
        assert!(matches!(
            validate_checkout(&req),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_quantity_cap() {
        let req = request_with_lines(vec![line("p-1", MAX_LINE_QUANTITY + 1)]);
        assert!(matches!(
            validate_checkout(&req),
            Err(ValidationError::QuantityTooLarge { .. })
        ));
    }
}
