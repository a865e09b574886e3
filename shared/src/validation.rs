//! Validation utilities for the Production Operations Tracking Platform

use rust_decimal::Decimal;
use uuid::Uuid;

/// Validate that a quantity is strictly positive
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate that a required text field is non-empty after trimming
pub fn validate_required_text(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("Field cannot be empty");
    }
    Ok(())
}

/// Validate that a consumption list references each lot at most once
pub fn validate_unique_lot_ids(lot_ids: &[Uuid]) -> Result<(), &'static str> {
    for (i, id) in lot_ids.iter().enumerate() {
        if lot_ids[..i].contains(id) {
            return Err("Duplicate lot reference in consumption list");
        }
    }
    Ok(())
}

/// Check the lot quantity invariant: 0 <= available <= received
pub fn validate_lot_quantities(received: Decimal, available: Decimal) -> Result<(), &'static str> {
    if received < Decimal::ZERO {
        return Err("Received quantity cannot be negative");
    }
    if available < Decimal::ZERO {
        return Err("Available quantity cannot be negative");
    }
    if available > received {
        return Err("Available quantity cannot exceed received quantity");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn positive_quantity_accepted() {
        assert!(validate_positive_quantity(dec("0.1")).is_ok());
        assert!(validate_positive_quantity(dec("1000")).is_ok());
    }

    #[test]
    fn zero_and_negative_quantities_rejected() {
        assert!(validate_positive_quantity(Decimal::ZERO).is_err());
        assert!(validate_positive_quantity(dec("-5")).is_err());
    }

    #[test]
    fn blank_text_rejected() {
        assert!(validate_required_text("").is_err());
        assert!(validate_required_text("   ").is_err());
        assert!(validate_required_text("Khar").is_ok());
    }

    #[test]
    fn duplicate_lot_ids_rejected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(validate_unique_lot_ids(&[a, b]).is_ok());
        assert!(validate_unique_lot_ids(&[a, b, a]).is_err());
        assert!(validate_unique_lot_ids(&[]).is_ok());
    }

    #[test]
    fn lot_quantity_invariant() {
        assert!(validate_lot_quantities(dec("100"), dec("100")).is_ok());
        assert!(validate_lot_quantities(dec("100"), dec("0")).is_ok());
        assert!(validate_lot_quantities(dec("100"), dec("101")).is_err());
        assert!(validate_lot_quantities(dec("100"), dec("-1")).is_err());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        /// Any remaining quantity after consuming within availability stays
        /// inside the lot invariant
        #[test]
        fn consumption_preserves_lot_invariant(
            received in quantity_strategy(),
            fraction in 0u32..=100u32
        ) {
            let consumed = received * Decimal::from(fraction) / Decimal::from(100);
            let available = received - consumed;
            prop_assert!(validate_lot_quantities(received, available).is_ok());
        }

        /// Distinct ids always pass the duplicate check
        #[test]
        fn distinct_ids_always_valid(count in 0usize..20) {
            let ids: Vec<Uuid> = (0..count).map(|_| Uuid::new_v4()).collect();
            prop_assert!(validate_unique_lot_ids(&ids).is_ok());
        }
    }
}
