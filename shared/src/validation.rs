//! Validation utilities for the Distribution Management Platform

use rust_decimal::Decimal;

// ============================================================================
// Order & Pricing Validations
// ============================================================================

/// Validate an order item quantity.
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a monetary amount that must not be negative.
pub fn validate_non_negative_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    Ok(())
}

/// Validate a commission percentage (0..=100).
pub fn validate_commission_percentage(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO || value > Decimal::from(100) {
        return Err("Commission percentage must be between 0 and 100");
    }
    Ok(())
}

/// Validate SKU weight, required positive when per-kg cost resolution is used.
pub fn validate_weight_grams(weight: Decimal) -> Result<(), &'static str> {
    if weight <= Decimal::ZERO {
        return Err("Weight must be positive");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a non-empty trimmed name
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name is required");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn quantity_must_be_positive() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn commission_percentage_bounds() {
        assert!(validate_commission_percentage(Decimal::ZERO).is_ok());
        assert!(validate_commission_percentage(Decimal::from(100)).is_ok());
        assert!(validate_commission_percentage(Decimal::from_str("100.01").unwrap()).is_err());
        assert!(validate_commission_percentage(Decimal::from(-1)).is_err());
    }

    #[test]
    fn email_basic_check() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("nope").is_err());
    }
}
