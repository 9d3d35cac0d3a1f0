//! # Validation Module
//!
//! Input validation for values typed by the cashier.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Checkout screen                                               │
//! │  ├── Numeric keypad, disabled buttons                                   │
//! │  └── Immediate feedback                                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Raw text → Money (exact, no floats)                                │
//! │  └── Voucher code normalisation                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Checkout engine                                               │
//! │  └── Business rules (stock, clamping, exclusivity)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasir_core::validation::{normalize_voucher_code, parse_amount};
//!
//! let discount = parse_amount("5000", "discount", 0).unwrap();
//! assert_eq!(discount.minor(), 5000);
//!
//! assert_eq!(normalize_voucher_code(" hemat10 ").unwrap(), "HEMAT10");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_VOUCHER_CODE_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Amount Parsing
// =============================================================================

/// Parses an operator-entered amount into minor units.
///
/// ## Rules
/// - Must not be empty
/// - Must be a plain decimal number ("NaN", "inf", "1e3" are rejected)
/// - Must not be negative
/// - At most `decimals` fractional digits
///
/// ## Example
/// ```rust
/// use kasir_core::validation::parse_amount;
///
/// assert_eq!(parse_amount("10.99", "cash", 2).unwrap().minor(), 1099);
/// assert_eq!(parse_amount("20000", "cash", 0).unwrap().minor(), 20000);
/// assert!(parse_amount("-5", "discount", 0).is_err());
/// assert!(parse_amount("abc", "discount", 0).is_err());
/// assert!(parse_amount("1.5", "discount", 0).is_err());
/// ```
pub fn parse_amount(input: &str, field: &str, decimals: u32) -> ValidationResult<Money> {
    let input = input.trim();

    if input.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let value = Decimal::from_str(input).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a number".to_string(),
    })?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    let out_of_range = || ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    };

    let factor = 10_i64.checked_pow(decimals).ok_or_else(out_of_range)?;
    let scaled = value
        .checked_mul(Decimal::from(factor))
        .ok_or_else(out_of_range)?;

    if !scaled.fract().is_zero() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("at most {} decimal places allowed", decimals),
        });
    }

    let minor = scaled.to_i64().ok_or_else(out_of_range)?;
    Ok(Money::from_minor(minor))
}

/// Validates a catalog price.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (complimentary items)
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Voucher Codes
// =============================================================================

/// Normalises a voucher code for lookup.
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - Must not be empty
/// - At most MAX_VOUCHER_CODE_LEN characters
/// - Letters, digits, hyphens and underscores only
/// - Returned uppercased
pub fn normalize_voucher_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "voucher code".to_string(),
        });
    }

    if code.chars().count() > MAX_VOUCHER_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "voucher code".to_string(),
            max: MAX_VOUCHER_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "voucher code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_ascii_uppercase())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_whole_units() {
        assert_eq!(parse_amount("5000", "discount", 0).unwrap().minor(), 5000);
        assert_eq!(parse_amount(" 99999 ", "discount", 0).unwrap().minor(), 99999);
        assert_eq!(parse_amount("0", "discount", 0).unwrap().minor(), 0);
        assert_eq!(parse_amount("-0", "discount", 0).unwrap().minor(), 0);
    }

    #[test]
    fn test_parse_amount_with_decimals() {
        assert_eq!(parse_amount("10.99", "cash", 2).unwrap().minor(), 1099);
        assert_eq!(parse_amount("10.5", "cash", 2).unwrap().minor(), 1050);
        assert_eq!(parse_amount("10", "cash", 2).unwrap().minor(), 1000);
        assert!(parse_amount("10.999", "cash", 2).is_err());
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(matches!(
            parse_amount("", "discount", 0),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            parse_amount("abc", "discount", 0),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(parse_amount("NaN", "discount", 0).is_err());
        assert!(parse_amount("inf", "discount", 0).is_err());
        assert!(matches!(
            parse_amount("-100", "discount", 0),
            Err(ValidationError::Negative { .. })
        ));
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Money::zero()).is_ok());
        assert!(validate_price(Money::from_minor(25_000)).is_ok());
        assert!(validate_price(Money::from_minor(-1)).is_err());
    }

    #[test]
    fn test_normalize_voucher_code() {
        assert_eq!(normalize_voucher_code("hemat10").unwrap(), "HEMAT10");
        assert_eq!(normalize_voucher_code("  new-year_24 ").unwrap(), "NEW-YEAR_24");

        assert!(normalize_voucher_code("").is_err());
        assert!(normalize_voucher_code("   ").is_err());
        assert!(normalize_voucher_code("has space").is_err());
        assert!(normalize_voucher_code(&"A".repeat(MAX_VOUCHER_CODE_LEN + 1)).is_err());
    }
}
