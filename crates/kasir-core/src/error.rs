//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasir-core errors (this file)                                         │
//! │  ├── CoreError        - Rejected cart / discount / payment operations  │
//! │  └── ValidationError  - Operator input that failed to parse            │
//! │                                                                         │
//! │  kasir-checkout errors (separate crate)                                │
//! │  ├── CheckoutError    - Collaborator failures, busy gate               │
//! │  └── Advisory         - What the cashier sees (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → Advisory          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are fatal: a rejected operation leaves the session
//! exactly as it was, and the cashier can always clear and start over.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Rejected checkout operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The line is already at the item's available stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Tap "Es Teh" (stock: 1, in cart: 1)
    ///      │
    ///      ▼
    /// StockExceeded { item_id: "es-teh", available: 1, requested: 2 }
    ///      │
    ///      ▼
    /// UI shows: "Only 1 Es Teh in stock"
    /// ```
    #[error("Stock exceeded for {item_id}: available {available}, requested {requested}")]
    StockExceeded {
        item_id: String,
        available: u32,
        requested: i64,
    },

    /// The item has no stock at all and is not in the cart yet.
    #[error("{item_id} is out of stock")]
    OutOfStock { item_id: String },

    /// Quantity change for an item that has no cart line.
    #[error("{0} is not in the cart")]
    ItemNotInCart(String),

    /// Cart has reached the maximum number of distinct lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// The change would push the subtotal past what Money can hold.
    #[error("Cart total too large to add {item_id}")]
    AmountTooLarge { item_id: String },

    /// Manual discount input rejected.
    #[error("Invalid discount: {reason}")]
    InvalidDiscount { reason: String },

    /// The opposing discount mechanism is active and entry is locked.
    #[error("Cannot apply {requested} while a {active} discount is active")]
    DiscountConflict {
        requested: &'static str,
        active: &'static str,
    },

    /// Cash tendered does not cover the grand total.
    #[error("Insufficient payment: total {required}, tendered {tendered}")]
    InsufficientPayment { required: Money, tendered: Money },

    /// Confirmation attempted before a payment method was chosen.
    #[error("No payment method selected")]
    PaymentMethodNotSelected,

    /// QR confirmation attempted before the gateway issued a reference.
    #[error("Payment request for {method} has not been issued")]
    PaymentPending { method: String },

    /// Nothing to pay for.
    #[error("Cart is empty")]
    EmptyCart,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when operator input doesn't meet requirements,
/// before any checkout state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., not a number, too many decimals).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
