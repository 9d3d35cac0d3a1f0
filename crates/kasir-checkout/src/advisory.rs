//! # Advisories
//!
//! What the checkout screen shows when an operation is rejected.
//!
//! ```text
//! CheckoutError ──► Advisory { code, severity, message } ──► toast / banner
//! ```
//!
//! No advisory is fatal: the cashier can retry, adjust, or clear the cart.
//! ```json
//! {
//!   "code": "INSUFFICIENT_STOCK",
//!   "severity": "warning",
//!   "message": "Only 1 Es Teh left in stock"
//! }
//! ```

use serde::Serialize;

use kasir_core::{CoreError, ValidationError};

use crate::config::CheckoutConfig;
use crate::error::CheckoutError;

/// Machine-readable advisory codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Item unknown or not in the cart
    NotFound,

    /// Operator input failed validation
    ValidationError,

    /// Cart at its stock or size limit
    InsufficientStock,

    /// Cart operation rejected
    CartError,

    /// Discount or voucher rejected
    DiscountError,

    /// Payment input incomplete or insufficient
    PaymentError,

    /// Backend refused the transaction
    TransactionRejected,

    /// A collaborator could not be reached
    ServiceUnavailable,

    /// Another operation is in flight
    Busy,

    /// Bad configuration
    Internal,
}

/// How prominently to show an advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// User-facing rendering of a [`CheckoutError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
}

impl Advisory {
    pub fn new(code: ErrorCode, severity: Severity, message: impl Into<String>) -> Self {
        Advisory {
            code,
            severity,
            message: message.into(),
        }
    }

    /// Builds an advisory with amounts formatted for `config`'s currency.
    pub fn from_error(err: &CheckoutError, config: &CheckoutConfig) -> Self {
        match err {
            CheckoutError::Core(CoreError::InsufficientPayment { required, tendered }) => {
                Advisory::new(
                    ErrorCode::PaymentError,
                    Severity::Warning,
                    format!(
                        "Cash tendered {} does not cover the total of {}",
                        config.format_currency(*tendered),
                        config.format_currency(*required)
                    ),
                )
            }
            other => Advisory::from(other),
        }
    }
}

impl From<&CoreError> for Advisory {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::StockExceeded {
                item_id, available, ..
            } => Advisory::new(
                ErrorCode::InsufficientStock,
                Severity::Warning,
                format!("Only {} of {} left in stock", available, item_id),
            ),
            CoreError::OutOfStock { item_id } => Advisory::new(
                ErrorCode::InsufficientStock,
                Severity::Warning,
                format!("{} is out of stock", item_id),
            ),
            CoreError::ItemNotInCart(id) => Advisory::new(
                ErrorCode::NotFound,
                Severity::Info,
                format!("{} is not in the cart", id),
            ),
            CoreError::CartTooLarge { max } => Advisory::new(
                ErrorCode::CartError,
                Severity::Warning,
                format!("Cart cannot have more than {} lines", max),
            ),
            CoreError::AmountTooLarge { item_id } => Advisory::new(
                ErrorCode::CartError,
                Severity::Warning,
                format!("Cart total is too large to add {}", item_id),
            ),
            CoreError::InvalidDiscount { reason } => Advisory::new(
                ErrorCode::DiscountError,
                Severity::Warning,
                format!("Invalid discount: {}", reason),
            ),
            CoreError::DiscountConflict { requested, active } => Advisory::new(
                ErrorCode::DiscountError,
                Severity::Info,
                format!("Remove the {} discount before applying a {}", active, requested),
            ),
            CoreError::InsufficientPayment { .. }
            | CoreError::PaymentMethodNotSelected
            | CoreError::PaymentPending { .. } => {
                Advisory::new(ErrorCode::PaymentError, Severity::Warning, err.to_string())
            }
            CoreError::EmptyCart => {
                Advisory::new(ErrorCode::CartError, Severity::Info, "Cart is empty")
            }
            CoreError::Validation(e) => Advisory::from(e),
        }
    }
}

impl From<&ValidationError> for Advisory {
    fn from(err: &ValidationError) -> Self {
        Advisory::new(ErrorCode::ValidationError, Severity::Warning, err.to_string())
    }
}

impl From<&CheckoutError> for Advisory {
    fn from(err: &CheckoutError) -> Self {
        match err {
            CheckoutError::Core(e) => Advisory::from(e),
            CheckoutError::ItemNotFound(id) => Advisory::new(
                ErrorCode::NotFound,
                Severity::Warning,
                format!("Item not found: {}", id),
            ),
            CheckoutError::VoucherRejected { message, .. } => Advisory::new(
                ErrorCode::DiscountError,
                Severity::Warning,
                message.clone(),
            ),
            CheckoutError::SubmissionFailed {
                message,
                stock_conflict,
            } => {
                let message = if *stock_conflict {
                    format!("{}. Stock has been refreshed, please review the cart", message)
                } else {
                    message.clone()
                };
                Advisory::new(ErrorCode::TransactionRejected, Severity::Error, message)
            }
            CheckoutError::PaymentRequestFailed(message) => Advisory::new(
                ErrorCode::PaymentError,
                Severity::Error,
                format!("Could not request payment: {}", message),
            ),
            CheckoutError::CatalogUnavailable(message) => {
                // Log the underlying error but show a generic message
                tracing::error!("Catalog unavailable: {}", message);
                Advisory::new(
                    ErrorCode::ServiceUnavailable,
                    Severity::Error,
                    "Menu could not be loaded",
                )
            }
            CheckoutError::Busy => Advisory::new(
                ErrorCode::Busy,
                Severity::Info,
                "Please wait for the current operation to finish",
            ),
            CheckoutError::Config(message) => {
                tracing::error!("Configuration error: {}", message);
                Advisory::new(ErrorCode::Internal, Severity::Error, "Checkout is misconfigured")
            }
        }
    }
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}
