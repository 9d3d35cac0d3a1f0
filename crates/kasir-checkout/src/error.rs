//! # Checkout Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Checkout Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Engine         │  │  Collaborators  │  │  Session                │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core(CoreError)│  │  VoucherRejected│  │  ItemNotFound           │ │
//! │  │                 │  │  SubmissionFail │  │  Busy                   │ │
//! │  │                 │  │  PaymentRequest │  │  Config                 │ │
//! │  │                 │  │  CatalogUnavail │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed operation leaves the session unchanged.

use thiserror::Error;

use kasir_core::CoreError;

use crate::ports::ServiceError;

/// Result type alias for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Checkout error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    // =========================================================================
    // Engine Errors
    // =========================================================================
    /// Rejected by the checkout engine.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Item id not present in the cached catalog.
    #[error("Item not found in catalog: {0}")]
    ItemNotFound(String),

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    /// The resolver refused the voucher code.
    #[error("Voucher {code} rejected: {message}")]
    VoucherRejected { code: String, message: String },

    /// The backend refused the transaction.
    #[error("Transaction failed: {message}")]
    SubmissionFailed {
        message: String,
        /// The catalog was refreshed because stock changed.
        stock_conflict: bool,
    },

    /// The gateway could not issue a payment request.
    #[error("Payment request failed: {0}")]
    PaymentRequestFailed(String),

    /// The catalog could not be loaded.
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// Another operation is still in flight.
    #[error("Checkout is busy with another operation")]
    Busy,

    /// Configuration could not be loaded or is invalid.
    #[error("Invalid checkout configuration: {0}")]
    Config(String),
}

impl CheckoutError {
    pub(crate) fn voucher_rejected(code: &str, err: ServiceError) -> Self {
        CheckoutError::VoucherRejected {
            code: code.to_string(),
            message: err.message().to_string(),
        }
    }

    pub(crate) fn submission_failed(err: &ServiceError) -> Self {
        CheckoutError::SubmissionFailed {
            message: err.message().to_string(),
            stock_conflict: err.is_stock_conflict(),
        }
    }
}

impl From<std::io::Error> for CheckoutError {
    fn from(err: std::io::Error) -> Self {
        CheckoutError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for CheckoutError {
    fn from(err: toml::de::Error) -> Self {
        CheckoutError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CheckoutError {
    fn from(err: toml::ser::Error) -> Self {
        CheckoutError::Config(err.to_string())
    }
}
