//! # Collaborator Ports
//!
//! The remote services a checkout session talks to.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CheckoutSession                                    │
//! │                                                                         │
//! │   CatalogProvider ───────► list_items()         menu + live stock      │
//! │   DiscountResolver ──────► resolve_voucher()    code → promotion       │
//! │   TransactionSubmitter ──► submit()             request → invoice      │
//! │   PaymentGateway ────────► request_payment()    QR reference           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every call is a request/response with no retry and no timeout applied by
//! the session. Implementations report failures as [`ServiceError`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use kasir_core::{
    CatalogItem, Money, PaymentMethod, SubmissionReceipt, TransactionRequest, VoucherApplication,
};

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service understood the request and refused it.
    #[error("{message}")]
    Rejected { message: String },

    /// The backend refused because stock changed underneath the cart.
    #[error("{message}")]
    StockConflict { message: String },

    /// The service could not be reached or failed internally.
    #[error("Service unavailable: {message}")]
    Unavailable { message: String },
}

impl ServiceError {
    pub fn rejected(message: impl Into<String>) -> Self {
        ServiceError::Rejected {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        ServiceError::Unavailable {
            message: message.into(),
        }
    }

    /// Classifies a raw backend rejection message.
    ///
    /// Backends report stock conflicts as free text; any message that
    /// mentions stock becomes [`ServiceError::StockConflict`].
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.to_lowercase().contains("stock") {
            ServiceError::StockConflict { message }
        } else {
            ServiceError::Rejected { message }
        }
    }

    /// The human readable message.
    pub fn message(&self) -> &str {
        match self {
            ServiceError::Rejected { message }
            | ServiceError::StockConflict { message }
            | ServiceError::Unavailable { message } => message,
        }
    }

    pub fn is_stock_conflict(&self) -> bool {
        matches!(self, ServiceError::StockConflict { .. })
    }
}

/// Menu items with their live stock.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, ServiceError>;
}

/// Turns a voucher code into a promotion.
///
/// `code` arrives trimmed and upper-cased. Existence, single use, validity
/// window and outlet scope are the resolver's concern.
#[async_trait]
pub trait DiscountResolver: Send + Sync {
    async fn resolve_voucher(
        &self,
        code: &str,
        outlet_id: &str,
    ) -> Result<VoucherApplication, ServiceError>;
}

/// Submits a finalized transaction.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(&self, request: &TransactionRequest) -> Result<SubmissionReceipt, ServiceError>;
}

/// Issues payment requests for gateway-backed methods.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Returns the gateway reference for the issued request.
    async fn request_payment(
        &self,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<String, ServiceError>;
}

/// The full set of collaborators a session is opened with.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn CatalogProvider>,
    pub vouchers: Arc<dyn DiscountResolver>,
    pub submitter: Arc<dyn TransactionSubmitter>,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
