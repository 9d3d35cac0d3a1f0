//! # kasir-core: Pure Checkout Logic for Kasir POS
//!
//! Cart, discount and payment arithmetic of the cashier checkout screen.
//! Nothing in this crate performs I/O; stock numbers and resolved vouchers
//! are handed in by `kasir-checkout`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir POS Checkout                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Cashier Screen                               │   │
//! │  │    Catalog ──► Cart ──► Discount ──► Payment ──► Receipt       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-checkout                               │   │
//! │  │    CheckoutSession, collaborator ports, config, tracing        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasir-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌─────────┐ │   │
//! │  │   │  money  │ │  cart   │ │ discount │ │ pricing │ │ payment │ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └─────────┘ │   │
//! │  │                       checkout (engine)                         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer money in minor units
//! - [`types`] - Catalog items, promotions, payment methods, requests
//! - [`cart`] - Stock-bounded cart lines
//! - [`discount`] - Manual discount or voucher, never both
//! - [`pricing`] - Subtotal / discount / grand total
//! - [`payment`] - Payment method state machine and change
//! - [`checkout`] - The engine tying the above together
//! - [`validation`] - Operator input parsing
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::{CatalogItem, Checkout, Money, PaymentMethod};
//!
//! let mut checkout = Checkout::default();
//! let item = CatalogItem {
//!     id: "kopi".to_string(),
//!     name: "Kopi Susu".to_string(),
//!     price: Money::from_minor(15_000),
//!     category: "Minuman".to_string(),
//!     stock: 4,
//! };
//! checkout.add_item(&item).unwrap();
//!
//! checkout.select_payment_method(PaymentMethod::Cash);
//! checkout.enter_cash_tendered(Money::from_minor(20_000)).unwrap();
//! assert_eq!(checkout.change().minor(), 5_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod discount;
pub mod error;
pub mod money;
pub mod payment;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, QuantityChange};
pub use checkout::{Checkout, CheckoutRules, CheckoutView};
pub use discount::DiscountMode;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use payment::{PaymentFlow, PaymentSettlement};
pub use pricing::CartTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single cart.
///
/// Overridable per store through `CheckoutRules::max_lines`.
pub const MAX_CART_LINES: usize = 100;

/// Maximum length of a voucher code after trimming.
pub const MAX_VOUCHER_CODE_LEN: usize = 32;
