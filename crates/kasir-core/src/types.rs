//! # Domain Types
//!
//! Core domain types used by the checkout engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │  CatalogItem    │   │   Promotion     │   │ TransactionRequest  │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id             │   │  id             │   │  items (id + qty)   │   │
//! │  │  name           │   │  value          │   │  payment_method     │   │
//! │  │  price          │   │  window         │   │  tendered / change  │   │
//! │  │  stock          │   │  outlet scope   │   │  total_discount     │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │ SessionContext  │   │ PaymentMethod   │   │ SubmissionReceipt   │   │
//! │  │  user / role    │   │  Cash           │   │  invoice_id         │   │
//! │  │  outlet         │   │  Debit          │   │  timestamp          │   │
//! │  └─────────────────┘   │  Qr             │   └─────────────────────┘   │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything a backend might omit is an explicit `Option`, so callers
//! never inspect response shapes at runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Catalog
// =============================================================================

/// A menu item as returned by the catalog provider.
///
/// Read-only to the engine: stock is a snapshot from the last fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CatalogItem {
    /// Catalog identifier.
    pub id: String,

    /// Display name shown on the cashier screen.
    pub name: String,

    /// Unit price (non-negative).
    pub price: Money,

    /// Category label ("Makanan", "Minuman", ...).
    #[serde(default)]
    pub category: String,

    /// Available stock at fetch time.
    pub stock: u32,
}

impl CatalogItem {
    /// Checks if at least one unit can be sold.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Reference to a registered customer.
///
/// A session without one is a walk-in ("general") customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerRef {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Promotions & Vouchers
// =============================================================================

/// How a promotion discounts a subtotal.
///
/// Percentages are basis points: 1000 = 10%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum PromotionValue {
    /// Percentage of the subtotal.
    Percentage { bps: u32 },
    /// Fixed amount off the subtotal.
    FixedAmount { amount: Money },
}

/// A discount rule a voucher redeems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Promotion {
    pub id: String,
    pub name: String,
    pub value: PromotionValue,

    /// Start of the validity window (inclusive).
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,

    /// End of the validity window (inclusive).
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,

    /// Outlets this promotion is limited to. Empty means every outlet.
    #[serde(default)]
    pub outlet_ids: Vec<String>,
}

impl Promotion {
    /// Discount this promotion grants on `subtotal`, never more than it.
    ///
    /// ```rust
    /// use kasir_core::{Money, Promotion, PromotionValue};
    ///
    /// let promo = Promotion {
    ///     id: "p1".into(),
    ///     name: "Ten off".into(),
    ///     value: PromotionValue::Percentage { bps: 1000 },
    ///     starts_at: None,
    ///     ends_at: None,
    ///     outlet_ids: vec![],
    /// };
    /// assert_eq!(promo.discount_on(Money::from_minor(20_000)).minor(), 2_000);
    /// ```
    pub fn discount_on(&self, subtotal: Money) -> Money {
        let raw = match self.value {
            PromotionValue::Percentage { bps } => subtotal.percentage(bps),
            PromotionValue::FixedAmount { amount } => amount,
        };
        raw.max(Money::zero()).capped_at(subtotal.max(Money::zero()))
    }

    /// Checks the validity window against `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        let started = self.starts_at.map_or(true, |start| now >= start);
        let not_ended = self.ends_at.map_or(true, |end| now <= end);
        started && not_ended
    }

    /// Checks the outlet scope.
    pub fn applies_to_outlet(&self, outlet_id: &str) -> bool {
        self.outlet_ids.is_empty() || self.outlet_ids.iter().any(|id| id == outlet_id)
    }
}

/// A voucher successfully resolved to its promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VoucherApplication {
    /// Identifier of the resolved voucher.
    pub voucher_id: String,

    /// Code as entered (normalized).
    pub code: String,

    /// The promotion the voucher redeems.
    pub promotion: Promotion,
}

// =============================================================================
// Session Context
// =============================================================================

/// Role of the signed-in operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Admin,
    Manager,
    Cashier,
}

/// Operator context injected into a checkout session at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionContext {
    pub user_id: String,
    pub name: String,
    pub role: Role,
    pub outlet_id: String,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    /// Physical cash; the only method with a tendered amount and change.
    Cash,
    /// Debit card on an external terminal.
    Debit,
    /// QR payment issued through the payment gateway.
    Qr,
}

impl PaymentMethod {
    /// Returns true for the cash family.
    #[inline]
    pub fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }

    /// Returns true if a gateway payment request must precede confirmation.
    #[inline]
    pub fn requires_gateway(&self) -> bool {
        matches!(self, PaymentMethod::Qr)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Debit => write!(f, "debit"),
            PaymentMethod::Qr => write!(f, "qr"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" | "tunai" => Ok(PaymentMethod::Cash),
            "debit" | "card" => Ok(PaymentMethod::Debit),
            "qr" | "qris" => Ok(PaymentMethod::Qr),
            other => Err(ValidationError::InvalidFormat {
                field: "payment method".to_string(),
                reason: format!("unknown method '{}', expected cash, debit or qr", other),
            }),
        }
    }
}

// =============================================================================
// Transaction Request
// =============================================================================

/// A purchased line as sent to the backend: identifier and quantity only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionLine {
    pub item_id: String,
    pub quantity: u32,
}

/// The finalized checkout payload. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionRequest {
    pub items: Vec<TransactionLine>,
    pub payment_method: PaymentMethod,
    pub amount_tendered: Money,
    pub change: Money,
    pub total_discount: Money,
    pub subtotal: Money,
    pub grand_total: Money,
    pub customer_id: Option<String>,
    pub voucher_id: Option<String>,
    /// Gateway reference for QR payments.
    pub payment_reference: Option<String>,
    pub outlet_id: String,
    pub cashier_id: String,
}

// =============================================================================
// Submission Receipt
// =============================================================================

/// What the transaction submission collaborator returns on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SubmissionReceipt {
    pub invoice_id: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn promo(value: PromotionValue) -> Promotion {
        Promotion {
            id: "promo-1".to_string(),
            name: "Promo".to_string(),
            value,
            starts_at: None,
            ends_at: None,
            outlet_ids: vec![],
        }
    }

    #[test]
    fn test_percentage_discount() {
        let p = promo(PromotionValue::Percentage { bps: 1000 });
        assert_eq!(p.discount_on(Money::from_minor(20_000)).minor(), 2_000);
    }

    #[test]
    fn test_fixed_discount_clamped_to_subtotal() {
        let p = promo(PromotionValue::FixedAmount {
            amount: Money::from_minor(50_000),
        });
        assert_eq!(p.discount_on(Money::from_minor(20_000)).minor(), 20_000);
        assert!(p.discount_on(Money::zero()).is_zero());
    }

    #[test]
    fn test_percentage_over_hundred_clamped() {
        let p = promo(PromotionValue::Percentage { bps: 15_000 });
        assert_eq!(p.discount_on(Money::from_minor(8_000)).minor(), 8_000);
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let mut p = promo(PromotionValue::Percentage { bps: 500 });
        assert!(p.is_active_at(now));

        p.starts_at = Some(now + Duration::days(1));
        assert!(!p.is_active_at(now));

        p.starts_at = Some(now - Duration::days(2));
        p.ends_at = Some(now - Duration::days(1));
        assert!(!p.is_active_at(now));

        p.ends_at = Some(now + Duration::days(1));
        assert!(p.is_active_at(now));
    }

    #[test]
    fn test_outlet_scope() {
        let mut p = promo(PromotionValue::Percentage { bps: 500 });
        assert!(p.applies_to_outlet("outlet-1"));

        p.outlet_ids = vec!["outlet-2".to_string()];
        assert!(!p.applies_to_outlet("outlet-1"));
        assert!(p.applies_to_outlet("outlet-2"));
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("Tunai".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Debit);
        assert_eq!(" QRIS ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Qr);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_families() {
        assert!(PaymentMethod::Cash.is_cash());
        assert!(!PaymentMethod::Debit.is_cash());
        assert!(PaymentMethod::Qr.requires_gateway());
        assert!(!PaymentMethod::Debit.requires_gateway());
    }

    #[test]
    fn test_promotion_value_wire_shape() {
        let json = serde_json::to_value(PromotionValue::Percentage { bps: 1000 }).unwrap();
        assert_eq!(json["type"], "PERCENTAGE");
        assert_eq!(json["bps"], 1000);

        let json = serde_json::to_value(PromotionValue::FixedAmount {
            amount: Money::from_minor(5_000),
        })
        .unwrap();
        assert_eq!(json["type"], "FIXED_AMOUNT");
        assert_eq!(json["amount"], 5000);
    }

    #[test]
    fn test_catalog_item_category_optional() {
        let item: CatalogItem =
            serde_json::from_str(r#"{"id":"m1","name":"Nasi Goreng","price":25000,"stock":3}"#)
                .unwrap();
        assert_eq!(item.category, "");
        assert!(item.in_stock());
    }
}
