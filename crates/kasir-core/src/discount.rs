//! # Discount Mode
//!
//! The two discount mechanisms of the checkout screen, as one value.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        DiscountMode                                     │
//! │                                                                         │
//! │              set_manual()                set_voucher()                  │
//! │   ┌──────┐ ─────────────► ┌──────────┐ ─────────────► ┌─────────────┐  │
//! │   │ None │                │ Manual   │                │ Voucher     │  │
//! │   └──────┘ ◄───────────── └──────────┘ ◄───────────── └─────────────┘  │
//! │      ▲         clear()                   set_manual()        │          │
//! │      └───────────────── remove_voucher() / clear() ──────────┘          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Holding at most one variant makes "manual and voucher at the same time"
//! unrepresentable. Applying either one replaces the other.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::VoucherApplication;

/// Active discount for the session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(tag = "mode", rename_all = "snake_case")]
#[ts(export)]
pub enum DiscountMode {
    /// No discount.
    #[default]
    None,

    /// Operator-entered amount, already clamped to the subtotal.
    Manual { amount: Money },

    /// A resolved voucher; its amount is recomputed from the subtotal.
    Voucher { application: VoucherApplication },
}

impl DiscountMode {
    /// Short name used in logs and conflict messages.
    pub fn label(&self) -> &'static str {
        match self {
            DiscountMode::None => "none",
            DiscountMode::Manual { .. } => "manual",
            DiscountMode::Voucher { .. } => "voucher",
        }
    }

    /// Returns true when no discount is active.
    pub fn is_none(&self) -> bool {
        matches!(self, DiscountMode::None)
    }

    /// Returns true for a manual discount.
    pub fn is_manual(&self) -> bool {
        matches!(self, DiscountMode::Manual { .. })
    }

    /// Returns true for a voucher.
    pub fn is_voucher(&self) -> bool {
        matches!(self, DiscountMode::Voucher { .. })
    }

    /// The active voucher, if any.
    pub fn voucher(&self) -> Option<&VoucherApplication> {
        match self {
            DiscountMode::Voucher { application } => Some(application),
            _ => None,
        }
    }

    /// The manual amount (zero unless a manual discount is active).
    pub fn manual_amount(&self) -> Money {
        match self {
            DiscountMode::Manual { amount } => *amount,
            _ => Money::zero(),
        }
    }

    /// Voucher discount against `subtotal` (zero without a voucher).
    ///
    /// Clamped to the subtotal, so it never inverts the total.
    pub fn voucher_amount(&self, subtotal: Money) -> Money {
        match self {
            DiscountMode::Voucher { application } => application.promotion.discount_on(subtotal),
            _ => Money::zero(),
        }
    }

    /// Sets a manual discount, replacing any voucher.
    ///
    /// ## Rules
    /// - Negative amounts are rejected and nothing changes
    /// - Amounts above `subtotal` are capped at the subtotal
    /// - An amount of zero leaves no discount active
    ///
    /// ## Returns
    /// The amount actually applied.
    pub fn set_manual(&mut self, amount: Money, subtotal: Money) -> CoreResult<Money> {
        if amount.is_negative() {
            return Err(CoreError::InvalidDiscount {
                reason: "discount must not be negative".to_string(),
            });
        }

        let applied = amount.capped_at(subtotal.max(Money::zero()));
        *self = if applied.is_zero() {
            DiscountMode::None
        } else {
            DiscountMode::Manual { amount: applied }
        };
        Ok(applied)
    }

    /// Sets a voucher, replacing any manual discount.
    pub fn set_voucher(&mut self, application: VoucherApplication) {
        *self = DiscountMode::Voucher { application };
    }

    /// Removes the voucher, if one is active.
    ///
    /// A manual discount that the voucher replaced is not restored.
    pub fn remove_voucher(&mut self) -> Option<VoucherApplication> {
        if self.is_voucher() {
            match std::mem::take(self) {
                DiscountMode::Voucher { application } => Some(application),
                _ => None,
            }
        } else {
            None
        }
    }

    /// Resets to no discount.
    pub fn clear(&mut self) {
        *self = DiscountMode::None;
    }
}
