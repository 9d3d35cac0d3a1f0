//! # Pricing
//!
//! Subtotal, discount and grand total, derived from (Cart, DiscountMode).
//!
//! ```text
//! subtotal         = Σ(unit_price × quantity)
//! voucher_discount = min(promotion on subtotal, subtotal)
//! total_discount   = voucher_discount + manual_discount
//! grand_total      = max(0, subtotal − total_discount)
//! ```
//!
//! No side effects: recomputed after every state change instead of cached.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::discount::DiscountMode;
use crate::money::Money;

/// Totals summary for the checkout screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: u64,
    pub subtotal: Money,
    pub manual_discount: Money,
    pub voucher_discount: Money,
    pub total_discount: Money,
    pub grand_total: Money,
}

impl CartTotals {
    /// Computes totals for `cart` under `discount`.
    pub fn compute(cart: &Cart, discount: &DiscountMode) -> Self {
        let subtotal = cart.subtotal();
        let voucher_discount = discount.voucher_amount(subtotal);
        let manual_discount = discount.manual_amount();
        let total_discount = voucher_discount + manual_discount;

        CartTotals {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            subtotal,
            manual_discount,
            voucher_discount,
            total_discount,
            grand_total: subtotal.saturating_sub_floor(total_discount),
        }
    }
}
