//! # Checkout Engine
//!
//! One cashier checkout: cart, discount, customer and payment step.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout                                                               │
//! │  ├── Cart ─────────── lines, bounded by the stock handed in            │
//! │  ├── DiscountMode ─── None | Manual | Voucher                          │
//! │  ├── customer ─────── Option<CustomerRef> (None = walk-in)             │
//! │  └── PaymentFlow ──── SelectingMethod | Cash | NonCash                 │
//! │                                                                         │
//! │  Totals are never stored; CartTotals::compute runs on demand.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Discount invalidation
//! Discounts are computed against the cart they were applied to. Any cart
//! mutation clears the discount so a stale amount never survives:
//! - `add_item`: cleared on every attempt, accepted or rejected
//! - `update_quantity`: cleared when the change is accepted
//! - `remove_item`, `clear`: always cleared
//!
//! A QR payment request issued for the old total is dropped as well.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, CartLine, QuantityChange};
use crate::discount::DiscountMode;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::payment::PaymentFlow;
use crate::pricing::CartTotals;
use crate::types::{
    CatalogItem, CustomerRef, PaymentMethod, SessionContext, TransactionRequest,
    VoucherApplication,
};
use crate::validation::parse_amount;
use crate::MAX_CART_LINES;

/// Business rules a checkout is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutRules {
    /// Maximum distinct cart lines.
    pub max_lines: usize,

    /// Reject the opposing discount mechanism instead of replacing it.
    pub lock_opposing_discount: bool,
}

impl Default for CheckoutRules {
    fn default() -> Self {
        CheckoutRules {
            max_lines: MAX_CART_LINES,
            lock_opposing_discount: false,
        }
    }
}

/// Everything the checkout screen renders, in one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutView {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
    pub discount: DiscountMode,
    pub customer: Option<CustomerRef>,
    pub payment: PaymentFlow,
    pub change: Money,
    pub can_apply_manual_discount: bool,
    pub can_apply_voucher: bool,
    pub can_confirm_payment: bool,
}

/// The checkout engine.
#[derive(Debug, Clone)]
pub struct Checkout {
    cart: Cart,
    discount: DiscountMode,
    customer: Option<CustomerRef>,
    payment: PaymentFlow,
    rules: CheckoutRules,
}

impl Default for Checkout {
    fn default() -> Self {
        Checkout::new(CheckoutRules::default())
    }
}

impl Checkout {
    /// Creates an empty checkout.
    pub fn new(rules: CheckoutRules) -> Self {
        Checkout {
            cart: Cart::with_max_lines(rules.max_lines),
            discount: DiscountMode::None,
            customer: None,
            payment: PaymentFlow::SelectingMethod,
            rules,
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds one unit of `item`, bounded by `item.stock`.
    pub fn add_item(&mut self, item: &CatalogItem) -> CoreResult<u32> {
        self.invalidate_discount();
        self.cart.add_item(item)
    }

    /// Changes a line by `delta`, bounded by `available_stock`.
    pub fn update_quantity(
        &mut self,
        item_id: &str,
        delta: i64,
        available_stock: u32,
    ) -> CoreResult<QuantityChange> {
        let change = self.cart.update_quantity(item_id, delta, available_stock)?;
        self.invalidate_discount();
        Ok(change)
    }

    /// Removes a line if present. Returns whether one was removed.
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        self.invalidate_discount();
        self.cart.remove_item(item_id)
    }

    /// Empties the cart and resets customer, discount and payment.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.discount.clear();
        self.customer = None;
        self.payment.reset();
    }

    // =========================================================================
    // Customer
    // =========================================================================

    /// Selects a customer, or `None` for a walk-in customer.
    pub fn select_customer(&mut self, customer: Option<CustomerRef>) {
        self.customer = customer;
    }

    // =========================================================================
    // Discounts
    // =========================================================================

    /// Whether the manual discount entry should be enabled.
    pub fn can_apply_manual_discount(&self) -> bool {
        !self.discount.is_voucher()
    }

    /// Whether the voucher entry should be enabled.
    pub fn can_apply_voucher(&self) -> bool {
        !self.discount.is_manual()
    }

    /// Applies a manual discount, capped at the subtotal.
    ///
    /// Replaces an active voucher unless the rules lock it in.
    /// Returns the amount actually applied.
    pub fn apply_manual_discount(&mut self, amount: Money) -> CoreResult<Money> {
        if self.rules.lock_opposing_discount && self.discount.is_voucher() {
            return Err(CoreError::DiscountConflict {
                requested: "manual",
                active: self.discount.label(),
            });
        }

        let subtotal = self.cart.subtotal();
        let applied = self.discount.set_manual(amount, subtotal)?;
        self.invalidate_pending_payment();
        Ok(applied)
    }

    /// Parses operator input and applies it as a manual discount.
    ///
    /// `decimals` is the currency's minor-unit exponent.
    /// Unparseable or negative input is an `InvalidDiscount`.
    pub fn apply_manual_discount_input(&mut self, input: &str, decimals: u32) -> CoreResult<Money> {
        let amount = parse_amount(input, "discount", decimals).map_err(|e| {
            CoreError::InvalidDiscount {
                reason: e.to_string(),
            }
        })?;
        self.apply_manual_discount(amount)
    }

    /// Resets a manual discount. A voucher is left alone.
    pub fn clear_manual_discount(&mut self) {
        if self.discount.is_manual() {
            self.discount.clear();
            self.invalidate_pending_payment();
        }
    }

    /// Checks whether a voucher may be applied right now.
    ///
    /// Called before resolving a code so a rejected attempt never
    /// reaches the resolver.
    pub fn ensure_voucher_allowed(&self) -> CoreResult<()> {
        if self.cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        if self.rules.lock_opposing_discount && self.discount.is_manual() {
            return Err(CoreError::DiscountConflict {
                requested: "voucher",
                active: self.discount.label(),
            });
        }
        Ok(())
    }

    /// Applies a resolved voucher, replacing any manual discount.
    pub fn apply_voucher(&mut self, application: VoucherApplication) -> CoreResult<()> {
        self.ensure_voucher_allowed()?;
        self.discount.set_voucher(application);
        self.invalidate_pending_payment();
        Ok(())
    }

    /// Removes the active voucher, if any.
    pub fn remove_voucher(&mut self) -> Option<VoucherApplication> {
        let removed = self.discount.remove_voucher();
        if removed.is_some() {
            self.invalidate_pending_payment();
        }
        removed
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Chooses the payment method.
    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.payment.select_method(method);
    }

    /// Records the cash tendered.
    pub fn enter_cash_tendered(&mut self, amount: Money) -> CoreResult<()> {
        self.payment.enter_cash_tendered(amount)
    }

    /// Records the gateway reference of an issued QR request.
    pub fn record_payment_reference(&mut self, reference: String) -> CoreResult<()> {
        self.payment.record_reference(reference)
    }

    /// Live change for the current payment input.
    pub fn change(&self) -> Money {
        self.payment.change(self.totals().grand_total)
    }

    /// Whether the confirm button should be enabled.
    pub fn can_confirm_payment(&self) -> bool {
        !self.cart.is_empty() && self.payment.can_confirm(self.totals().grand_total)
    }

    /// Confirms payment and builds the transaction request.
    ///
    /// Nothing is cleared here: the session clears only after the
    /// backend accepted the request.
    pub fn build_transaction(&self, context: &SessionContext) -> CoreResult<TransactionRequest> {
        if self.cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let totals = self.totals();
        let settlement = self.payment.settle(totals.grand_total)?;

        Ok(TransactionRequest {
            items: self.cart.transaction_lines(),
            payment_method: settlement.method,
            amount_tendered: settlement.amount_tendered,
            change: settlement.change,
            total_discount: totals.total_discount,
            subtotal: totals.subtotal,
            grand_total: totals.grand_total,
            customer_id: self.customer.as_ref().map(|c| c.id.clone()),
            voucher_id: self.discount.voucher().map(|v| v.voucher_id.clone()),
            payment_reference: settlement.reference,
            outlet_id: context.outlet_id.clone(),
            cashier_id: context.user_id.clone(),
        })
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    /// Current totals.
    pub fn totals(&self) -> CartTotals {
        CartTotals::compute(&self.cart, &self.discount)
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn discount(&self) -> &DiscountMode {
        &self.discount
    }

    pub fn customer(&self) -> Option<&CustomerRef> {
        self.customer.as_ref()
    }

    pub fn payment(&self) -> &PaymentFlow {
        &self.payment
    }

    pub fn rules(&self) -> CheckoutRules {
        self.rules
    }

    /// Full screen payload.
    pub fn view(&self) -> CheckoutView {
        CheckoutView {
            lines: self.cart.lines().to_vec(),
            totals: self.totals(),
            discount: self.discount.clone(),
            customer: self.customer.clone(),
            payment: self.payment.clone(),
            change: self.change(),
            can_apply_manual_discount: self.can_apply_manual_discount(),
            can_apply_voucher: self.can_apply_voucher(),
            can_confirm_payment: self.can_confirm_payment(),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn invalidate_discount(&mut self) {
        self.discount.clear();
        self.invalidate_pending_payment();
    }

    fn invalidate_pending_payment(&mut self) {
        if self.payment.is_pending() {
            self.payment.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Promotion, PromotionValue, Role};

    fn item(id: &str, price: i64, stock: u32) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: format!("Menu {}", id),
            price: Money::from_minor(price),
            category: "Minuman".to_string(),
            stock,
        }
    }

    fn voucher(value: PromotionValue) -> VoucherApplication {
        VoucherApplication {
            voucher_id: "voucher-1".to_string(),
            code: "HEMAT10".to_string(),
            promotion: Promotion {
                id: "promo-1".to_string(),
                name: "Hemat 10%".to_string(),
                value,
                starts_at: None,
                ends_at: None,
                outlet_ids: vec![],
            },
        }
    }

    fn context() -> SessionContext {
        SessionContext {
            user_id: "user-7".to_string(),
            name: "Sari".to_string(),
            role: Role::Cashier,
            outlet_id: "outlet-1".to_string(),
        }
    }

    fn exclusive(checkout: &Checkout) -> bool {
        !(checkout.discount().is_manual() && checkout.discount().is_voucher())
            && (checkout.totals().manual_discount.is_zero()
                || checkout.totals().voucher_discount.is_zero())
    }

    /// 10000 × 2, manual 5000, then a 10% voucher.
    #[test]
    fn test_manual_then_voucher_scenario() {
        let mut checkout = Checkout::default();
        let nasi = item("nasi", 10_000, 10);
        checkout.add_item(&nasi).unwrap();
        checkout.add_item(&nasi).unwrap();
        assert_eq!(checkout.totals().subtotal.minor(), 20_000);

        checkout.apply_manual_discount(Money::from_minor(5_000)).unwrap();
        assert_eq!(checkout.totals().grand_total.minor(), 15_000);
        assert!(exclusive(&checkout));

        checkout
            .apply_voucher(voucher(PromotionValue::Percentage { bps: 1000 }))
            .unwrap();
        let totals = checkout.totals();
        assert!(totals.manual_discount.is_zero());
        assert_eq!(totals.voucher_discount.minor(), 2_000);
        assert_eq!(totals.grand_total.minor(), 18_000);
        assert!(exclusive(&checkout));
    }

    #[test]
    fn test_manual_discount_clamped_to_subtotal() {
        let mut checkout = Checkout::default();
        let nasi = item("nasi", 10_000, 10);
        checkout.add_item(&nasi).unwrap();
        checkout.add_item(&nasi).unwrap();

        let applied = checkout
            .apply_manual_discount(Money::from_minor(99_999))
            .unwrap();
        assert_eq!(applied.minor(), 20_000);
        assert!(checkout.totals().grand_total.is_zero());
    }

    #[test]
    fn test_negative_manual_discount_rejected_without_change() {
        let mut checkout = Checkout::default();
        checkout.add_item(&item("a", 10_000, 5)).unwrap();
        checkout.apply_manual_discount(Money::from_minor(1_000)).unwrap();

        assert!(matches!(
            checkout.apply_manual_discount(Money::from_minor(-5)),
            Err(CoreError::InvalidDiscount { .. })
        ));
        assert_eq!(checkout.totals().manual_discount.minor(), 1_000);
    }

    #[test]
    fn test_manual_discount_from_input() {
        let mut checkout = Checkout::default();
        checkout.add_item(&item("a", 10_000, 5)).unwrap();

        let applied = checkout.apply_manual_discount_input(" 2500 ", 0).unwrap();
        assert_eq!(applied.minor(), 2_500);
        for input in ["abc", "-1", "1.5", ""] {
            assert!(
                matches!(
                    checkout.apply_manual_discount_input(input, 0),
                    Err(CoreError::InvalidDiscount { .. })
                ),
                "input {:?}",
                input
            );
        }
        assert_eq!(checkout.totals().manual_discount.minor(), 2_500);
    }

    #[test]
    fn test_huge_prices_never_panic_totals() {
        let mut checkout = Checkout::default();
        let huge = item("emas", i64::MAX / 2, 3);

        checkout.add_item(&huge).unwrap();
        checkout.add_item(&huge).unwrap();
        assert!(matches!(
            checkout.add_item(&huge),
            Err(CoreError::AmountTooLarge { .. })
        ));

        let totals = checkout.totals();
        assert_eq!(totals.subtotal.minor(), i64::MAX - 1);
        assert_eq!(totals.grand_total, totals.subtotal);
    }

    #[test]
    fn test_stock_one_scenario() {
        let mut checkout = Checkout::default();
        let last = item("last", 12_000, 1);

        assert_eq!(checkout.add_item(&last).unwrap(), 1);
        assert!(matches!(
            checkout.add_item(&last),
            Err(CoreError::StockExceeded { .. })
        ));
        assert_eq!(checkout.cart().quantity_of("last"), 1);
    }

    #[test]
    fn test_add_clears_discount_even_when_rejected() {
        let mut checkout = Checkout::default();
        let last = item("last", 12_000, 1);
        checkout.add_item(&last).unwrap();
        checkout.apply_manual_discount(Money::from_minor(2_000)).unwrap();

        assert!(checkout.add_item(&last).is_err());
        assert!(checkout.discount().is_none());
    }

    #[test]
    fn test_rejected_update_keeps_discount() {
        let mut checkout = Checkout::default();
        checkout.add_item(&item("a", 10_000, 2)).unwrap();
        checkout.apply_manual_discount(Money::from_minor(2_000)).unwrap();

        assert!(checkout.update_quantity("a", 5, 2).is_err());
        assert!(checkout.discount().is_manual());

        checkout.update_quantity("a", 1, 2).unwrap();
        assert!(checkout.discount().is_none());
    }

    #[test]
    fn test_remove_item_clears_voucher() {
        let mut checkout = Checkout::default();
        checkout.add_item(&item("a", 10_000, 2)).unwrap();
        checkout.add_item(&item("b", 5_000, 2)).unwrap();
        checkout
            .apply_voucher(voucher(PromotionValue::FixedAmount {
                amount: Money::from_minor(1_000),
            }))
            .unwrap();

        assert!(checkout.remove_item("b"));
        assert!(checkout.discount().is_none());
        // unconditional: unknown ids are not an error
        assert!(!checkout.remove_item("zzz"));
    }

    #[test]
    fn test_voucher_on_empty_cart_rejected() {
        let mut checkout = Checkout::default();
        assert_eq!(
            checkout
                .apply_voucher(voucher(PromotionValue::Percentage { bps: 1000 }))
                .unwrap_err(),
            CoreError::EmptyCart
        );
    }

    #[test]
    fn test_locked_discounts_reject_opposing_mechanism() {
        let mut checkout = Checkout::new(CheckoutRules {
            lock_opposing_discount: true,
            ..CheckoutRules::default()
        });
        checkout.add_item(&item("a", 10_000, 2)).unwrap();
        checkout.apply_manual_discount(Money::from_minor(1_000)).unwrap();

        assert!(!checkout.can_apply_voucher());
        assert_eq!(
            checkout
                .apply_voucher(voucher(PromotionValue::Percentage { bps: 1000 }))
                .unwrap_err(),
            CoreError::DiscountConflict {
                requested: "voucher",
                active: "manual",
            }
        );
        assert_eq!(checkout.totals().manual_discount.minor(), 1_000);

        checkout.clear_manual_discount();
        checkout
            .apply_voucher(voucher(PromotionValue::Percentage { bps: 1000 }))
            .unwrap();
        assert!(!checkout.can_apply_manual_discount());
        assert_eq!(
            checkout.apply_manual_discount(Money::from_minor(500)).unwrap_err(),
            CoreError::DiscountConflict {
                requested: "manual",
                active: "voucher",
            }
        );
    }

    #[test]
    fn test_remove_voucher_does_not_restore_manual() {
        let mut checkout = Checkout::default();
        checkout.add_item(&item("a", 10_000, 2)).unwrap();
        checkout.apply_manual_discount(Money::from_minor(1_000)).unwrap();
        checkout
            .apply_voucher(voucher(PromotionValue::Percentage { bps: 1000 }))
            .unwrap();

        assert!(checkout.remove_voucher().is_some());
        assert!(checkout.totals().total_discount.is_zero());
    }

    #[test]
    fn test_cash_scenario() {
        let mut checkout = Checkout::default();
        let a = item("a", 15_000, 3);
        checkout.add_item(&a).unwrap();
        checkout.select_payment_method(PaymentMethod::Cash);

        checkout.enter_cash_tendered(Money::from_minor(10_000)).unwrap();
        assert!(!checkout.can_confirm_payment());
        assert!(matches!(
            checkout.build_transaction(&context()),
            Err(CoreError::InsufficientPayment { .. })
        ));

        checkout.enter_cash_tendered(Money::from_minor(20_000)).unwrap();
        assert_eq!(checkout.change().minor(), 5_000);
        let request = checkout.build_transaction(&context()).unwrap();
        assert_eq!(request.payment_method, PaymentMethod::Cash);
        assert_eq!(request.amount_tendered.minor(), 20_000);
        assert_eq!(request.change.minor(), 5_000);
        assert_eq!(request.outlet_id, "outlet-1");
        assert_eq!(request.cashier_id, "user-7");
        // building does not clear anything
        assert!(!checkout.cart().is_empty());
    }

    #[test]
    fn test_transaction_request_carries_references() {
        let mut checkout = Checkout::default();
        checkout.add_item(&item("a", 10_000, 3)).unwrap();
        checkout.add_item(&item("a", 10_000, 3)).unwrap();
        checkout.select_customer(Some(CustomerRef {
            id: "cust-9".to_string(),
            name: "Budi".to_string(),
        }));
        checkout
            .apply_voucher(voucher(PromotionValue::Percentage { bps: 1000 }))
            .unwrap();
        checkout.select_payment_method(PaymentMethod::Debit);

        let request = checkout.build_transaction(&context()).unwrap();
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].quantity, 2);
        assert_eq!(request.customer_id.as_deref(), Some("cust-9"));
        assert_eq!(request.voucher_id.as_deref(), Some("voucher-1"));
        assert_eq!(request.total_discount.minor(), 2_000);
        assert_eq!(request.amount_tendered.minor(), 18_000);
        assert!(request.change.is_zero());
    }

    #[test]
    fn test_empty_cart_cannot_be_paid() {
        let mut checkout = Checkout::default();
        checkout.select_payment_method(PaymentMethod::Cash);
        assert!(!checkout.can_confirm_payment());
        assert_eq!(
            checkout.build_transaction(&context()).unwrap_err(),
            CoreError::EmptyCart
        );
    }

    #[test]
    fn test_cart_change_drops_pending_qr_request() {
        let mut checkout = Checkout::default();
        let a = item("a", 10_000, 3);
        checkout.add_item(&a).unwrap();
        checkout.select_payment_method(PaymentMethod::Qr);
        checkout.record_payment_reference("QR-1".to_string()).unwrap();
        assert!(checkout.payment().is_pending());

        checkout.add_item(&a).unwrap();
        assert_eq!(checkout.payment(), &PaymentFlow::SelectingMethod);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut checkout = Checkout::default();
        checkout.add_item(&item("a", 10_000, 3)).unwrap();
        checkout.select_customer(Some(CustomerRef {
            id: "c".to_string(),
            name: "C".to_string(),
        }));
        checkout.apply_manual_discount(Money::from_minor(100)).unwrap();
        checkout.select_payment_method(PaymentMethod::Cash);

        checkout.clear();
        assert!(checkout.cart().is_empty());
        assert!(checkout.customer().is_none());
        assert!(checkout.discount().is_none());
        assert_eq!(checkout.payment(), &PaymentFlow::SelectingMethod);
    }

    #[test]
    fn test_customer_independent_of_discount() {
        let mut checkout = Checkout::default();
        let a = item("a", 10_000, 3);
        checkout.select_customer(Some(CustomerRef {
            id: "c".to_string(),
            name: "C".to_string(),
        }));
        checkout.add_item(&a).unwrap();
        checkout.apply_manual_discount(Money::from_minor(100)).unwrap();
        checkout.add_item(&a).unwrap();
        assert!(checkout.customer().is_some());
    }

    #[test]
    fn test_grand_total_never_negative_across_operations() {
        let mut checkout = Checkout::default();
        let a = item("a", 3_000, 5);
        let b = item("b", 7_500, 5);
        let amounts = [0, 1, 2_999, 3_000, 50_000, i64::MAX / 4];

        for amount in amounts {
            checkout.add_item(&a).unwrap();
            checkout.add_item(&b).unwrap();
            checkout
                .apply_manual_discount(Money::from_minor(amount))
                .unwrap();
            let totals = checkout.totals();
            assert!(!totals.grand_total.is_negative());
            assert_eq!(
                totals.manual_discount,
                Money::from_minor(amount).capped_at(totals.subtotal)
            );
            checkout
                .apply_voucher(voucher(PromotionValue::FixedAmount {
                    amount: Money::from_minor(amount),
                }))
                .unwrap();
            assert!(!checkout.totals().grand_total.is_negative());
            assert!(exclusive(&checkout));
            checkout.clear();
        }
    }

    #[test]
    fn test_view_payload() {
        let mut checkout = Checkout::default();
        checkout.add_item(&item("a", 10_000, 3)).unwrap();
        checkout.select_payment_method(PaymentMethod::Cash);
        checkout.enter_cash_tendered(Money::from_minor(12_000)).unwrap();

        let view = checkout.view();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.change.minor(), 2_000);
        assert!(view.can_confirm_payment);
        assert!(view.can_apply_voucher);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["totals"]["grandTotal"], 10_000);
        assert_eq!(json["discount"]["mode"], "none");
        assert_eq!(json["payment"]["state"], "cash");
    }
}
