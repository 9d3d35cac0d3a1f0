//! # Checkout Session
//!
//! One cashier's checkout: the pure engine plus the collaborators it needs.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout Session Operations                          │
//! │                                                                         │
//! │  Screen Action         Session Method            Collaborator           │
//! │  ─────────────         ──────────────            ────────────           │
//! │                                                                         │
//! │  Open screen ────────► open() ─────────────────► list_items()          │
//! │  Tap item ───────────► add_item(id) ───────────► (cached catalog)      │
//! │  +/- buttons ────────► update_quantity(id, Δ)                          │
//! │  Enter voucher ──────► apply_voucher(code) ────► resolve_voucher()     │
//! │  Choose QR ──────────► select_payment_method() ► request_payment()     │
//! │  Confirm ────────────► finalize() ─────────────► submit()              │
//! │                            │                                            │
//! │                            ├─ accepted: clear, refresh catalog          │
//! │                            └─ stock conflict: keep cart, refresh        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed operation leaves the session as it was. Nothing is retried.

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use kasir_core::validation::{normalize_voucher_code, parse_amount, validate_price};
use kasir_core::{
    CartTotals, CatalogItem, Checkout, CheckoutView, CustomerRef, Money, PaymentMethod,
    PromotionValue, QuantityChange, SessionContext, SubmissionReceipt, VoucherApplication,
};

use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, CheckoutResult};
use crate::ports::Collaborators;

/// A checkout session bound to one operator and outlet.
#[derive(Debug)]
pub struct CheckoutSession {
    id: Uuid,
    context: SessionContext,
    config: CheckoutConfig,
    collaborators: Collaborators,
    catalog: Vec<CatalogItem>,
    checkout: Checkout,
    last_receipt: Option<SubmissionReceipt>,
}

/// Drops catalog entries whose price fails validation.
fn sellable_items(items: Vec<CatalogItem>) -> Vec<CatalogItem> {
    items
        .into_iter()
        .filter(|item| match validate_price(item.price) {
            Ok(()) => true,
            Err(e) => {
                warn!(item_id = %item.id, price = %item.price, error = %e, "Skipping catalog item");
                false
            }
        })
        .collect()
}

impl CheckoutSession {
    /// Opens a session and loads the catalog.
    #[instrument(skip_all, fields(outlet_id = %context.outlet_id, user_id = %context.user_id))]
    pub async fn open(
        context: SessionContext,
        config: CheckoutConfig,
        collaborators: Collaborators,
    ) -> CheckoutResult<Self> {
        if context.outlet_id != config.outlet_id() {
            warn!(
                configured = %config.outlet_id(),
                "Session outlet differs from the configured outlet"
            );
        }

        let catalog = collaborators
            .catalog
            .list_items()
            .await
            .map_err(|e| CheckoutError::CatalogUnavailable(e.message().to_string()))
            .map(sellable_items)?;

        let session = CheckoutSession {
            id: Uuid::new_v4(),
            checkout: Checkout::new(config.rules()),
            context,
            config,
            collaborators,
            catalog,
            last_receipt: None,
        };

        info!(
            session_id = %session.id,
            items = session.catalog.len(),
            "Checkout session opened"
        );
        Ok(session)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Re-fetches the catalog. The cached one is kept on failure.
    #[instrument(skip(self), fields(session_id = %self.id, outlet_id = %self.context.outlet_id))]
    pub async fn refresh_catalog(&mut self) -> CheckoutResult<()> {
        match self.collaborators.catalog.list_items().await {
            Ok(items) => {
                debug!(items = items.len(), "Catalog refreshed");
                self.catalog = sellable_items(items);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Catalog refresh failed");
                Err(CheckoutError::CatalogUnavailable(e.message().to_string()))
            }
        }
    }

    /// Looks up an item in the cached catalog.
    pub fn catalog_item(&self, item_id: &str) -> CheckoutResult<&CatalogItem> {
        self.catalog
            .iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| CheckoutError::ItemNotFound(item_id.to_string()))
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds one unit of a catalog item.
    #[instrument(skip(self), fields(session_id = %self.id, outlet_id = %self.context.outlet_id))]
    pub fn add_item(&mut self, item_id: &str) -> CheckoutResult<u32> {
        let item = self.catalog_item(item_id)?.clone();
        match self.checkout.add_item(&item) {
            Ok(quantity) => {
                info!(quantity, "Item added");
                Ok(quantity)
            }
            Err(e) => {
                warn!(error = %e, "Add item rejected");
                Err(e.into())
            }
        }
    }

    /// Changes a line's quantity by `delta`.
    #[instrument(skip(self), fields(session_id = %self.id, outlet_id = %self.context.outlet_id))]
    pub fn update_quantity(&mut self, item_id: &str, delta: i64) -> CheckoutResult<QuantityChange> {
        let stock = self.catalog_item(item_id)?.stock;
        match self.checkout.update_quantity(item_id, delta, stock) {
            Ok(change) => {
                info!(?change, "Quantity updated");
                Ok(change)
            }
            Err(e) => {
                warn!(error = %e, "Quantity update rejected");
                Err(e.into())
            }
        }
    }

    /// Removes a line. Returns whether one was present.
    #[instrument(skip(self), fields(session_id = %self.id, outlet_id = %self.context.outlet_id))]
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let removed = self.checkout.remove_item(item_id);
        debug!(removed, "Remove item");
        removed
    }

    /// Empties the cart and resets customer, discount and payment.
    pub fn clear(&mut self) {
        self.checkout.clear();
        info!(session_id = %self.id, "Checkout cleared");
    }

    pub fn select_customer(&mut self, customer: Option<CustomerRef>) {
        debug!(
            session_id = %self.id,
            customer_id = customer.as_ref().map(|c| c.id.as_str()),
            "Customer selected"
        );
        self.checkout.select_customer(customer);
    }

    // =========================================================================
    // Discounts
    // =========================================================================

    /// Applies a manual discount amount.
    #[instrument(skip(self), fields(session_id = %self.id, outlet_id = %self.context.outlet_id))]
    pub fn apply_manual_discount(&mut self, amount: Money) -> CheckoutResult<Money> {
        match self.checkout.apply_manual_discount(amount) {
            Ok(applied) => {
                info!(%applied, "Manual discount applied");
                Ok(applied)
            }
            Err(e) => {
                warn!(error = %e, "Manual discount rejected");
                Err(e.into())
            }
        }
    }

    /// Parses operator input in the configured currency, then applies it.
    #[instrument(skip(self), fields(session_id = %self.id, outlet_id = %self.context.outlet_id))]
    pub fn apply_manual_discount_input(&mut self, input: &str) -> CheckoutResult<Money> {
        let decimals = u32::from(self.config.currency.decimals);
        match self.checkout.apply_manual_discount_input(input, decimals) {
            Ok(applied) => {
                info!(%applied, "Manual discount applied");
                Ok(applied)
            }
            Err(e) => {
                warn!(error = %e, "Manual discount rejected");
                Err(e.into())
            }
        }
    }

    pub fn clear_manual_discount(&mut self) {
        self.checkout.clear_manual_discount();
    }

    /// Resolves a voucher code and applies it.
    ///
    /// The cart is checked first so a code is never resolved for a cart
    /// that could not take it.
    #[instrument(skip(self), fields(session_id = %self.id, outlet_id = %self.context.outlet_id))]
    pub async fn apply_voucher(&mut self, code: &str) -> CheckoutResult<VoucherApplication> {
        let code = normalize_voucher_code(code).map_err(kasir_core::CoreError::from)?;
        self.checkout.ensure_voucher_allowed()?;

        let application = self
            .collaborators
            .vouchers
            .resolve_voucher(&code, &self.context.outlet_id)
            .await
            .map_err(|e| {
                warn!(%code, error = %e, "Voucher rejected by resolver");
                CheckoutError::voucher_rejected(&code, e)
            })?;

        if let PromotionValue::Percentage { bps } = application.promotion.value {
            if bps > self.config.discount.max_percentage_bps {
                warn!(%code, bps, "Voucher exceeds maximum percentage");
                return Err(CheckoutError::VoucherRejected {
                    code,
                    message: "Voucher exceeds the maximum allowed percentage".to_string(),
                });
            }
        }

        self.checkout.apply_voucher(application.clone())?;
        info!(%code, voucher_id = %application.voucher_id, "Voucher applied");
        Ok(application)
    }

    pub fn remove_voucher(&mut self) -> Option<VoucherApplication> {
        let removed = self.checkout.remove_voucher();
        if let Some(voucher) = &removed {
            info!(session_id = %self.id, code = %voucher.code, "Voucher removed");
        }
        removed
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Chooses the payment method.
    ///
    /// For gateway methods the payment request is issued first; if the
    /// gateway fails the previous selection is kept.
    #[instrument(skip(self), fields(session_id = %self.id, outlet_id = %self.context.outlet_id))]
    pub async fn select_payment_method(&mut self, method: PaymentMethod) -> CheckoutResult<()> {
        if !method.requires_gateway() {
            self.checkout.select_payment_method(method);
            debug!(%method, "Payment method selected");
            return Ok(());
        }

        if self.checkout.cart().is_empty() {
            return Err(kasir_core::CoreError::EmptyCart.into());
        }

        let amount = self.checkout.totals().grand_total;
        let reference = self
            .collaborators
            .gateway
            .request_payment(amount, method)
            .await
            .map_err(|e| {
                warn!(%method, error = %e, "Payment request failed");
                CheckoutError::PaymentRequestFailed(e.message().to_string())
            })?;

        self.checkout.select_payment_method(method);
        self.checkout.record_payment_reference(reference.clone())?;
        info!(%method, %amount, %reference, "Payment request issued");
        Ok(())
    }

    /// Records the cash tendered.
    pub fn enter_cash_tendered(&mut self, amount: Money) -> CheckoutResult<()> {
        Ok(self.checkout.enter_cash_tendered(amount)?)
    }

    /// Parses the cash tendered input in the configured currency.
    pub fn enter_cash_tendered_input(&mut self, input: &str) -> CheckoutResult<()> {
        let amount = parse_amount(input, "cash tendered", u32::from(self.config.currency.decimals))
            .map_err(kasir_core::CoreError::from)?;
        self.enter_cash_tendered(amount)
    }

    /// Confirms payment and submits the transaction.
    ///
    /// ## On success
    /// The checkout is cleared and the catalog re-fetched.
    ///
    /// ## On failure
    /// The cart, discount and payment input are kept. A stock conflict
    /// triggers a catalog refresh so the cashier sees the new stock.
    #[instrument(skip(self), fields(session_id = %self.id, outlet_id = %self.context.outlet_id))]
    pub async fn finalize(&mut self) -> CheckoutResult<SubmissionReceipt> {
        let request = self.checkout.build_transaction(&self.context).map_err(|e| {
            warn!(error = %e, "Finalize rejected");
            CheckoutError::from(e)
        })?;

        match self.collaborators.submitter.submit(&request).await {
            Ok(receipt) => {
                info!(
                    invoice_id = %receipt.invoice_id,
                    grand_total = %request.grand_total,
                    method = %request.payment_method,
                    "Transaction submitted"
                );
                self.checkout.clear();
                self.last_receipt = Some(receipt.clone());
                if let Err(e) = self.refresh_catalog().await {
                    warn!(error = %e, "Catalog stale after successful transaction");
                }
                Ok(receipt)
            }
            Err(e) => {
                warn!(error = %e, "Transaction rejected");
                let err = CheckoutError::submission_failed(&e);
                if e.is_stock_conflict() {
                    if let Err(refresh) = self.refresh_catalog().await {
                        warn!(error = %refresh, "Catalog refresh after stock conflict failed");
                    }
                }
                Err(err)
            }
        }
    }

    // =========================================================================
    // Read Access
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    pub fn catalog(&self) -> &[CatalogItem] {
        &self.catalog
    }

    pub fn checkout(&self) -> &Checkout {
        &self.checkout
    }

    pub fn totals(&self) -> CartTotals {
        self.checkout.totals()
    }

    pub fn view(&self) -> CheckoutView {
        self.checkout.view()
    }

    /// Receipt of the last accepted transaction.
    pub fn last_receipt(&self) -> Option<&SubmissionReceipt> {
        self.last_receipt.as_ref()
    }
}
