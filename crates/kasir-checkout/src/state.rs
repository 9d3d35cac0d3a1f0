//! # Checkout State
//!
//! Shared handle to a [`CheckoutSession`] for the screen's command layer.
//!
//! ## Busy Gate
//! Screen commands can arrive concurrently (double taps, a confirm while a
//! voucher is still resolving). Only one may run at a time:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_voucher() ──► try_lock ✓ ──► resolve_voucher().await ──► unlock  │
//! │                                          │                              │
//! │  finalize() ───────► try_lock ✗ ──► CheckoutError::Busy (no waiting)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use kasir_core::{
    CheckoutView, Money, PaymentMethod, QuantityChange, SubmissionReceipt, VoucherApplication,
};

use crate::error::{CheckoutError, CheckoutResult};
use crate::session::CheckoutSession;

/// Cloneable, busy-gated checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutState {
    session: Arc<Mutex<CheckoutSession>>,
}

impl CheckoutState {
    pub fn new(session: CheckoutSession) -> Self {
        CheckoutState {
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Takes the session, failing fast with `Busy` if it is in use.
    pub fn acquire(&self) -> CheckoutResult<OwnedMutexGuard<CheckoutSession>> {
        self.session
            .clone()
            .try_lock_owned()
            .map_err(|_| CheckoutError::Busy)
    }

    /// Executes a synchronous operation with the session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// state.with_session(|s| s.add_item("kopi"))?;
    /// ```
    pub fn with_session<F, R>(&self, f: F) -> CheckoutResult<R>
    where
        F: FnOnce(&mut CheckoutSession) -> CheckoutResult<R>,
    {
        let mut session = self.acquire()?;
        f(&mut session)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    pub fn view(&self) -> CheckoutResult<CheckoutView> {
        self.with_session(|s| Ok(s.view()))
    }

    pub fn add_item(&self, item_id: &str) -> CheckoutResult<u32> {
        self.with_session(|s| s.add_item(item_id))
    }

    pub fn update_quantity(&self, item_id: &str, delta: i64) -> CheckoutResult<QuantityChange> {
        self.with_session(|s| s.update_quantity(item_id, delta))
    }

    pub fn remove_item(&self, item_id: &str) -> CheckoutResult<bool> {
        self.with_session(|s| Ok(s.remove_item(item_id)))
    }

    pub fn apply_manual_discount(&self, amount: Money) -> CheckoutResult<Money> {
        self.with_session(|s| s.apply_manual_discount(amount))
    }

    pub fn enter_cash_tendered(&self, amount: Money) -> CheckoutResult<()> {
        self.with_session(|s| s.enter_cash_tendered(amount))
    }

    pub fn clear(&self) -> CheckoutResult<()> {
        self.with_session(|s| {
            s.clear();
            Ok(())
        })
    }

    pub async fn apply_voucher(&self, code: &str) -> CheckoutResult<VoucherApplication> {
        let mut session = self.acquire()?;
        session.apply_voucher(code).await
    }

    pub async fn select_payment_method(&self, method: PaymentMethod) -> CheckoutResult<()> {
        let mut session = self.acquire()?;
        session.select_payment_method(method).await
    }

    pub async fn finalize(&self) -> CheckoutResult<SubmissionReceipt> {
        let mut session = self.acquire()?;
        session.finalize().await
    }

    pub async fn refresh_catalog(&self) -> CheckoutResult<()> {
        let mut session = self.acquire()?;
        session.refresh_catalog().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckoutConfig;
    use crate::in_memory::InMemoryBackend;
    use kasir_core::{CatalogItem, Role, SessionContext};

    async fn state() -> (CheckoutState, InMemoryBackend) {
        let backend = InMemoryBackend::new(vec![CatalogItem {
            id: "kopi".to_string(),
            name: "Kopi Susu".to_string(),
            price: Money::from_minor(15_000),
            category: "Minuman".to_string(),
            stock: 3,
        }]);
        let context = SessionContext {
            user_id: "user-1".to_string(),
            name: "Sari".to_string(),
            role: Role::Cashier,
            outlet_id: "default-outlet".to_string(),
        };
        let session = CheckoutSession::open(context, CheckoutConfig::default(), backend.collaborators())
            .await
            .unwrap();
        (CheckoutState::new(session), backend)
    }

    #[tokio::test]
    async fn test_second_operation_is_rejected_while_busy() {
        let (state, _backend) = state().await;
        state.add_item("kopi").unwrap();

        let held = state.acquire().unwrap();
        assert_eq!(state.add_item("kopi").unwrap_err(), CheckoutError::Busy);
        assert_eq!(state.finalize().await.unwrap_err(), CheckoutError::Busy);
        drop(held);

        assert_eq!(state.add_item("kopi").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_commands_through_state() {
        let (state, backend) = state().await;
        state.add_item("kopi").unwrap();
        state.select_payment_method(PaymentMethod::Cash).await.unwrap();
        state.enter_cash_tendered(Money::from_minor(20_000)).unwrap();

        let view = state.view().unwrap();
        assert_eq!(view.change.minor(), 5_000);
        assert!(view.can_confirm_payment);

        let receipt = state.finalize().await.unwrap();
        assert_eq!(receipt.invoice_id, "INV-000001");
        assert!(state.view().unwrap().lines.is_empty());
        assert_eq!(backend.catalog.stock_of("kopi").await, Some(2));
    }

    #[tokio::test]
    async fn test_clones_share_the_session() {
        let (state, _backend) = state().await;
        let other = state.clone();
        state.add_item("kopi").unwrap();
        assert_eq!(other.view().unwrap().totals.total_quantity, 1);
        assert!(other.remove_item("kopi").unwrap());
    }
}
