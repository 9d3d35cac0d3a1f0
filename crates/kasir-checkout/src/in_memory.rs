//! # In-Memory Collaborators
//!
//! Thread-safe implementations of the collaborator ports, for tests and
//! local development without a backend.
//!
//! ```text
//! RecordingSubmitter ──┬──► InMemoryCatalog        stock taken on submit
//!                      └──► InMemoryVoucherStore   voucher marked redeemed
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use kasir_core::{
    CatalogItem, Money, PaymentMethod, Promotion, SubmissionReceipt, TransactionLine,
    TransactionRequest, VoucherApplication,
};

use crate::ports::{
    CatalogProvider, Collaborators, DiscountResolver, PaymentGateway, ServiceError,
    TransactionSubmitter,
};

// =============================================================================
// Catalog
// =============================================================================

/// Menu items with mutable stock.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    items: Arc<RwLock<Vec<CatalogItem>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        InMemoryCatalog {
            items: Arc::new(RwLock::new(items)),
            unavailable: Arc::default(),
        }
    }

    /// Overwrites the stock of one item.
    pub async fn set_stock(&self, item_id: &str, stock: u32) {
        let mut items = self.items.write().await;
        if let Some(item) = items.iter_mut().find(|i| i.id == item_id) {
            item.stock = stock;
        }
    }

    /// Current stock of one item.
    pub async fn stock_of(&self, item_id: &str) -> Option<u32> {
        let items = self.items.read().await;
        items.iter().find(|i| i.id == item_id).map(|i| i.stock)
    }

    /// Makes `list_items` fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Takes sold quantities out of stock, all or nothing.
    async fn apply_sale(&self, lines: &[TransactionLine]) -> Result<(), ServiceError> {
        let mut items = self.items.write().await;

        for line in lines {
            let item = items
                .iter()
                .find(|i| i.id == line.item_id)
                .ok_or_else(|| ServiceError::rejected(format!("Unknown item {}", line.item_id)))?;
            if item.stock < line.quantity {
                return Err(ServiceError::from_message(format!(
                    "Insufficient stock for {}: {} available, {} requested",
                    item.name, item.stock, line.quantity
                )));
            }
        }

        for line in lines {
            if let Some(item) = items.iter_mut().find(|i| i.id == line.item_id) {
                item.stock -= line.quantity;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogProvider for InMemoryCatalog {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, ServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::unavailable("catalog service offline"));
        }
        Ok(self.items.read().await.clone())
    }
}

// =============================================================================
// Vouchers
// =============================================================================

/// Single-use voucher codes mapped to promotions.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVoucherStore {
    vouchers: Arc<RwLock<HashMap<String, (String, Promotion)>>>,
    redeemed: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryVoucherStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a voucher. `code` is stored upper-cased.
    pub async fn insert(&self, voucher_id: &str, code: &str, promotion: Promotion) {
        let mut vouchers = self.vouchers.write().await;
        vouchers.insert(
            code.trim().to_uppercase(),
            (voucher_id.to_string(), promotion),
        );
    }

    /// Marks a voucher as used.
    pub async fn redeem(&self, voucher_id: &str) {
        self.redeemed.write().await.insert(voucher_id.to_string());
    }

    pub async fn is_redeemed(&self, voucher_id: &str) -> bool {
        self.redeemed.read().await.contains(voucher_id)
    }
}

#[async_trait]
impl DiscountResolver for InMemoryVoucherStore {
    async fn resolve_voucher(
        &self,
        code: &str,
        outlet_id: &str,
    ) -> Result<VoucherApplication, ServiceError> {
        let (voucher_id, promotion) = {
            let vouchers = self.vouchers.read().await;
            vouchers
                .get(code)
                .cloned()
                .ok_or_else(|| ServiceError::rejected("Voucher not found"))?
        };

        if self.is_redeemed(&voucher_id).await {
            return Err(ServiceError::rejected("Voucher has already been used"));
        }
        if !promotion.is_active_at(Utc::now()) {
            return Err(ServiceError::rejected("Voucher is not active"));
        }
        if !promotion.applies_to_outlet(outlet_id) {
            return Err(ServiceError::rejected("Voucher is not valid for this outlet"));
        }

        Ok(VoucherApplication {
            voucher_id,
            code: code.to_string(),
            promotion,
        })
    }
}

// =============================================================================
// Submission
// =============================================================================

/// Accepts transactions, recording each one.
///
/// Invoice ids are sequential: `INV-000001`, `INV-000002`, ...
#[derive(Debug, Clone)]
pub struct RecordingSubmitter {
    catalog: InMemoryCatalog,
    vouchers: InMemoryVoucherStore,
    submitted: Arc<RwLock<Vec<TransactionRequest>>>,
    next_invoice: Arc<AtomicU64>,
    fail_next: Arc<Mutex<Option<ServiceError>>>,
}

impl RecordingSubmitter {
    pub fn new(catalog: InMemoryCatalog, vouchers: InMemoryVoucherStore) -> Self {
        RecordingSubmitter {
            catalog,
            vouchers,
            submitted: Arc::default(),
            next_invoice: Arc::new(AtomicU64::new(1)),
            fail_next: Arc::default(),
        }
    }

    /// Makes the next submission fail with `err`.
    pub async fn fail_next(&self, err: ServiceError) {
        *self.fail_next.lock().await = Some(err);
    }

    /// Every accepted request, in order.
    pub async fn submitted(&self) -> Vec<TransactionRequest> {
        self.submitted.read().await.clone()
    }
}

#[async_trait]
impl TransactionSubmitter for RecordingSubmitter {
    async fn submit(&self, request: &TransactionRequest) -> Result<SubmissionReceipt, ServiceError> {
        if let Some(err) = self.fail_next.lock().await.take() {
            return Err(err);
        }

        self.catalog.apply_sale(&request.items).await?;
        if let Some(voucher_id) = &request.voucher_id {
            self.vouchers.redeem(voucher_id).await;
        }

        self.submitted.write().await.push(request.clone());
        let number = self.next_invoice.fetch_add(1, Ordering::SeqCst);

        Ok(SubmissionReceipt {
            invoice_id: format!("INV-{:06}", number),
            timestamp: Utc::now(),
            message: Some("Transaction recorded".to_string()),
        })
    }
}

// =============================================================================
// Payment Gateway
// =============================================================================

/// Issues deterministic references: `QR-000001`, `QR-000002`, ...
#[derive(Debug, Clone)]
pub struct InMemoryPaymentGateway {
    next_reference: Arc<AtomicU64>,
    requests: Arc<RwLock<Vec<(Money, PaymentMethod)>>>,
    fail_next: Arc<Mutex<Option<ServiceError>>>,
}

impl Default for InMemoryPaymentGateway {
    fn default() -> Self {
        InMemoryPaymentGateway {
            next_reference: Arc::new(AtomicU64::new(1)),
            requests: Arc::default(),
            fail_next: Arc::default(),
        }
    }
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_next(&self, err: ServiceError) {
        *self.fail_next.lock().await = Some(err);
    }

    /// Every issued request as `(amount, method)`.
    pub async fn requests(&self) -> Vec<(Money, PaymentMethod)> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn request_payment(
        &self,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<String, ServiceError> {
        if let Some(err) = self.fail_next.lock().await.take() {
            return Err(err);
        }
        if !method.requires_gateway() {
            return Err(ServiceError::rejected(format!(
                "{} payments are not handled by the gateway",
                method
            )));
        }

        self.requests.write().await.push((amount, method));
        let number = self.next_reference.fetch_add(1, Ordering::SeqCst);
        Ok(format!("QR-{:06}", number))
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// All four collaborators sharing one catalog and voucher store.
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    pub catalog: InMemoryCatalog,
    pub vouchers: InMemoryVoucherStore,
    pub submitter: RecordingSubmitter,
    pub gateway: InMemoryPaymentGateway,
}

impl InMemoryBackend {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        let catalog = InMemoryCatalog::new(items);
        let vouchers = InMemoryVoucherStore::new();
        let submitter = RecordingSubmitter::new(catalog.clone(), vouchers.clone());
        InMemoryBackend {
            catalog,
            vouchers,
            submitter,
            gateway: InMemoryPaymentGateway::new(),
        }
    }

    /// Port handles for a session.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            catalog: Arc::new(self.catalog.clone()),
            vouchers: Arc::new(self.vouchers.clone()),
            submitter: Arc::new(self.submitter.clone()),
            gateway: Arc::new(self.gateway.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use kasir_core::PromotionValue;

    fn item(id: &str, price: i64, stock: u32) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: format!("Menu {}", id),
            price: Money::from_minor(price),
            category: String::new(),
            stock,
        }
    }

    fn promotion() -> Promotion {
        Promotion {
            id: "promo-1".to_string(),
            name: "Hemat 10%".to_string(),
            value: PromotionValue::Percentage { bps: 1000 },
            starts_at: None,
            ends_at: None,
            outlet_ids: vec![],
        }
    }

    fn request(lines: Vec<(&str, u32)>, voucher_id: Option<&str>) -> TransactionRequest {
        TransactionRequest {
            items: lines
                .into_iter()
                .map(|(id, quantity)| TransactionLine {
                    item_id: id.to_string(),
                    quantity,
                })
                .collect(),
            payment_method: PaymentMethod::Debit,
            amount_tendered: Money::from_minor(1_000),
            change: Money::zero(),
            total_discount: Money::zero(),
            subtotal: Money::from_minor(1_000),
            grand_total: Money::from_minor(1_000),
            customer_id: None,
            voucher_id: voucher_id.map(str::to_string),
            payment_reference: None,
            outlet_id: "outlet-1".to_string(),
            cashier_id: "user-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_catalog_lists_and_fails_on_demand() {
        let catalog = InMemoryCatalog::new(vec![item("a", 1_000, 3)]);
        assert_eq!(catalog.list_items().await.unwrap().len(), 1);

        catalog.set_unavailable(true);
        assert!(matches!(
            catalog.list_items().await,
            Err(ServiceError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_voucher_resolution_rules() {
        let store = InMemoryVoucherStore::new();
        store.insert("v-1", "hemat10", promotion()).await;

        let mut scoped = promotion();
        scoped.outlet_ids = vec!["outlet-2".to_string()];
        store.insert("v-2", "CABANG2", scoped).await;

        let mut expired = promotion();
        expired.ends_at = Some(Utc::now() - Duration::days(1));
        store.insert("v-3", "LAMA", expired).await;

        let app = store.resolve_voucher("HEMAT10", "outlet-1").await.unwrap();
        assert_eq!(app.voucher_id, "v-1");

        assert!(store.resolve_voucher("NOPE", "outlet-1").await.is_err());
        assert!(store.resolve_voucher("CABANG2", "outlet-1").await.is_err());
        assert!(store.resolve_voucher("CABANG2", "outlet-2").await.is_ok());
        assert!(store.resolve_voucher("LAMA", "outlet-1").await.is_err());

        store.redeem("v-1").await;
        assert_eq!(
            store.resolve_voucher("HEMAT10", "outlet-1").await.unwrap_err(),
            ServiceError::rejected("Voucher has already been used")
        );
    }

    #[tokio::test]
    async fn test_submit_decrements_stock_and_redeems() {
        let backend = InMemoryBackend::new(vec![item("a", 1_000, 3)]);
        backend.vouchers.insert("v-1", "HEMAT10", promotion()).await;

        let receipt = backend
            .submitter
            .submit(&request(vec![("a", 2)], Some("v-1")))
            .await
            .unwrap();
        assert_eq!(receipt.invoice_id, "INV-000001");
        assert_eq!(backend.catalog.stock_of("a").await, Some(1));
        assert!(backend.vouchers.is_redeemed("v-1").await);

        let second = backend
            .submitter
            .submit(&request(vec![("a", 1)], None))
            .await
            .unwrap();
        assert_eq!(second.invoice_id, "INV-000002");
        assert_eq!(backend.submitter.submitted().await.len(), 2);
    }

    #[tokio::test]
    async fn test_submit_stock_conflict_changes_nothing() {
        let backend = InMemoryBackend::new(vec![item("a", 1_000, 3), item("b", 500, 1)]);

        let err = backend
            .submitter
            .submit(&request(vec![("a", 1), ("b", 2)], None))
            .await
            .unwrap_err();
        assert!(err.is_stock_conflict());
        assert_eq!(backend.catalog.stock_of("a").await, Some(3));
        assert!(backend.submitter.submitted().await.is_empty());
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let backend = InMemoryBackend::new(vec![item("a", 1_000, 3)]);
        backend
            .submitter
            .fail_next(ServiceError::unavailable("network down"))
            .await;

        assert!(backend.submitter.submit(&request(vec![("a", 1)], None)).await.is_err());
        assert!(backend.submitter.submit(&request(vec![("a", 1)], None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_gateway_references() {
        let gateway = InMemoryPaymentGateway::new();
        let amount = Money::from_minor(18_000);

        assert_eq!(
            gateway.request_payment(amount, PaymentMethod::Qr).await.unwrap(),
            "QR-000001"
        );
        assert!(gateway.request_payment(amount, PaymentMethod::Cash).await.is_err());
        assert_eq!(gateway.requests().await, vec![(amount, PaymentMethod::Qr)]);
    }
}
