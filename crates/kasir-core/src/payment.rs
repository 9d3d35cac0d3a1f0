//! # Payment Reconciliation
//!
//! Turns the grand total into an `(method, tendered, change)` settlement.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                     ┌──────────────────┐                                │
//! │                     │ SelectingMethod  │                                │
//! │                     └────────┬─────────┘                                │
//! │               select(Cash)   │   select(Debit | Qr)                     │
//! │            ┌─────────────────┴──────────────────┐                       │
//! │            ▼                                    ▼                       │
//! │   ┌─────────────────┐                 ┌───────────────────┐             │
//! │   │ Cash            │                 │ NonCash           │             │
//! │   │ tendered        │                 │ method            │             │
//! │   │ change = max(0, │                 │ reference (QR)    │             │
//! │   │  tendered-total)│                 │ tendered = total  │             │
//! │   └────────┬────────┘                 └─────────┬─────────┘             │
//! │            │ settle: tendered >= total          │ settle: QR needs ref  │
//! │            ▼                                    ▼                       │
//! │                     PaymentSettlement                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A QR reference only means the gateway issued a payment request.
//! Nothing here polls for or verifies the customer's actual payment.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::PaymentMethod;

/// Where the payment step currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentFlow {
    /// No method chosen yet.
    #[default]
    SelectingMethod,

    /// Cash with the amount the customer handed over.
    Cash { tendered: Money },

    /// Debit or QR; pays exactly the grand total.
    NonCash {
        method: PaymentMethod,
        /// Gateway reference once a QR payment request was issued.
        reference: Option<String>,
    },
}

/// What a confirmed payment emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentSettlement {
    pub method: PaymentMethod,
    pub amount_tendered: Money,
    pub change: Money,
    pub reference: Option<String>,
}

impl PaymentFlow {
    /// Chooses a payment method, discarding any previous input.
    pub fn select_method(&mut self, method: PaymentMethod) {
        *self = if method.is_cash() {
            PaymentFlow::Cash {
                tendered: Money::zero(),
            }
        } else {
            PaymentFlow::NonCash {
                method,
                reference: None,
            }
        };
    }

    /// The chosen method, if any.
    pub fn method(&self) -> Option<PaymentMethod> {
        match self {
            PaymentFlow::SelectingMethod => None,
            PaymentFlow::Cash { .. } => Some(PaymentMethod::Cash),
            PaymentFlow::NonCash { method, .. } => Some(*method),
        }
    }

    /// Records the cash the customer handed over.
    pub fn enter_cash_tendered(&mut self, amount: Money) -> CoreResult<()> {
        if amount.is_negative() {
            return Err(ValidationError::Negative {
                field: "cash tendered".to_string(),
            }
            .into());
        }

        match self {
            PaymentFlow::Cash { tendered } => {
                *tendered = amount;
                Ok(())
            }
            PaymentFlow::SelectingMethod => Err(CoreError::PaymentMethodNotSelected),
            PaymentFlow::NonCash { method, .. } => Err(ValidationError::InvalidFormat {
                field: "cash tendered".to_string(),
                reason: format!("{} payments do not take a tendered amount", method),
            }
            .into()),
        }
    }

    /// Records the gateway reference of an issued QR payment request.
    pub fn record_reference(&mut self, new_reference: String) -> CoreResult<()> {
        match self {
            PaymentFlow::NonCash { method, reference } if method.requires_gateway() => {
                *reference = Some(new_reference);
                Ok(())
            }
            PaymentFlow::SelectingMethod => Err(CoreError::PaymentMethodNotSelected),
            other => Err(ValidationError::InvalidFormat {
                field: "payment reference".to_string(),
                reason: format!(
                    "{} payments do not use a gateway reference",
                    other.method().map_or("unknown".to_string(), |m| m.to_string())
                ),
            }
            .into()),
        }
    }

    /// True while a QR request has been issued and awaits confirmation.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            PaymentFlow::NonCash {
                reference: Some(_),
                ..
            }
        )
    }

    /// Live change for the cash screen; zero for non-cash.
    pub fn change(&self, grand_total: Money) -> Money {
        match self {
            PaymentFlow::Cash { tendered } => tendered.saturating_sub_floor(grand_total),
            _ => Money::zero(),
        }
    }

    /// Whether the confirm button should be enabled.
    pub fn can_confirm(&self, grand_total: Money) -> bool {
        self.settle(grand_total).is_ok()
    }

    /// Produces the settlement for `grand_total`.
    ///
    /// ## Errors
    /// - `PaymentMethodNotSelected`: still selecting
    /// - `InsufficientPayment`: cash below the grand total
    /// - `PaymentPending`: QR without an issued gateway request
    pub fn settle(&self, grand_total: Money) -> CoreResult<PaymentSettlement> {
        match self {
            PaymentFlow::SelectingMethod => Err(CoreError::PaymentMethodNotSelected),

            PaymentFlow::Cash { tendered } => {
                if *tendered < grand_total {
                    return Err(CoreError::InsufficientPayment {
                        required: grand_total,
                        tendered: *tendered,
                    });
                }
                Ok(PaymentSettlement {
                    method: PaymentMethod::Cash,
                    amount_tendered: *tendered,
                    change: self.change(grand_total),
                    reference: None,
                })
            }

            PaymentFlow::NonCash { method, reference } => {
                if method.requires_gateway() && reference.is_none() {
                    return Err(CoreError::PaymentPending {
                        method: method.to_string(),
                    });
                }
                Ok(PaymentSettlement {
                    method: *method,
                    amount_tendered: grand_total,
                    change: Money::zero(),
                    reference: reference.clone(),
                })
            }
        }
    }

    /// Back to method selection.
    pub fn reset(&mut self) {
        *self = PaymentFlow::SelectingMethod;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_insufficient_then_sufficient() {
        let total = Money::from_minor(15_000);
        let mut flow = PaymentFlow::default();
        flow.select_method(PaymentMethod::Cash);

        flow.enter_cash_tendered(Money::from_minor(10_000)).unwrap();
        assert!(!flow.can_confirm(total));
        assert_eq!(
            flow.settle(total).unwrap_err(),
            CoreError::InsufficientPayment {
                required: total,
                tendered: Money::from_minor(10_000),
            }
        );

        flow.enter_cash_tendered(Money::from_minor(20_000)).unwrap();
        assert_eq!(flow.change(total).minor(), 5_000);
        let settlement = flow.settle(total).unwrap();
        assert_eq!(settlement.method, PaymentMethod::Cash);
        assert_eq!(settlement.amount_tendered.minor(), 20_000);
        assert_eq!(settlement.change.minor(), 5_000);
    }

    #[test]
    fn test_cash_exact_amount() {
        let total = Money::from_minor(15_000);
        let mut flow = PaymentFlow::default();
        flow.select_method(PaymentMethod::Cash);
        flow.enter_cash_tendered(total).unwrap();
        assert!(flow.settle(total).unwrap().change.is_zero());
    }

    #[test]
    fn test_change_is_live_and_never_negative() {
        let mut flow = PaymentFlow::default();
        flow.select_method(PaymentMethod::Cash);
        flow.enter_cash_tendered(Money::from_minor(5_000)).unwrap();
        assert!(flow.change(Money::from_minor(15_000)).is_zero());
        assert_eq!(flow.change(Money::from_minor(4_000)).minor(), 1_000);
    }

    #[test]
    fn test_negative_tendered_rejected() {
        let mut flow = PaymentFlow::default();
        flow.select_method(PaymentMethod::Cash);
        assert!(matches!(
            flow.enter_cash_tendered(Money::from_minor(-1)),
            Err(CoreError::Validation(ValidationError::Negative { .. }))
        ));
    }

    #[test]
    fn test_debit_pays_exact_total() {
        let total = Money::from_minor(18_000);
        let mut flow = PaymentFlow::default();
        flow.select_method(PaymentMethod::Debit);

        assert!(flow.enter_cash_tendered(Money::from_minor(1)).is_err());
        let settlement = flow.settle(total).unwrap();
        assert_eq!(settlement.amount_tendered, total);
        assert!(settlement.change.is_zero());
        assert!(settlement.reference.is_none());
    }

    #[test]
    fn test_qr_requires_reference() {
        let total = Money::from_minor(18_000);
        let mut flow = PaymentFlow::default();
        flow.select_method(PaymentMethod::Qr);

        assert!(matches!(
            flow.settle(total),
            Err(CoreError::PaymentPending { .. })
        ));
        assert!(!flow.is_pending());

        flow.record_reference("QR-0001".to_string()).unwrap();
        assert!(flow.is_pending());
        let settlement = flow.settle(total).unwrap();
        assert_eq!(settlement.reference.as_deref(), Some("QR-0001"));
        assert_eq!(settlement.amount_tendered, total);
    }

    #[test]
    fn test_reference_only_for_qr() {
        let mut flow = PaymentFlow::default();
        assert_eq!(
            flow.record_reference("x".to_string()).unwrap_err(),
            CoreError::PaymentMethodNotSelected
        );
        flow.select_method(PaymentMethod::Debit);
        assert!(flow.record_reference("x".to_string()).is_err());
    }

    #[test]
    fn test_nothing_selected() {
        let flow = PaymentFlow::default();
        assert_eq!(flow.method(), None);
        assert_eq!(
            flow.settle(Money::zero()).unwrap_err(),
            CoreError::PaymentMethodNotSelected
        );
    }

    #[test]
    fn test_switching_method_discards_input() {
        let mut flow = PaymentFlow::default();
        flow.select_method(PaymentMethod::Cash);
        flow.enter_cash_tendered(Money::from_minor(50_000)).unwrap();
        flow.select_method(PaymentMethod::Qr);
        flow.select_method(PaymentMethod::Cash);
        assert!(flow.change(Money::from_minor(1_000)).is_zero());

        flow.reset();
        assert_eq!(flow, PaymentFlow::SelectingMethod);
    }
}
