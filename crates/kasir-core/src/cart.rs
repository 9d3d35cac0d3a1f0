//! # Cart
//!
//! The lines a customer intends to purchase, bounded by live stock.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Tap menu item ───────────► add_item() ─────────► qty + 1 (≤ stock)    │
//! │                                                                         │
//! │  Tap +/- ─────────────────► update_quantity() ──► qty + delta          │
//! │                                                    (≤ 0 removes line)   │
//! │                                                                         │
//! │  Tap trash ───────────────► remove_item() ──────► line gone            │
//! │                                                                         │
//! │  Tap "Batal" ─────────────► clear() ────────────► empty                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart knows nothing about discounts; the checkout engine clears
//! discount state around these calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CatalogItem, TransactionLine};
use crate::validation::validate_price;
use crate::MAX_CART_LINES;

/// A line in the cart.
///
/// ## Price Freezing
/// `unit_price` and `name` are copied from the catalog when the line is
/// created. A later catalog refresh with a new price does not touch an
/// open cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    /// Catalog item identifier.
    pub item_id: String,

    /// Name at time of adding (frozen).
    pub name: String,

    /// Unit price at time of adding (frozen).
    pub unit_price: Money,

    /// Always >= 1.
    pub quantity: u32,

    /// When this line was created.
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a single-unit line from a catalog item.
    pub fn from_item(item: &CatalogItem) -> Self {
        CartLine {
            item_id: item.id.clone(),
            name: item.name.clone(),
            unit_price: item.price,
            quantity: 1,
            added_at: Utc::now(),
        }
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Result of an accepted quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line now has this quantity.
    Updated(u32),
    /// The quantity dropped to zero or below and the line is gone.
    Removed,
}

/// The shopping cart.
///
/// ## Invariants
/// - One line per `item_id` (re-adding merges)
/// - Every line has quantity >= 1
/// - A mutation never leaves a line above the stock it was checked against
#[derive(Debug, Clone)]
pub struct Cart {
    lines: Vec<CartLine>,
    max_lines: usize,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::with_max_lines(MAX_CART_LINES)
    }

    /// Creates a new empty cart with a custom line limit.
    pub fn with_max_lines(max_lines: usize) -> Self {
        Cart {
            lines: Vec::new(),
            max_lines,
        }
    }

    /// Adds one unit of `item`.
    ///
    /// ## Behavior
    /// - Line exists: quantity + 1, only while quantity < stock
    /// - No line: new line with quantity 1, only if stock > 0
    /// - Negative prices and subtotal overflow are rejected
    ///
    /// ## Returns
    /// The line's quantity after the add.
    pub fn add_item(&mut self, item: &CatalogItem) -> CoreResult<u32> {
        validate_price(item.price)?;

        if let Some(index) = self.lines.iter().position(|l| l.item_id == item.id) {
            let line = &self.lines[index];
            if line.quantity >= item.stock {
                return Err(CoreError::StockExceeded {
                    item_id: item.id.clone(),
                    available: item.stock,
                    requested: line.quantity as i64 + 1,
                });
            }
            let quantity = line.quantity + 1;
            self.ensure_subtotal_fits(&item.id, line.unit_price, quantity)?;
            self.lines[index].quantity = quantity;
            return Ok(quantity);
        }

        if !item.in_stock() {
            return Err(CoreError::OutOfStock {
                item_id: item.id.clone(),
            });
        }

        if self.lines.len() >= self.max_lines {
            return Err(CoreError::CartTooLarge {
                max: self.max_lines,
            });
        }

        self.ensure_subtotal_fits(&item.id, item.price, 1)?;
        self.lines.push(CartLine::from_item(item));
        Ok(1)
    }

    /// Changes a line's quantity by `delta`.
    ///
    /// ## Behavior
    /// - New quantity <= 0: line removed
    /// - New quantity > `available_stock`: rejected, line unchanged
    /// - Otherwise: quantity updated
    pub fn update_quantity(
        &mut self,
        item_id: &str,
        delta: i64,
        available_stock: u32,
    ) -> CoreResult<QuantityChange> {
        let index = self
            .lines
            .iter()
            .position(|l| l.item_id == item_id)
            .ok_or_else(|| CoreError::ItemNotInCart(item_id.to_string()))?;

        let new_quantity = (self.lines[index].quantity as i64).saturating_add(delta);

        if new_quantity <= 0 {
            self.lines.remove(index);
            return Ok(QuantityChange::Removed);
        }

        if new_quantity > available_stock as i64 {
            return Err(CoreError::StockExceeded {
                item_id: item_id.to_string(),
                available: available_stock,
                requested: new_quantity,
            });
        }

        // new_quantity is within (0, available_stock], so it fits in u32
        let quantity = new_quantity as u32;
        self.ensure_subtotal_fits(item_id, self.lines[index].unit_price, quantity)?;
        self.lines[index].quantity = quantity;
        Ok(QuantityChange::Updated(quantity))
    }

    /// Rejects a change that would overflow the subtotal.
    ///
    /// `item_id`'s line is counted at `quantity` × `unit_price`.
    fn ensure_subtotal_fits(&self, item_id: &str, unit_price: Money, quantity: u32) -> CoreResult<()> {
        let others = self
            .lines
            .iter()
            .filter(|l| l.item_id != item_id)
            .try_fold(Money::zero(), |acc, l| {
                l.unit_price
                    .checked_multiply_quantity(l.quantity)
                    .and_then(|total| acc.checked_add(total))
            });

        others
            .zip(unit_price.checked_multiply_quantity(quantity))
            .and_then(|(others, line)| others.checked_add(line))
            .map(|_| ())
            .ok_or_else(|| CoreError::AmountTooLarge {
                item_id: item_id.to_string(),
            })
    }

    /// Removes the line for `item_id`.
    ///
    /// ## Returns
    /// Whether a line was actually removed.
    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.item_id != item_id);
        self.lines.len() != initial_len
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// All lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Looks up the line for `item_id`.
    pub fn line(&self, item_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    /// Current quantity of `item_id` (0 when absent).
    pub fn quantity_of(&self, item_id: &str) -> u32 {
        self.line(item_id).map_or(0, |l| l.quantity)
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| l.quantity as u64).sum()
    }

    /// Σ(unit price × quantity).
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines as sent to the backend (identifier + quantity).
    pub fn transaction_lines(&self) -> Vec<TransactionLine> {
        self.lines
            .iter()
            .map(|l| TransactionLine {
                item_id: l.item_id.clone(),
                quantity: l.quantity,
            })
            .collect()
    }
}
