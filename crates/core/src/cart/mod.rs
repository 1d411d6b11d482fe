//! Shopping cart state.
//!
//! A cart is an ordered list of [`CartLine`]s, at most one per product, each
//! with a quantity of at least one. [`CartStore`] owns the authoritative copy,
//! writes it to a [`CartStorage`] slot after every mutation and notifies
//! [`CartObserver`]s once the write has succeeded.

mod storage;
mod store;

pub use storage::{
    CART_STORAGE_KEY, CartStorage, MemoryCartStorage, StorageError, decode_lines, encode_lines,
};
pub use store::CartStore;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{OrderId, Price, ProductId};

/// One product's entry in the cart.
///
/// `name` and `unit_price` are captured when the product is first added and
/// are not refreshed if the catalog changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price × quantity`, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.checked_subtotal().unwrap_or(Decimal::MAX)
    }

    /// `unit_price × quantity`, or `None` if it does not fit a `Decimal`.
    #[must_use]
    pub fn checked_subtotal(&self) -> Option<Decimal> {
        self.unit_price
            .amount()
            .checked_mul(Decimal::from(self.quantity))
    }
}

/// Read-only snapshot of a cart with its derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub item_count: u64,
    pub total: Decimal,
}

impl Cart {
    /// Build a snapshot, deriving the totals from `lines`.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self {
            item_count: item_count(&lines),
            total: total(&lines),
            lines,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Σ(unit price × quantity), saturating at `Decimal::MAX`.
///
/// [`CartStore`] rejects any mutation for which [`checked_total`] fails, so
/// the saturated value is never observed through a store.
#[must_use]
pub fn total(lines: &[CartLine]) -> Decimal {
    checked_total(lines).unwrap_or(Decimal::MAX)
}

/// Σ(unit price × quantity), or `None` on overflow.
#[must_use]
pub fn checked_total(lines: &[CartLine]) -> Option<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.checked_subtotal()?))
}

/// Σ(quantity).
#[must_use]
pub fn item_count(lines: &[CartLine]) -> u64 {
    lines.iter().map(|line| u64::from(line.quantity)).sum()
}

/// Errors returned by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Invalid arguments. Nothing was changed.
    #[error("invalid cart operation: {0}")]
    Validation(String),

    /// The operation needs a line that is not in the cart. Nothing was changed.
    #[error("no cart line for product {0}")]
    NotFound(ProductId),

    /// The durable write failed; in-memory state was rolled back.
    #[error("failed to persist cart: {0}")]
    Persistence(#[from] StorageError),

    /// Checkout was requested with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,
}

/// What kind of mutation produced a [`CartEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartEventKind {
    Added,
    QuantitySet,
    Decremented,
    Removed,
    Cleared,
    CheckedOut,
}

/// Notification published after a mutation has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartEvent {
    pub kind: CartEventKind,
    pub product_id: Option<ProductId>,
    pub item_count: u64,
    pub total: Decimal,
}

/// Receives [`CartEvent`]s from a [`CartStore`].
///
/// Called synchronously while the store is being mutated, so implementations
/// should hand the event off (log it, push it on a channel) and return.
pub trait CartObserver: Send {
    fn on_change(&self, event: &CartEvent);
}

impl<F> CartObserver for F
where
    F: Fn(&CartEvent) + Send,
{
    fn on_change(&self, event: &CartEvent) {
        self(event);
    }
}

/// Outcome of the stubbed checkout. No payment is taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub order_id: OrderId,
    pub placed_at: DateTime<Utc>,
    pub lines: Vec<CartLine>,
    pub item_count: u64,
    pub total: Decimal,
}
