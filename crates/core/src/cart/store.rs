//! The authoritative cart.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::storage::{CartStorage, StorageError, decode_lines, encode_lines};
use super::{
    Cart, CartError, CartEvent, CartEventKind, CartLine, CartObserver, Receipt, checked_total,
    item_count, total,
};
use crate::types::{OrderId, Product, ProductId};

/// Owns the cart lines and keeps them in step with a [`CartStorage`] slot.
///
/// Every mutating method writes the whole cart before returning. When the
/// write fails the lines are restored to what they were before the call, so
/// memory and storage never disagree once a method has returned.
///
/// Mutations take `&mut self`; callers sharing a store across tasks must
/// serialize access (the storefront keeps it behind a mutex).
pub struct CartStore<S> {
    storage: S,
    lines: Vec<CartLine>,
    observers: Vec<Box<dyn CartObserver>>,
}

impl<S: CartStorage> CartStore<S> {
    /// Open a store, restoring whatever the slot holds.
    ///
    /// A missing, unreadable or corrupt slot yields an empty cart; it is
    /// logged but never fatal.
    pub fn open(storage: S) -> Self {
        let lines = match storage.load() {
            Ok(Some(payload)) => decode_lines(&payload).unwrap_or_else(|err| {
                warn!(error = %err, "Discarding corrupt cart payload");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "Failed to read cart storage, starting empty");
                Vec::new()
            }
        };

        debug!(lines = lines.len(), "Cart restored");

        Self {
            storage,
            lines,
            observers: Vec::new(),
        }
    }

    /// Register an observer for persisted mutations.
    pub fn subscribe(&mut self, observer: impl CartObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Add `quantity` units of `product`, merging into an existing line.
    ///
    /// Stock is not checked here.
    ///
    /// # Errors
    ///
    /// - [`CartError::Validation`] if the product id is empty, `quantity` is
    ///   zero, or the line quantity or cart total would overflow.
    /// - [`CartError::Persistence`] if the write fails.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<CartLine, CartError> {
        if product.id.is_empty() {
            return Err(CartError::Validation(
                "product id cannot be empty".to_string(),
            ));
        }
        if quantity == 0 {
            return Err(CartError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }

        let previous = self.lines.clone();

        let line = if let Some(line) = self.line_mut(&product.id) {
            line.quantity = line.quantity.checked_add(quantity).ok_or_else(|| {
                CartError::Validation(format!("quantity overflow for product {}", product.id))
            })?;
            line.clone()
        } else {
            let line = CartLine {
                product_id: product.id.clone(),
                name: product.name.clone(),
                unit_price: product.price,
                quantity,
            };
            self.lines.push(line.clone());
            line
        };

        self.commit(previous, CartEventKind::Added, Some(&product.id))?;
        Ok(line)
    }

    /// Overwrite the quantity of an existing line.
    ///
    /// A quantity below one removes the line and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotFound`] if there is no line for `product_id`.
    /// - [`CartError::Validation`] if `quantity` exceeds `u32::MAX` or the
    ///   cart total would overflow.
    /// - [`CartError::Persistence`] if the write fails.
    pub fn set_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Option<CartLine>, CartError> {
        if self.line(product_id).is_none() {
            return Err(CartError::NotFound(product_id.clone()));
        }

        if quantity < 1 {
            let previous = self.lines.clone();
            self.lines.retain(|l| &l.product_id != product_id);
            self.commit(previous, CartEventKind::Removed, Some(product_id))?;
            return Ok(None);
        }

        let quantity = u32::try_from(quantity)
            .map_err(|_| CartError::Validation(format!("quantity {quantity} is too large")))?;

        let previous = self.lines.clone();
        let line = self.line_mut(product_id).map(|line| {
            line.quantity = quantity;
            line.clone()
        });
        self.commit(previous, CartEventKind::QuantitySet, Some(product_id))?;
        Ok(line)
    }

    /// Take one unit off a line, deleting it when none remain.
    ///
    /// Returns the remaining line, or `None` if the line is gone (or was never
    /// there, which is not an error).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] if the write fails.
    pub fn remove(&mut self, product_id: &ProductId) -> Result<Option<CartLine>, CartError> {
        let Some(current) = self.line(product_id).map(|l| l.quantity) else {
            return Ok(None);
        };

        let previous = self.lines.clone();
        let remaining = if current <= 1 {
            self.lines.retain(|l| &l.product_id != product_id);
            None
        } else {
            self.line_mut(product_id).map(|line| {
                line.quantity -= 1;
                line.clone()
            })
        };

        let kind = if remaining.is_some() {
            CartEventKind::Decremented
        } else {
            CartEventKind::Removed
        };
        self.commit(previous, kind, Some(product_id))?;
        Ok(remaining)
    }

    /// Drop a line whatever its quantity. Absent lines are a no-op.
    ///
    /// Returns the line that was removed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] if the write fails.
    pub fn delete(&mut self, product_id: &ProductId) -> Result<Option<CartLine>, CartError> {
        let Some(position) = self.lines.iter().position(|l| &l.product_id == product_id) else {
            return Ok(None);
        };

        let previous = self.lines.clone();
        let removed = self.lines.remove(position);
        self.commit(previous, CartEventKind::Removed, Some(product_id))?;
        Ok(Some(removed))
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] if the write fails.
    pub fn clear(&mut self) -> Result<(), CartError> {
        let previous = std::mem::take(&mut self.lines);
        self.commit(previous, CartEventKind::Cleared, None)
    }

    /// Stubbed checkout: snapshot the cart into a [`Receipt`] and clear it.
    ///
    /// # Errors
    ///
    /// - [`CartError::EmptyCart`] if there is nothing to check out.
    /// - [`CartError::Persistence`] if clearing fails; the cart is kept.
    pub fn checkout(&mut self) -> Result<Receipt, CartError> {
        if self.lines.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let receipt = Receipt {
            order_id: OrderId::generate(),
            placed_at: Utc::now(),
            item_count: self.item_count(),
            total: self.total(),
            lines: self.lines.clone(),
        };

        let previous = std::mem::take(&mut self.lines);
        self.commit(previous, CartEventKind::CheckedOut, None)?;
        Ok(receipt)
    }

    fn commit(
        &mut self,
        previous: Vec<CartLine>,
        kind: CartEventKind,
        product_id: Option<&ProductId>,
    ) -> Result<(), CartError> {
        if checked_total(&self.lines).is_none() {
            self.lines = previous;
            return Err(CartError::Validation("cart total is too large".to_string()));
        }

        let written = encode_lines(&self.lines)
            .map_err(StorageError::from)
            .and_then(|payload| self.storage.save(&payload));

        if let Err(err) = written {
            warn!(error = %err, ?kind, "Cart write failed, rolling back");
            self.lines = previous;
            return Err(CartError::Persistence(err));
        }

        let event = CartEvent {
            kind,
            product_id: product_id.cloned(),
            item_count: self.item_count(),
            total: self.total(),
        };
        for observer in &self.observers {
            observer.on_change(&event);
        }
        Ok(())
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| &l.product_id == product_id)
    }
}

impl<S> CartStore<S> {
    /// Σ(unit price × quantity) over the current lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        total(&self.lines)
    }

    /// Σ(quantity) over the current lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        item_count(&self.lines)
    }

    /// Copy of the lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    /// Copy of the line for `product_id`, if any.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<CartLine> {
        self.lines
            .iter()
            .find(|l| &l.product_id == product_id)
            .cloned()
    }

    /// Snapshot with derived totals.
    #[must_use]
    pub fn cart(&self) -> Cart {
        Cart::from_lines(self.lines.clone())
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The underlying storage slot.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S> std::fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::cart::MemoryCartStorage;
    use crate::types::Price;

    fn product(id: &str, price: i64) -> Product {
        Product::new(id, format!("Frame {id}"), Price::new(Decimal::new(price, 0)).unwrap())
    }

    fn store() -> (CartStore<MemoryCartStorage>, MemoryCartStorage) {
        let storage = MemoryCartStorage::new();
        (CartStore::open(storage.clone()), storage)
    }

    fn stored(storage: &MemoryCartStorage) -> Vec<CartLine> {
        decode_lines(&storage.payload().unwrap()).unwrap()
    }

    #[test]
    fn test_add_same_product_merges_lines() {
        let (mut cart, _) = store();
        let p1 = product("p1", 80);

        cart.add(&p1, 1).unwrap();
        let line = cart.add(&p1, 1).unwrap();

        assert_eq!(line.quantity, 2);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.total(), Decimal::new(160, 0));
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let (mut cart, _) = store();
        cart.add(&product("b", 1), 1).unwrap();
        cart.add(&product("a", 1), 1).unwrap();
        cart.add(&product("b", 1), 1).unwrap();

        let ids: Vec<_> = cart.lines().into_iter().map(|l| l.product_id).collect();
        assert_eq!(ids, vec![ProductId::new("b"), ProductId::new("a")]);
    }

    #[test]
    fn test_add_snapshots_name_and_price() {
        let (mut cart, _) = store();
        let mut p1 = product("p1", 80);
        cart.add(&p1, 1).unwrap();

        p1.name = "Renamed".to_string();
        p1.price = Price::new(Decimal::new(999, 0)).unwrap();
        let line = cart.add(&p1, 1).unwrap();

        assert_eq!(line.name, "Frame p1");
        assert_eq!(line.unit_price.amount(), Decimal::new(80, 0));
    }

    #[test]
    fn test_add_ignores_stock() {
        let (mut cart, _) = store();
        let p1 = product("p1", 10);
        assert_eq!(p1.stock, 0);
        assert_eq!(cart.add(&p1, 5).unwrap().quantity, 5);
    }

    #[test]
    fn test_add_validation() {
        let (mut cart, storage) = store();
        assert!(matches!(
            cart.add(&product("", 10), 1),
            Err(CartError::Validation(_))
        ));
        assert!(matches!(
            cart.add(&product("p1", 10), 0),
            Err(CartError::Validation(_))
        ));
        assert!(cart.is_empty());
        assert_eq!(storage.writes(), 0);
    }

    #[test]
    fn test_add_overflow_is_rejected_without_change() {
        let (mut cart, _) = store();
        let p1 = product("p1", 1);
        cart.add(&p1, u32::MAX).unwrap();
        assert!(matches!(cart.add(&p1, 1), Err(CartError::Validation(_))));
        assert_eq!(cart.line(&p1.id).unwrap().quantity, u32::MAX);
    }

    #[test]
    fn test_set_quantity() {
        let (mut cart, storage) = store();
        let p1 = product("p1", 25);
        cart.add(&p1, 1).unwrap();

        let line = cart.set_quantity(&p1.id, 4).unwrap().unwrap();
        assert_eq!(line.quantity, 4);
        assert_eq!(cart.total(), Decimal::new(100, 0));
        assert_eq!(stored(&storage)[0].quantity, 4);
    }

    #[test]
    fn test_set_quantity_below_one_removes_line() {
        let (mut cart, _) = store();
        let p1 = product("p1", 25);
        let p2 = product("p2", 25);
        cart.add(&p1, 3).unwrap();
        cart.add(&p2, 3).unwrap();

        assert!(cart.set_quantity(&p1.id, 0).unwrap().is_none());
        assert!(cart.set_quantity(&p2.id, -1).unwrap().is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_unknown_product() {
        let (mut cart, storage) = store();
        cart.add(&product("p1", 25), 1).unwrap();
        let before = storage.payload();

        let err = cart.set_quantity(&ProductId::new("nope"), 3).unwrap_err();
        assert!(matches!(err, CartError::NotFound(id) if id.as_str() == "nope"));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(storage.payload(), before);
    }

    #[test]
    fn test_remove_decrements_then_deletes() {
        let (mut cart, _) = store();
        let p1 = product("p1", 5);
        cart.add(&p1, 2).unwrap();

        assert_eq!(cart.remove(&p1.id).unwrap().unwrap().quantity, 1);
        assert!(cart.remove(&p1.id).unwrap().is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (mut cart, storage) = store();
        assert!(cart.remove(&ProductId::new("ghost")).unwrap().is_none());
        assert!(cart.delete(&ProductId::new("ghost")).unwrap().is_none());
        assert_eq!(storage.writes(), 0);
    }

    #[test]
    fn test_delete_ignores_quantity() {
        let (mut cart, _) = store();
        let p1 = product("p1", 5);
        cart.add(&p1, 7).unwrap();
        let removed = cart.delete(&p1.id).unwrap().unwrap();
        assert_eq!(removed.quantity, 7);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_clear_persists_empty_cart() {
        let (mut cart, storage) = store();
        cart.add(&product("p1", 5), 1).unwrap();
        cart.clear().unwrap();
        assert_eq!(storage.payload().as_deref(), Some("[]"));
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let (mut cart, storage) = store();
        let p1 = product("p1", 40);
        cart.add(&p1, 1).unwrap();
        storage.set_fail_writes(true);

        assert!(matches!(cart.add(&p1, 1), Err(CartError::Persistence(_))));
        assert!(matches!(
            cart.add(&product("p2", 1), 1),
            Err(CartError::Persistence(_))
        ));
        assert!(matches!(cart.remove(&p1.id), Err(CartError::Persistence(_))));
        assert!(matches!(cart.clear(), Err(CartError::Persistence(_))));
        assert!(matches!(cart.checkout(), Err(CartError::Persistence(_))));

        assert_eq!(cart.lines(), stored(&storage));
        assert_eq!(cart.line(&p1.id).unwrap().quantity, 1);
    }

    #[test]
    fn test_high_precision_price_matches_storage() {
        let (mut cart, storage) = store();
        let price = Price::new("1234567.123456789123".parse().unwrap()).unwrap();
        let p1 = Product::new("p1", "Gold rims", price);

        cart.add(&p1, 3).unwrap();

        assert_eq!(stored(&storage), cart.lines());
        let restored = CartStore::open(storage);
        assert_eq!(restored.total(), cart.total());
        assert_eq!(restored.total(), Decimal::new(370_370_136, 2));
    }

    #[test]
    fn test_largest_line_persists_and_restores() {
        let (mut cart, storage) = store();
        let p1 = Product::new("p1", "Platinum", Price::MAX);
        cart.add(&p1, 1).unwrap();

        let line = cart.set_quantity(&p1.id, i64::from(u32::MAX)).unwrap().unwrap();
        assert_eq!(line.quantity, u32::MAX);

        let expected = Price::MAX.amount() * Decimal::from(u32::MAX);
        assert_eq!(cart.total(), expected);
        assert_eq!(stored(&storage), cart.lines());

        let restored = CartStore::open(storage);
        assert_eq!(restored.total(), expected);
        assert_eq!(restored.cart().total, expected);
    }

    #[test]
    fn test_restore_round_trip() {
        let storage = MemoryCartStorage::new();
        let mut cart = CartStore::open(storage.clone());
        cart.add(&product("b", 150), 2).unwrap();
        cart.add(&product("a", 80), 1).unwrap();

        let restored = CartStore::open(storage);
        assert_eq!(restored.lines(), cart.lines());
        assert_eq!(restored.total(), Decimal::new(380, 0));
    }

    #[test]
    fn test_corrupt_payload_opens_empty() {
        let cart = CartStore::open(MemoryCartStorage::with_payload("not json"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_lines_is_a_copy() {
        let (mut cart, _) = store();
        cart.add(&product("p1", 5), 1).unwrap();
        let mut lines = cart.lines();
        lines[0].quantity = 99;
        lines.clear();
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_checkout() {
        let (mut cart, storage) = store();
        assert!(matches!(cart.checkout(), Err(CartError::EmptyCart)));

        cart.add(&product("p1", 30), 2).unwrap();
        let receipt = cart.checkout().unwrap();
        assert_eq!(receipt.item_count, 2);
        assert_eq!(receipt.total, Decimal::new(60, 0));
        assert_eq!(receipt.lines.len(), 1);
        assert!(cart.is_empty());
        assert!(stored(&storage).is_empty());
    }

    #[test]
    fn test_observers_see_persisted_mutations_only() {
        let (mut cart, storage) = store();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        cart.subscribe(move |event: &CartEvent| sink.lock().unwrap().push(event.clone()));

        let p1 = product("p1", 10);
        cart.add(&p1, 2).unwrap();
        cart.remove(&p1.id).unwrap();
        storage.set_fail_writes(true);
        let _ = cart.clear();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, CartEventKind::Added);
        assert_eq!(events[0].item_count, 2);
        assert_eq!(events[1].kind, CartEventKind::Decremented);
        assert_eq!(events[1].total, Decimal::new(10, 0));
    }
}
