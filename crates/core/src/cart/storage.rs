//! Durable cart slot and its payload format.
//!
//! The payload is a JSON array of `{id, name, price, quantity}` records with
//! `price` as a JSON number, the same shape browsers of the previous
//! storefront kept under the `kenzyCart` key.

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use super::CartLine;
use crate::types::{Price, ProductId};

/// Fixed key of the cart slot.
pub const CART_STORAGE_KEY: &str = "kenzyCart";

/// Errors raised by a [`CartStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode cart: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A single key-value slot holding the serialized cart.
pub trait CartStorage: Send {
    /// Read the slot. `Ok(None)` means nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot exists but cannot be read.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the slot contents. Must be durable when it returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write did not complete.
    fn save(&mut self, payload: &str) -> Result<(), StorageError>;
}

impl<T: CartStorage + ?Sized> CartStorage for Box<T> {
    fn load(&self) -> Result<Option<String>, StorageError> {
        (**self).load()
    }

    fn save(&mut self, payload: &str) -> Result<(), StorageError> {
        (**self).save(payload)
    }
}

#[derive(Serialize)]
struct StoredLine<'a> {
    id: &'a ProductId,
    name: &'a str,
    #[serde(serialize_with = "serialize_price")]
    price: Decimal,
    quantity: u32,
}

#[derive(Deserialize)]
struct StoredRecord {
    id: ProductId,
    #[serde(default)]
    name: String,
    price: f64,
    quantity: i64,
}

/// Write a price as a JSON number.
///
/// Goes through the decimal string rather than `Decimal::to_f64` so the
/// number is the nearest `f64`, whose shortest form reads back as the same
/// two-decimal amount for every valid [`Price`].
fn serialize_price<S: Serializer>(price: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    let number: f64 = price.to_string().parse().map_err(S::Error::custom)?;
    serializer.serialize_f64(number)
}

fn parse_price(number: f64) -> Option<Price> {
    let amount = Decimal::from_str(&number.to_string()).ok()?;
    Price::new(amount).ok()
}

/// Serialize lines into the slot payload.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn encode_lines(lines: &[CartLine]) -> Result<String, serde_json::Error> {
    let records: Vec<StoredLine<'_>> = lines
        .iter()
        .map(|line| StoredLine {
            id: &line.product_id,
            name: &line.name,
            price: line.unit_price.amount(),
            quantity: line.quantity,
        })
        .collect();
    serde_json::to_string(&records)
}

/// Parse a slot payload into lines that satisfy the cart invariants.
///
/// Records with an empty id, a non-positive quantity, or a price that is not
/// a valid [`Price`] are dropped. Repeated ids are merged into the first
/// occurrence. A record that would overflow the cart total is dropped.
///
/// # Errors
///
/// Returns an error if the payload is not a JSON array of records.
pub fn decode_lines(payload: &str) -> Result<Vec<CartLine>, serde_json::Error> {
    let records: Vec<StoredRecord> = serde_json::from_str(payload)?;
    let mut lines: Vec<CartLine> = Vec::with_capacity(records.len());
    let mut running = Decimal::ZERO;

    for record in records {
        if record.id.is_empty() || record.quantity < 1 {
            continue;
        }
        let Some(unit_price) = parse_price(record.price) else {
            continue;
        };
        let quantity = u32::try_from(record.quantity).unwrap_or(u32::MAX);

        let position = lines.iter().position(|l| l.product_id == record.id);
        let (price, current) = position
            .and_then(|i| lines.get(i))
            .map_or((unit_price, 0), |l| (l.unit_price, l.quantity));
        let merged = current.saturating_add(quantity);

        let Some(next) = price
            .amount()
            .checked_mul(Decimal::from(merged - current))
            .and_then(|extra| running.checked_add(extra))
        else {
            continue;
        };
        running = next;

        match position.and_then(|i| lines.get_mut(i)) {
            Some(existing) => existing.quantity = merged,
            None => lines.push(CartLine {
                product_id: record.id,
                name: record.name,
                unit_price,
                quantity,
            }),
        }
    }

    Ok(lines)
}

#[derive(Debug, Default)]
struct MemorySlot {
    payload: Option<String>,
    fail_writes: bool,
    writes: usize,
}

/// In-process storage slot.
///
/// Clones share the same slot, so a test can keep one handle to inspect what
/// the store wrote while the store owns the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStorage {
    slot: Arc<Mutex<MemorySlot>>,
}

impl MemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that already holds `payload`.
    #[must_use]
    pub fn with_payload(payload: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.lock().payload = Some(payload.into());
        storage
    }

    /// Current payload, if anything has been written.
    #[must_use]
    pub fn payload(&self) -> Option<String> {
        self.lock().payload.clone()
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.lock().writes
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemorySlot> {
        // A poisoned slot still holds a consistent payload string.
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.payload())
    }

    fn save(&mut self, payload: &str) -> Result<(), StorageError> {
        let mut slot = self.lock();
        if slot.fail_writes {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        slot.payload = Some(payload.to_owned());
        slot.writes += 1;
        Ok(())
    }
}
