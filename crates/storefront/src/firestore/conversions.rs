//! Conversion from Firestore documents to domain products.

use chrono::{DateTime, Utc};
use kenzy_core::{Price, Product, ProductId};
use rust_decimal::Decimal;
use tracing::warn;

use super::types::{Document, RunQueryItem, Value};

/// Convert a `runQuery` response into products, keeping source order.
///
/// Documents that cannot be priced are skipped with a warning.
pub fn convert_products(items: Vec<RunQueryItem>) -> Vec<Product> {
    items
        .into_iter()
        .filter_map(|item| item.document)
        .filter_map(|doc| convert_product(&doc))
        .collect()
}

/// Convert one document. Returns `None` if it has no ID or no valid price.
pub fn convert_product(doc: &Document) -> Option<Product> {
    let id = doc.id();
    if id.trim().is_empty() {
        warn!(name = %doc.name, "Skipping catalog document without an ID");
        return None;
    }

    let Some(price) = doc.field("price").and_then(value_decimal).and_then(|d| Price::new(d).ok())
    else {
        warn!(product_id = %id, "Skipping catalog document with missing or invalid price");
        return None;
    };

    Some(Product {
        id: ProductId::new(id),
        name: string_field(doc, "name").unwrap_or_default(),
        price,
        stock: doc.field("stock").map_or(0, value_stock),
        category: string_field(doc, "category"),
        description: string_field(doc, "description"),
        active: doc.field("active").and_then(Value::as_bool).unwrap_or(true),
        image: string_field(doc, "image").unwrap_or_default(),
        created_at: doc
            .field("createdAt")
            .and_then(Value::as_timestamp)
            .or(doc.create_time.as_deref())
            .and_then(parse_timestamp),
    })
}

/// Non-empty trimmed string field.
fn string_field(doc: &Document, name: &str) -> Option<String> {
    doc.field(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numbers may arrive as doubles, integers or numeric strings.
fn value_decimal(value: &Value) -> Option<Decimal> {
    if let Some(f) = value.as_f64() {
        return Decimal::try_from(f).ok();
    }
    if let Some(i) = value.as_i64() {
        return Some(Decimal::from(i));
    }
    value.as_str().and_then(|s| s.trim().parse().ok())
}

/// Stock clamps to zero; fractional stock rounds down.
fn value_stock(value: &Value) -> u32 {
    let raw = value
        .as_i64()
        .or_else(|| {
            value
                .as_f64()
                .and_then(|f| Decimal::try_from(f.floor()).ok())
                .and_then(|d| i64::try_from(d).ok())
        })
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .unwrap_or(0);
    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
