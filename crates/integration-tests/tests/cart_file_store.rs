//! Cart persistence through the file backend.
//!
//! Every committed change must be visible in `kenzyCart.json`, and a fresh
//! store over the same directory must restore the same cart.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::fs;
use std::path::Path;

use kenzy_core::{CartError, CartStore, Product};
use kenzy_integration_tests::sample_products;
use kenzy_storefront::storage::FileCartStorage;
use rust_decimal::Decimal;
use serde_json::{Value, json};

fn stored(dir: &Path) -> Value {
    let raw = fs::read_to_string(FileCartStorage::new(dir).path()).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn aviator() -> Product {
    sample_products().remove(0)
}

#[test]
fn test_add_merge_delete_persists_each_step() {
    let dir = tempfile::tempdir().unwrap();
    let product = aviator();
    let mut cart = CartStore::open(FileCartStorage::new(dir.path()));
    assert!(cart.is_empty());

    cart.add(&product, 1).unwrap();
    assert_eq!(
        stored(dir.path()),
        json!([{"id": "av1", "name": "Aviator", "price": 80.0, "quantity": 1}])
    );

    cart.add(&product, 2).unwrap();
    let line = cart.line(&product.id).unwrap();
    assert_eq!(line.quantity, 3);
    assert_eq!(cart.total(), Decimal::new(24000, 2));
    assert_eq!(stored(dir.path())[0]["quantity"], json!(3));
    assert_eq!(stored(dir.path()).as_array().unwrap().len(), 1);

    cart.delete(&product.id).unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.total(), Decimal::ZERO);
    assert_eq!(stored(dir.path()), json!([]));
}

#[test]
fn test_restore_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let products = sample_products();
    {
        let mut cart = CartStore::open(FileCartStorage::new(dir.path()));
        cart.add(&products[0], 2).unwrap();
        cart.add(&products[1], 1).unwrap();
    }

    let restored = CartStore::open(FileCartStorage::new(dir.path()));
    let ids: Vec<String> = restored
        .lines()
        .into_iter()
        .map(|l| l.product_id.into_inner())
        .collect();
    assert_eq!(ids, vec!["av1", "rd1"]);
    assert_eq!(restored.item_count(), 3);
    assert_eq!(restored.total(), Decimal::new(31000, 2));
}

#[test]
fn test_corrupt_file_restores_empty() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(FileCartStorage::new(dir.path()).path(), "{not json").unwrap();

    let mut cart = CartStore::open(FileCartStorage::new(dir.path()));
    assert!(cart.is_empty());

    // The next write replaces the corrupt payload.
    cart.add(&aviator(), 1).unwrap();
    assert_eq!(stored(dir.path())[0]["id"], json!("av1"));
}

#[test]
fn test_hand_edited_file_is_sanitized() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        FileCartStorage::new(dir.path()).path(),
        r#"[
            {"id": "av1", "name": "Aviator", "price": 80, "quantity": 1},
            {"id": "", "name": "Blank", "price": 10, "quantity": 1},
            {"id": "rd1", "name": "Round", "price": 150, "quantity": 0},
            {"id": "av1", "name": "Aviator", "price": 80, "quantity": 2}
        ]"#,
    )
    .unwrap();

    let cart = CartStore::open(FileCartStorage::new(dir.path()));
    let lines = cart.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 3);
}

#[test]
fn test_failed_write_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let mut cart = CartStore::open(FileCartStorage::new(dir.path()));
    cart.add(&aviator(), 1).unwrap();

    // Replace the payload file with a directory so the rename fails.
    let path = FileCartStorage::new(dir.path()).path().to_path_buf();
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();

    let result = cart.add(&aviator(), 1);
    assert!(matches!(result, Err(CartError::Persistence(_))));
    assert_eq!(cart.line(&aviator().id).unwrap().quantity, 1);
}
