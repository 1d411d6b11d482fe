//! Property tests for the cart store.
//!
//! Random sequences of cart operations must keep the line invariants and the
//! total, and storage must always agree with memory.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use kenzy_core::cart::{MemoryCartStorage, decode_lines};
use kenzy_core::{CartError, CartStore, Price, Product, ProductId};
use proptest::prelude::*;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
enum Op {
    Add { product: usize, quantity: u32 },
    SetQuantity { product: usize, quantity: i64 },
    Remove { product: usize },
    Delete { product: usize },
    Clear,
    FailNextWrite,
}

fn catalog() -> Vec<Product> {
    ["p0", "p1", "p2", "p3"]
        .iter()
        .zip([1950_i64, 8000, 15050, 25000])
        .map(|(id, cents)| {
            Product::new(*id, id.to_uppercase(), Price::new(Decimal::new(cents, 2)).unwrap())
        })
        .collect()
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..4usize, 1..5u32).prop_map(|(product, quantity)| Op::Add { product, quantity }),
        2 => (0..4usize, -2..6i64).prop_map(|(product, quantity)| Op::SetQuantity { product, quantity }),
        2 => (0..4usize).prop_map(|product| Op::Remove { product }),
        1 => (0..4usize).prop_map(|product| Op::Delete { product }),
        1 => Just(Op::Clear),
        1 => Just(Op::FailNextWrite),
    ]
}

fn product_at(products: &[Product], index: usize) -> &Product {
    products.get(index).unwrap()
}

proptest! {
    #[test]
    fn prop_cart_invariants_hold(ops in prop::collection::vec(arb_op(), 1..40)) {
        let products = catalog();
        let storage = MemoryCartStorage::new();
        let mut cart = CartStore::open(storage.clone());

        for op in ops {
            storage.set_fail_writes(false);
            let result = match op {
                Op::Add { product, quantity } => {
                    cart.add(product_at(&products, product), quantity).map(|_| ())
                }
                Op::SetQuantity { product, quantity } => {
                    let id = &product_at(&products, product).id;
                    match cart.set_quantity(id, quantity) {
                        Err(CartError::NotFound(_)) => {
                            prop_assert!(cart.line(id).is_none());
                            Ok(())
                        }
                        other => other.map(|_| ()),
                    }
                }
                Op::Remove { product } => cart.remove(&product_at(&products, product).id).map(|_| ()),
                Op::Delete { product } => cart.delete(&product_at(&products, product).id).map(|_| ()),
                Op::Clear => cart.clear(),
                Op::FailNextWrite => {
                    storage.set_fail_writes(true);
                    let outcome = cart.add(product_at(&products, 0), 1);
                    prop_assert!(matches!(outcome, Err(CartError::Persistence(_))));
                    Ok(())
                }
            };
            prop_assert!(result.is_ok(), "unexpected error: {:?}", result);

            let lines = cart.lines();
            let expected: Decimal = lines
                .iter()
                .map(|l| l.unit_price.amount() * Decimal::from(l.quantity))
                .sum();
            prop_assert_eq!(cart.total(), expected);
            prop_assert_eq!(cart.item_count(), lines.iter().map(|l| u64::from(l.quantity)).sum::<u64>());

            let ids: HashSet<&ProductId> = lines.iter().map(|l| &l.product_id).collect();
            prop_assert_eq!(ids.len(), lines.len());
            prop_assert!(lines.iter().all(|l| l.quantity >= 1));

            if let Some(payload) = storage.payload() {
                prop_assert_eq!(decode_lines(&payload).unwrap(), lines);
            } else {
                prop_assert!(lines.is_empty());
            }
        }
    }
}
