//! Kenzy Core - Domain types and cart state for Kenzy Specs.
//!
//! This crate is shared by every Kenzy Specs component:
//! - `storefront` - JSON storefront server
//! - `cli` - Command-line cart and catalog tools
//!
//! # Architecture
//!
//! The core crate holds types, the cart store and catalog filtering. It does
//! no network I/O; durable cart storage is reached through the
//! [`cart::CartStorage`] trait, implemented by the storefront crate.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, emails, products and form submissions
//! - [`cart`] - `CartStore` and the cart payload format
//! - [`catalog`] - Product filtering and dashboard counts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod types;

pub use cart::{Cart, CartError, CartEvent, CartEventKind, CartLine, CartObserver, CartStore, Receipt};
pub use catalog::{CatalogFilter, CatalogSummary, PriceBucket, filter_products};
pub use types::*;
