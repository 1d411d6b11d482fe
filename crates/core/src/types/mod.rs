//! Core types for Kenzy Specs.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use contact::{ContactMessage, FormError, NewsletterSignup};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price, PriceError, format_amount};
pub use product::{Product, ProductDraft, ProductDraftError, ValidProduct};
pub use status::*;
