//! Status enums derived from product records.

use serde::{Deserialize, Serialize};

/// Stock level bucket shown next to a product.
///
/// Purely informational: the cart never refuses a product because of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    Low,
    InStock,
}

impl StockLevel {
    /// Stock counts strictly below this (and above zero) are `Low`.
    pub const LOW_THRESHOLD: u32 = 10;

    /// Classify a stock count.
    #[must_use]
    pub const fn from_stock(stock: u32) -> Self {
        if stock == 0 {
            Self::OutOfStock
        } else if stock < Self::LOW_THRESHOLD {
            Self::Low
        } else {
            Self::InStock
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::OutOfStock => "Out of Stock",
            Self::Low => "Low Stock",
            Self::InStock => "In Stock",
        }
    }
}

/// Listing status filter for products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    Any,
    Active,
    Inactive,
}

impl StatusFilter {
    /// Parse a filter value. Anything unrecognized means [`StatusFilter::Any`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            _ => Self::Any,
        }
    }

    /// Whether a product with the given `active` flag passes this filter.
    #[must_use]
    pub const fn matches(&self, active: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Active => active,
            Self::Inactive => !active,
        }
    }
}
