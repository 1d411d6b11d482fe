//! Catalog filtering and dashboard counts.
//!
//! Filtering is a pure function over an already-fetched product list; the
//! relative order of the input is preserved.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Product, StatusFilter, StockLevel};

/// Price range selector offered next to the search box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceBucket {
    /// price ≤ 100
    UpTo100,
    /// 100 < price ≤ 200
    From100To200,
    /// price > 200
    Over200,
}

impl PriceBucket {
    /// Parse a bucket selector (`0-100`, `100-200`, `200+`).
    ///
    /// The comparison forms `<=100` / `≤100`, `100-200` and `>200` / `200-`
    /// are accepted too. Empty or unrecognized values yield `None`, meaning
    /// no price filter.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "0-100" | "<=100" | "≤100" => Some(Self::UpTo100),
            "100-200" => Some(Self::From100To200),
            "200+" | ">200" | "200-" => Some(Self::Over200),
            _ => None,
        }
    }

    /// The selector string for this bucket.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UpTo100 => "0-100",
            Self::From100To200 => "100-200",
            Self::Over200 => "200+",
        }
    }

    /// Whether `price` falls in this bucket.
    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        let hundred = Decimal::ONE_HUNDRED;
        let two_hundred = Decimal::TWO * hundred;
        match self {
            Self::UpTo100 => price <= hundred,
            Self::From100To200 => price > hundred && price <= two_hundred,
            Self::Over200 => price > two_hundred,
        }
    }
}

/// Criteria for narrowing a product list. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Free text matched case-insensitively against name, description and
    /// category.
    pub query: String,
    pub price: Option<PriceBucket>,
    /// Exact category match.
    pub category: Option<String>,
    pub status: StatusFilter,
}

impl CatalogFilter {
    /// Build a filter from raw form values, applying the permissive defaults.
    #[must_use]
    pub fn from_params(
        query: Option<&str>,
        price: Option<&str>,
        category: Option<&str>,
        status: Option<&str>,
    ) -> Self {
        Self {
            query: query.unwrap_or_default().to_owned(),
            price: price.and_then(PriceBucket::parse),
            category: category
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned),
            status: status.map(StatusFilter::parse).unwrap_or_default(),
        }
    }

    /// Whether a single product passes every criterion.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.matches_with(product, &self.query.trim().to_lowercase())
    }

    /// Apply the filter, keeping the input order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let needle = self.query.trim().to_lowercase();
        products
            .iter()
            .filter(|p| self.matches_with(p, &needle))
            .collect()
    }

    fn matches_with(&self, product: &Product, needle: &str) -> bool {
        let text_matches = needle.is_empty() || {
            let contains = |text: &str| text.to_lowercase().contains(needle);
            contains(&product.name)
                || product.description.as_deref().is_some_and(contains)
                || product.category.as_deref().is_some_and(contains)
        };

        text_matches
            && self
                .price
                .is_none_or(|bucket| bucket.contains(product.price.amount()))
            && self
                .category
                .as_deref()
                .is_none_or(|c| product.category.as_deref() == Some(c))
            && self.status.matches(product.active)
    }
}

/// Filter `products` by free text and price bucket selector.
///
/// Convenience wrapper over [`CatalogFilter`] for the storefront search box.
#[must_use]
pub fn filter_products(products: &[Product], query: &str, price: Option<&str>) -> Vec<Product> {
    CatalogFilter::from_params(Some(query), price, None, None)
        .apply(products)
        .into_iter()
        .cloned()
        .collect()
}

/// Product counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub total: usize,
    /// Active products with stock.
    pub in_stock: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub inactive: usize,
}

impl CatalogSummary {
    #[must_use]
    pub fn from_products(products: &[Product]) -> Self {
        products.iter().fold(
            Self {
                total: products.len(),
                ..Self::default()
            },
            |mut summary, product| {
                match product.stock_level() {
                    StockLevel::OutOfStock => summary.out_of_stock += 1,
                    StockLevel::Low => summary.low_stock += 1,
                    StockLevel::InStock => {}
                }
                if product.stock > 0 && product.active {
                    summary.in_stock += 1;
                }
                if !product.active {
                    summary.inactive += 1;
                }
                summary
            },
        )
    }
}
