//! Catalog product records and admin draft validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::id::ProductId;
use super::price::Price;
use super::status::StockLevel;

/// A purchasable product, as read from the external catalog.
///
/// The storefront never mutates products. Missing optional fields fall back
/// to the defaults declared here rather than at call sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

const fn default_active() -> bool {
    true
}

impl Product {
    /// Create an active product with no stock, category or description.
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock: 0,
            category: None,
            description: None,
            active: true,
            image: String::new(),
            created_at: None,
        }
    }

    /// Stock bucket for display.
    #[must_use]
    pub const fn stock_level(&self) -> StockLevel {
        StockLevel::from_stock(self.stock)
    }
}

/// A field-level problem found while validating a [`ProductDraft`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductDraftError {
    #[error("name must be at least {min} characters")]
    NameTooShort { min: usize },
    #[error("valid price required")]
    InvalidPrice,
    #[error("valid stock quantity required")]
    InvalidStock,
    #[error("image URL required")]
    MissingImage,
    #[error("invalid image URL")]
    InvalidImage,
    #[error("please select a category")]
    MissingCategory,
}

/// Raw product form input, as typed by an administrator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub price: String,
    pub stock: String,
    pub image: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The typed fields of a draft that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
    pub name: String,
    pub price: Price,
    pub stock: u32,
    pub image: Url,
    pub category: String,
    pub description: Option<String>,
    pub active: bool,
}

impl ProductDraft {
    pub const MIN_NAME_LENGTH: usize = 3;

    /// Validate every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns one [`ProductDraftError`] per failing field, in form order.
    pub fn validate(&self) -> Result<ValidProduct, Vec<ProductDraftError>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.chars().count() < Self::MIN_NAME_LENGTH {
            errors.push(ProductDraftError::NameTooShort {
                min: Self::MIN_NAME_LENGTH,
            });
        }

        let price = self
            .price
            .parse::<Price>()
            .ok()
            .filter(|p| !p.amount().is_zero());
        if price.is_none() {
            errors.push(ProductDraftError::InvalidPrice);
        }

        let stock = self.stock.trim().parse::<u32>().ok();
        if stock.is_none() {
            errors.push(ProductDraftError::InvalidStock);
        }

        let image_raw = self.image.trim();
        let image = if image_raw.is_empty() {
            errors.push(ProductDraftError::MissingImage);
            None
        } else {
            let parsed = Url::parse(image_raw).ok();
            if parsed.is_none() {
                errors.push(ProductDraftError::InvalidImage);
            }
            parsed
        };

        let category = self.category.trim();
        if category.is_empty() {
            errors.push(ProductDraftError::MissingCategory);
        }

        match (price, stock, image) {
            (Some(price), Some(stock), Some(image)) if errors.is_empty() => Ok(ValidProduct {
                name: name.to_owned(),
                price,
                stock,
                image,
                category: category.to_owned(),
                description: self
                    .description
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_owned),
                active: true,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Aviator Gold".to_string(),
            price: "80.00".to_string(),
            stock: "12".to_string(),
            image: "https://cdn.example.com/aviator.jpg".to_string(),
            category: "Classic".to_string(),
            description: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_product_defaults_from_sparse_json() {
        let product: Product =
            serde_json::from_str(r#"{"id":"p1","name":"Round","price":150}"#).unwrap();
        assert_eq!(product.stock, 0);
        assert!(product.active);
        assert!(product.category.is_none());
        assert!(product.image.is_empty());
        assert_eq!(product.stock_level(), StockLevel::OutOfStock);
    }

    #[test]
    fn test_valid_draft() {
        let valid = draft().validate().unwrap();
        assert_eq!(valid.name, "Aviator Gold");
        assert_eq!(valid.stock, 12);
        assert!(valid.active);
        assert!(valid.description.is_none());
    }

    #[test]
    fn test_draft_collects_all_errors() {
        let bad = ProductDraft {
            name: " ab ".to_string(),
            price: "0".to_string(),
            stock: "-1".to_string(),
            image: "not a url".to_string(),
            category: String::new(),
            description: None,
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                ProductDraftError::NameTooShort { min: 3 },
                ProductDraftError::InvalidPrice,
                ProductDraftError::InvalidStock,
                ProductDraftError::InvalidImage,
                ProductDraftError::MissingCategory,
            ]
        );
    }

    #[test]
    fn test_draft_missing_image() {
        let mut d = draft();
        d.image = "   ".to_string();
        assert_eq!(d.validate().unwrap_err(), vec![ProductDraftError::MissingImage]);
    }

    #[test]
    fn test_zero_stock_is_valid() {
        let mut d = draft();
        d.stock = "0".to_string();
        assert_eq!(d.validate().unwrap().stock, 0);
    }
}
