//! Catalog commands.
//!
//! # Environment Variables
//!
//! - `FIREBASE_PROJECT_ID` - Firebase project hosting the catalog
//! - `FIREBASE_API_KEY` - Firebase web API key
//!
//! `check-draft` works offline and needs neither.

use std::path::Path;

use kenzy_core::{
    CatalogFilter, CatalogSummary, CurrencyCode, Product, ProductDraft, ProductDraftError,
    ValidProduct,
};
use kenzy_storefront::config::FirebaseConfig;
use kenzy_storefront::firestore::FirestoreClient;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

async fn fetch() -> Result<Vec<Product>> {
    dotenvy::dotenv().ok();
    let client = FirestoreClient::new(&FirebaseConfig::from_env()?)?;
    tracing::info!("Fetching catalog...");
    Ok(client.list_products().await?)
}

/// List products matching the given filters.
///
/// # Errors
///
/// Returns an error if configuration is missing or the catalog cannot be read.
pub async fn list(
    query: Option<&str>,
    price: Option<&str>,
    category: Option<&str>,
    status: Option<&str>,
) -> Result<()> {
    let products = fetch().await?;
    let filter = CatalogFilter::from_params(query, price, category, status);
    let matches = filter.apply(&products);

    for product in &matches {
        tracing::info!(
            "  {:<20} {:<30} {:>14}  {:<12} {}",
            product.id,
            product.name,
            product.price.display(CurrencyCode::GHS),
            product.stock_level().label(),
            product.category.as_deref().unwrap_or("Uncategorized")
        );
    }
    tracing::info!("{} of {} products", matches.len(), products.len());
    Ok(())
}

/// Show stock counts.
///
/// # Errors
///
/// Returns an error if configuration is missing or the catalog cannot be read.
pub async fn summary() -> Result<()> {
    let summary = CatalogSummary::from_products(&fetch().await?);
    tracing::info!("Total products: {}", summary.total);
    tracing::info!("  In stock:     {}", summary.in_stock);
    tracing::info!("  Low stock:    {}", summary.low_stock);
    tracing::info!("  Out of stock: {}", summary.out_of_stock);
    tracing::info!("  Inactive:     {}", summary.inactive);
    Ok(())
}

/// Validate a product form saved as JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not a draft, or has
/// invalid fields.
pub fn check_draft(path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)?;
    match parse_draft(&raw)? {
        Ok(product) => {
            tracing::info!("Draft is valid");
            tracing::info!("  Name:     {}", product.name);
            tracing::info!("  Price:    {}", product.price.display(CurrencyCode::GHS));
            tracing::info!("  Stock:    {}", product.stock);
            tracing::info!("  Category: {}", product.category);
            tracing::info!("  Image:    {}", product.image);
            Ok(())
        }
        Err(errors) => {
            for error in &errors {
                tracing::warn!("  {error}");
            }
            Err(format!("draft has {} invalid field(s)", errors.len()).into())
        }
    }
}

fn parse_draft(
    raw: &str,
) -> serde_json::Result<std::result::Result<ValidProduct, Vec<ProductDraftError>>> {
    serde_json::from_str::<ProductDraft>(raw).map(|draft| draft.validate())
}
