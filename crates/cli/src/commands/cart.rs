//! Cart commands.
//!
//! Each command opens the cart file, applies one operation and exits. The
//! file is the same one the storefront server uses, so the server should not
//! be running while these commands change it.
//!
//! # Usage
//!
//! ```bash
//! kenzy cart --cart-dir data show
//! kenzy cart add av1 -q 2
//! kenzy cart checkout
//! ```

use std::path::Path;

use kenzy_core::{Cart, CartStore, CurrencyCode, ProductId, format_amount};
use kenzy_storefront::config::FirebaseConfig;
use kenzy_storefront::firestore::FirestoreClient;
use kenzy_storefront::storage::FileCartStorage;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const CURRENCY: CurrencyCode = CurrencyCode::GHS;

fn open(cart_dir: &Path) -> CartStore<FileCartStorage> {
    let storage = FileCartStorage::new(cart_dir);
    tracing::debug!(path = %storage.path().display(), "Opening cart");
    CartStore::open(storage)
}

fn log_cart(cart: &Cart) {
    if cart.is_empty() {
        tracing::info!("Cart is empty");
        return;
    }

    for line in &cart.lines {
        tracing::info!(
            "  {} x{} @ {} = {}  [{}]",
            line.name,
            line.quantity,
            line.unit_price.display(CURRENCY),
            format_amount(line.subtotal(), CURRENCY),
            line.product_id
        );
    }
    tracing::info!(
        "Items: {}  Total: {}",
        cart.item_count,
        format_amount(cart.total, CURRENCY)
    );
}

/// Show the cart.
///
/// # Errors
///
/// Infallible today; returns `Result` like the other commands.
pub fn show(cart_dir: &Path) -> Result<()> {
    log_cart(&open(cart_dir).cart());
    Ok(())
}

/// Add a catalog product to the cart.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read, the product does not
/// exist, or the cart cannot be saved.
pub async fn add(cart_dir: &Path, product_id: &str, quantity: u32) -> Result<()> {
    dotenvy::dotenv().ok();
    let client = FirestoreClient::new(&FirebaseConfig::from_env()?)?;
    let id = ProductId::new(product_id);

    tracing::info!("Fetching catalog...");
    let product = client
        .list_products()
        .await?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| format!("Product not found: {product_id}"))?;

    let mut cart = open(cart_dir);
    let line = cart.add(&product, quantity)?;
    tracing::info!("Added {} (now x{})", line.name, line.quantity);
    log_cart(&cart.cart());
    Ok(())
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns an error if the line does not exist or the cart cannot be saved.
pub fn set(cart_dir: &Path, product_id: &str, quantity: i64) -> Result<()> {
    let mut cart = open(cart_dir);
    match cart.set_quantity(&ProductId::new(product_id), quantity)? {
        Some(line) => tracing::info!("{} is now x{}", line.name, line.quantity),
        None => tracing::info!("Removed {product_id}"),
    }
    log_cart(&cart.cart());
    Ok(())
}

/// Decrement a line by one.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub fn remove(cart_dir: &Path, product_id: &str) -> Result<()> {
    let mut cart = open(cart_dir);
    if cart.remove(&ProductId::new(product_id))?.is_none() {
        tracing::info!("{product_id} is not in the cart");
    }
    log_cart(&cart.cart());
    Ok(())
}

/// Remove a line entirely.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub fn delete(cart_dir: &Path, product_id: &str) -> Result<()> {
    let mut cart = open(cart_dir);
    if cart.delete(&ProductId::new(product_id))?.is_none() {
        tracing::info!("{product_id} is not in the cart");
    }
    log_cart(&cart.cart());
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub fn clear(cart_dir: &Path) -> Result<()> {
    open(cart_dir).clear()?;
    tracing::info!("Cart cleared");
    Ok(())
}

/// Place the order.
///
/// # Errors
///
/// Returns an error if the cart is empty or cannot be saved.
pub fn checkout(cart_dir: &Path) -> Result<()> {
    let receipt = open(cart_dir).checkout()?;
    tracing::info!("Order placed!");
    tracing::info!("  Order: {}", receipt.order_id);
    tracing::info!("  Items: {}", receipt.item_count);
    tracing::info!("  Total: {}", format_amount(receipt.total, CURRENCY));
    Ok(())
}
