//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (catalog reachable)
//!
//! # Catalog
//! GET  /api/products           - Filtered listing (?q=&price=&category=&status=)
//! GET  /api/products/{id}      - Product detail
//! GET  /api/catalog/summary    - Stock counts
//!
//! # Cart
//! GET  /api/cart               - Cart contents and total
//! GET  /api/cart/count         - Item count badge
//! POST /api/cart/add           - Add a product
//! POST /api/cart/update        - Set a line quantity
//! POST /api/cart/remove        - Decrement a line by one
//! POST /api/cart/delete        - Remove a line entirely
//! POST /api/cart/clear         - Empty the cart
//! GET  /api/cart/events        - Cart change stream (SSE)
//! POST /api/checkout           - Place the order and clear the cart
//!
//! # Forms
//! POST /api/contact            - Contact form
//! POST /api/newsletter         - Newsletter signup
//! ```

pub mod cart;
pub mod catalog;
pub mod contact;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::index))
        .route("/products/{id}", get(catalog::show))
        .route("/catalog/summary", get(catalog::summary))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/delete", post(cart::delete))
        .route("/clear", post(cart::clear))
        .route("/events", get(cart::events))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", catalog_routes())
        .nest("/api/cart", cart_routes())
        .route("/api/checkout", post(cart::checkout))
        .route("/api/contact", post(contact::contact))
        .route("/api/newsletter", post(contact::newsletter))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the latest catalog fetch failed.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.catalog().snapshot().await.error.is_none() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
