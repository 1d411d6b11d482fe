//! Integration tests for Kenzy Specs.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kenzy-integration-tests
//! ```
//!
//! Tests run the storefront router in-process against a fixed catalog and a
//! cart file in a temporary directory. No network access is needed.
//!
//! # Test Categories
//!
//! - `cart_file_store` - Cart persistence through the file backend
//! - `storefront_routes` - HTTP API behaviour

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use kenzy_core::{CurrencyCode, Price, Product};
use kenzy_storefront::catalog::{CatalogSource, StaticCatalog};
use kenzy_storefront::config::{FirebaseConfig, StorefrontConfig};
use kenzy_storefront::state::AppState;
use kenzy_storefront::storage::FileCartStorage;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

/// The catalog used across tests.
///
/// | id   | name    | price  | stock | category    | active |
/// |------|---------|--------|-------|-------------|--------|
/// | av1  | Aviator | 80.00  | 12    | Sunglasses  | yes    |
/// | rd1  | Round   | 150.00 | 3     | Optical     | yes    |
/// | ce1  | Cat-Eye | 250.00 | 0     | Sunglasses  | no     |
#[must_use]
pub fn sample_products() -> Vec<Product> {
    let product = |id: &str, name: &str, cents: i64, stock: u32, category: &str, active: bool| {
        let mut p = Product::new(id, name, Price::new(Decimal::new(cents, 2)).unwrap());
        p.stock = stock;
        p.category = Some(category.to_string());
        p.description = Some(format!("{name} frames"));
        p.active = active;
        p
    };

    vec![
        product("av1", "Aviator", 8000, 12, "Sunglasses", true),
        product("rd1", "Round", 15000, 3, "Optical", true),
        product("ce1", "Cat-Eye", 25000, 0, "Sunglasses", false),
    ]
}

/// Configuration pointing at `cart_dir` with a dummy Firestore project.
#[must_use]
pub fn test_config(cart_dir: &Path) -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        cart_dir: cart_dir.to_path_buf(),
        currency: CurrencyCode::GHS,
        firebase: FirebaseConfig {
            project_id: "kenzy-test".to_string(),
            api_key: SecretString::from("test-key"),
            products_collection: "spectacles".to_string(),
            base_url: Url::parse("http://127.0.0.1:9/v1").unwrap(),
            cache_ttl: Duration::from_secs(60),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// An in-process storefront with its own cart directory.
pub struct TestContext {
    pub state: AppState,
    pub app: Router,
    dir: TempDir,
}

impl TestContext {
    /// Storefront over [`sample_products`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(Arc::new(StaticCatalog::new(sample_products())))
    }

    /// Storefront over a custom catalog source.
    #[must_use]
    pub fn with_source(source: Arc<dyn CatalogSource>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self::in_dir(dir, source)
    }

    /// Storefront using an existing cart directory.
    #[must_use]
    pub fn in_dir(dir: TempDir, source: Arc<dyn CatalogSource>) -> Self {
        let storage = Box::new(FileCartStorage::new(dir.path()));
        let state = AppState::with_parts(test_config(dir.path()), source, storage);
        let app = kenzy_storefront::app(state.clone());
        Self { state, app, dir }
    }

    /// Path of the cart file.
    #[must_use]
    pub fn cart_file(&self) -> PathBuf {
        FileCartStorage::new(self.dir.path()).path().to_path_buf()
    }

    /// Give up the context, keeping the cart directory alive.
    #[must_use]
    pub fn into_dir(self) -> TempDir {
        self.dir
    }

    /// Send a GET request and decode the JSON body.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
