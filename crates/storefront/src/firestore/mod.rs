//! Firestore REST client for the product catalog.
//!
//! Lists the products collection with a single `runQuery` call, newest first.
//! Caching lives one level up in [`crate::catalog::CatalogService`].

mod conversions;
pub mod types;

use std::sync::Arc;

use futures::future::BoxFuture;
use kenzy_core::Product;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};
use url::Url;

use crate::catalog::{CatalogError, CatalogSource};
use crate::config::FirebaseConfig;

pub use conversions::{convert_product, convert_products};
use types::{RunQueryItem, RunQueryRequest};

/// Client for the Firestore REST API.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

struct FirestoreClientInner {
    client: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
    collection: String,
}

impl FirestoreClient {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL cannot be built from the config.
    pub fn new(config: &FirebaseConfig) -> Result<Self, url::ParseError> {
        let endpoint = Url::parse(&format!(
            "{}/projects/{}/databases/(default)/documents:runQuery",
            config.base_url.as_str().trim_end_matches('/'),
            config.project_id
        ))?;

        Ok(Self {
            inner: Arc::new(FirestoreClientInner {
                client: reqwest::Client::new(),
                endpoint,
                api_key: config.api_key.clone(),
                collection: config.products_collection.clone(),
            }),
        })
    }

    /// The `runQuery` endpoint, without the API key.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// List every product in the collection, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the backend rejects it, or the
    /// response is not a `runQuery` result.
    #[instrument(skip(self), fields(collection = %self.inner.collection))]
    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        let mut url = self.inner.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("key", self.inner.api_key.expose_secret());

        let response = self
            .inner
            .client
            .post(url)
            .json(&RunQueryRequest::newest_first(&self.inner.collection))
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Firestore returned non-success status"
            );
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: response_text.chars().take(200).collect(),
            });
        }

        let items: Vec<RunQueryItem> = match serde_json::from_str(&response_text) {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Firestore runQuery response"
                );
                return Err(CatalogError::Parse(e));
            }
        };

        let products = convert_products(items);
        debug!(count = products.len(), "Loaded products from Firestore");
        Ok(products)
    }
}

impl CatalogSource for FirestoreClient {
    fn fetch_products(&self) -> BoxFuture<'_, Result<Vec<Product>, CatalogError>> {
        Box::pin(self.list_products())
    }
}
