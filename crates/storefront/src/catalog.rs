//! Read-only product catalog backed by an external source.
//!
//! The source is a black box returning an ordered product list. Results are
//! cached with `moka`; concurrent loads are coalesced into one fetch. When a
//! fetch fails, callers get the last good list together with the error.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures::future::BoxFuture;
use kenzy_core::{Product, ProductId};
use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument, warn};

const PRODUCTS_KEY: &str = "products";

/// Errors fetching the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("catalog backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The source could not be reached for another reason.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Something that can list the catalog.
pub trait CatalogSource: Send + Sync {
    /// Fetch every product, in the order the source returns them.
    fn fetch_products(&self) -> BoxFuture<'_, Result<Vec<Product>, CatalogError>>;
}

/// A fixed product list. Used by tests and offline tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Vec<Product>,
}

impl StaticCatalog {
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

impl CatalogSource for StaticCatalog {
    fn fetch_products(&self) -> BoxFuture<'_, Result<Vec<Product>, CatalogError>> {
        let products = self.products.clone();
        Box::pin(async move { Ok(products) })
    }
}

/// The catalog as seen by a caller: possibly stale products plus the error
/// that made them stale.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub products: Arc<Vec<Product>>,
    pub error: Option<Arc<CatalogError>>,
}

impl CatalogSnapshot {
    /// Look up a product by ID.
    #[must_use]
    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }
}

/// Cached access to a [`CatalogSource`].
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    source: Arc<dyn CatalogSource>,
    cache: Cache<&'static str, Arc<Vec<Product>>>,
    last_good: RwLock<Arc<Vec<Product>>>,
}

impl CatalogService {
    /// Wrap `source`, reusing a fetched list for `ttl`.
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner {
                source,
                cache,
                last_good: RwLock::new(Arc::new(Vec::new())),
            }),
        }
    }

    /// Current catalog. Never fails: on a fetch error the last good list
    /// (empty if there never was one) is returned with the error attached.
    #[instrument(skip(self))]
    pub async fn snapshot(&self) -> CatalogSnapshot {
        let source = Arc::clone(&self.inner.source);
        let fetched = self
            .inner
            .cache
            .try_get_with(PRODUCTS_KEY, async move {
                let products = source.fetch_products().await?;
                debug!(count = products.len(), "Catalog fetched");
                Ok::<_, CatalogError>(Arc::new(products))
            })
            .await;

        match fetched {
            Ok(products) => {
                *self
                    .inner
                    .last_good
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&products);
                CatalogSnapshot {
                    products,
                    error: None,
                }
            }
            Err(error) => {
                let products = Arc::clone(
                    &self
                        .inner
                        .last_good
                        .read()
                        .unwrap_or_else(PoisonError::into_inner),
                );
                warn!(
                    error = %error,
                    stale_count = products.len(),
                    "Catalog fetch failed, serving last good list"
                );
                CatalogSnapshot {
                    products,
                    error: Some(error),
                }
            }
        }
    }

    /// Look up one product.
    ///
    /// # Errors
    ///
    /// Returns the fetch error if the product is not in the (possibly stale)
    /// list and the latest fetch failed.
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>, Arc<CatalogError>> {
        let snapshot = self.snapshot().await;
        match (snapshot.find(id), snapshot.error.clone()) {
            (Some(product), _) => Ok(Some(product.clone())),
            (None, Some(error)) => Err(error),
            (None, None) => Ok(None),
        }
    }

    /// Drop the cached list so the next read fetches again.
    pub fn invalidate(&self) {
        self.inner.cache.invalidate_all();
    }
}
