//! Application state shared across handlers.

use std::sync::Arc;

use kenzy_core::cart::CartStorage;
use kenzy_core::{CartError, CartEvent, CartStore};
use tokio::sync::{Mutex, broadcast};

use crate::catalog::{CatalogService, CatalogSource};
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::events::{BroadcastObserver, EVENT_CAPACITY};
use crate::firestore::FirestoreClient;
use crate::storage::FileCartStorage;

/// The process-wide cart store, behind its storage trait object.
pub type DynCartStore = CartStore<Box<dyn CartStorage>>;

/// The process-wide cart.
pub type SharedCart = Mutex<DynCartStore>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the cart, the catalog and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogService,
    cart: Arc<SharedCart>,
    events: broadcast::Sender<CartEvent>,
}

impl AppState {
    /// Create state backed by Firestore and the on-disk cart.
    ///
    /// The cart is restored from `config.cart_dir` before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the Firestore endpoint cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, url::ParseError> {
        let source = Arc::new(FirestoreClient::new(&config.firebase)?);
        let storage = Box::new(FileCartStorage::new(&config.cart_dir));
        Ok(Self::with_parts(config, source, storage))
    }

    /// Create state from explicit parts. Used by tests and tooling.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        source: Arc<dyn CatalogSource>,
        storage: Box<dyn CartStorage>,
    ) -> Self {
        let catalog = CatalogService::new(source, config.firebase.cache_ttl);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let mut cart = CartStore::open(storage);
        cart.subscribe(BroadcastObserver::new(events.clone()));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                cart: Arc::new(Mutex::new(cart)),
                events,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the cached catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the shared cart.
    #[must_use]
    pub fn cart(&self) -> &SharedCart {
        &self.inner.cart
    }

    /// Run a cart mutation on the blocking pool.
    ///
    /// The cart lock is held until `mutate` returns, so the durable write is
    /// part of the critical section. The write itself runs off the async
    /// workers.
    ///
    /// # Errors
    ///
    /// Returns the mutation's [`CartError`] as an [`AppError`], or
    /// [`AppError::Internal`] if the blocking task panicked.
    pub async fn update_cart<T, F>(&self, mutate: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut DynCartStore) -> Result<T, CartError> + Send + 'static,
        T: Send + 'static,
    {
        let mut store = Arc::clone(&self.inner.cart).lock_owned().await;
        let span = tracing::Span::current();
        tokio::task::spawn_blocking(move || span.in_scope(|| mutate(&mut store)))
            .await
            .map_err(|err| AppError::Internal(format!("cart task failed: {err}")))?
            .map_err(AppError::from)
    }

    /// Subscribe to cart change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.inner.events.subscribe()
    }
}
