//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use kenzy_core::{
    CatalogFilter, CatalogSummary, CurrencyCode, Price, Product, ProductId, StockLevel,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product display data.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub price_display: String,
    pub stock: u32,
    pub stock_level: StockLevel,
    pub stock_label: &'static str,
    pub category: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    pub image: String,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        let stock_level = product.stock_level();
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            price_display: product.price.display(currency),
            stock: product.stock,
            stock_level,
            stock_label: stock_level.label(),
            category: product.category.clone(),
            description: product.description.clone(),
            active: product.active,
            image: product.image.clone(),
        }
    }
}

/// Product listing response.
#[derive(Debug, Serialize)]
pub struct ProductListView {
    pub products: Vec<ProductView>,
    pub count: usize,
    /// True when the latest fetch failed and these are the last good results.
    pub stale: bool,
}

/// Listing query parameters. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

impl ProductQuery {
    fn filter(&self) -> CatalogFilter {
        CatalogFilter::from_params(
            self.q.as_deref(),
            self.price.as_deref(),
            self.category.as_deref(),
            self.status.as_deref(),
        )
    }
}

/// GET /api/products
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductListView>> {
    let snapshot = state.catalog().snapshot().await;
    if let Some(error) = snapshot.error.clone()
        && snapshot.products.is_empty()
    {
        return Err(AppError::Catalog(error));
    }

    let currency = state.config().currency;
    let products: Vec<ProductView> = query
        .filter()
        .apply(&snapshot.products)
        .into_iter()
        .map(|p| ProductView::new(p, currency))
        .collect();

    Ok(Json(ProductListView {
        count: products.len(),
        products,
        stale: snapshot.error.is_some(),
    }))
}

/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>> {
    let id = ProductId::new(id);
    let product = state
        .catalog()
        .product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(Json(ProductView::new(&product, state.config().currency)))
}

/// GET /api/catalog/summary
#[instrument(skip(state))]
pub async fn summary(State(state): State<AppState>) -> Result<Json<CatalogSummary>> {
    let snapshot = state.catalog().snapshot().await;
    if let Some(error) = snapshot.error
        && snapshot.products.is_empty()
    {
        return Err(AppError::Catalog(error));
    }
    Ok(Json(CatalogSummary::from_products(&snapshot.products)))
}
