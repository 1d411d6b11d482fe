//! Cart route handlers.
//!
//! There is one cart per process. Each handler takes the cart lock only for
//! the mutation itself; catalog lookups happen before the lock is taken.
//! Mutations go through [`AppState::update_cart`], which runs the file write
//! on the blocking pool.

use std::convert::Infallible;

use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use kenzy_core::{Cart, CartLine, CurrencyCode, OrderId, ProductId, Receipt, format_amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::events::cart_events;
use crate::state::AppState;

/// Cart item display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub price: String,
    pub subtotal: Decimal,
    pub line_price: String,
}

impl CartItemView {
    fn new(line: &CartLine, currency: CurrencyCode) -> Self {
        let subtotal = line.subtotal();
        Self {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.amount(),
            price: line.unit_price.display(currency),
            subtotal,
            line_price: format_amount(subtotal, currency),
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u64,
    pub total: Decimal,
    pub total_display: String,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, currency: CurrencyCode) -> Self {
        Self {
            items: cart
                .lines
                .iter()
                .map(|l| CartItemView::new(l, currency))
                .collect(),
            item_count: cart.item_count,
            total: cart.total,
            total_display: format_amount(cart.total, currency),
        }
    }
}

/// Cart badge count.
#[derive(Debug, Serialize)]
pub struct CartCountView {
    pub count: u64,
}

/// Checkout confirmation.
#[derive(Debug, Serialize)]
pub struct ReceiptView {
    pub order_id: OrderId,
    pub placed_at: DateTime<Utc>,
    pub items: Vec<CartItemView>,
    pub item_count: u64,
    pub total: Decimal,
    pub total_display: String,
}

impl ReceiptView {
    fn new(receipt: &Receipt, currency: CurrencyCode) -> Self {
        Self {
            order_id: receipt.order_id,
            placed_at: receipt.placed_at,
            items: receipt
                .lines
                .iter()
                .map(|l| CartItemView::new(l, currency))
                .collect(),
            item_count: receipt.item_count,
            total: receipt.total,
            total_display: format_amount(receipt.total, currency),
        }
    }
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: i64,
}

/// Remove or delete request body.
#[derive(Debug, Deserialize)]
pub struct CartLineForm {
    pub product_id: String,
}

async fn current_view(state: &AppState) -> CartView {
    let cart = state.cart().lock().await.cart();
    CartView::new(&cart, state.config().currency)
}

/// GET /api/cart
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<CartView> {
    Json(current_view(&state).await)
}

/// GET /api/cart/count
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> Json<CartCountView> {
    let count = state.cart().lock().await.item_count();
    Json(CartCountView { count })
}

/// POST /api/cart/add
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Json(form): Json<AddToCartForm>,
) -> Result<Json<CartView>> {
    let product_id = ProductId::new(form.product_id);
    if product_id.is_empty() {
        return Err(AppError::BadRequest("product_id is required".to_string()));
    }

    let product = state
        .catalog()
        .product(&product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let quantity = form.quantity.unwrap_or(1);
    let cart = state
        .update_cart(move |store| {
            store.add(&product, quantity)?;
            Ok(store.cart())
        })
        .await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str())]),
    );
    Ok(Json(CartView::new(&cart, state.config().currency)))
}

/// POST /api/cart/update
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Json(form): Json<UpdateCartForm>,
) -> Result<Json<CartView>> {
    let product_id = ProductId::new(form.product_id);
    let quantity = form.quantity;
    let cart = state
        .update_cart(move |store| {
            store.set_quantity(&product_id, quantity)?;
            Ok(store.cart())
        })
        .await?;
    Ok(Json(CartView::new(&cart, state.config().currency)))
}

/// POST /api/cart/remove
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Json(form): Json<CartLineForm>,
) -> Result<Json<CartView>> {
    let product_id = ProductId::new(form.product_id);
    let cart = state
        .update_cart(move |store| {
            store.remove(&product_id)?;
            Ok(store.cart())
        })
        .await?;
    Ok(Json(CartView::new(&cart, state.config().currency)))
}

/// POST /api/cart/delete
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Json(form): Json<CartLineForm>,
) -> Result<Json<CartView>> {
    let product_id = ProductId::new(form.product_id);
    let cart = {
        let product_id = product_id.clone();
        state
            .update_cart(move |store| {
                store.delete(&product_id)?;
                Ok(store.cart())
            })
            .await?
    };
    add_breadcrumb(
        "cart",
        "Removed from cart",
        Some(&[("product_id", product_id.as_str())]),
    );
    Ok(Json(CartView::new(&cart, state.config().currency)))
}

/// POST /api/cart/clear
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Result<Json<CartView>> {
    let cart = state
        .update_cart(|store| {
            store.clear()?;
            Ok(store.cart())
        })
        .await?;
    Ok(Json(CartView::new(&cart, state.config().currency)))
}

/// POST /api/checkout
#[instrument(skip(state))]
pub async fn checkout(State(state): State<AppState>) -> Result<Json<ReceiptView>> {
    let receipt = state.update_cart(|store| store.checkout()).await?;

    let order_id = receipt.order_id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", &order_id)]));
    tracing::info!(
        order_id = %receipt.order_id,
        item_count = receipt.item_count,
        total = %receipt.total,
        "Order placed"
    );

    Ok(Json(ReceiptView::new(&receipt, state.config().currency)))
}

/// GET /api/cart/events
///
/// Streams a JSON `CartEvent` for every persisted cart change.
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let sse_stream = cart_events(state.subscribe()).map(|event| {
        let json = serde_json::to_string(&event).unwrap_or_else(|_| {
            r#"{"error":"Failed to serialize event"}"#.to_string()
        });
        Ok(Event::default().event("cart").data(json))
    });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}
