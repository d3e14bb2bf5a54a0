//! Cart route handlers.
//!
//! Every mutation answers with the full cart view. If the new state could not
//! be persisted the view carries a `warning`; the in-memory cart still holds
//! the change.

use axum::{Json, extract::State};
use cartoon_cart_core::{CartLine, Price, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cart::{CartStore, CartUpdate, DEFAULT_QUANTITY};
use crate::error::{AppError, Result};
use crate::routes::JsonBody;
use crate::services::price_feed::PriceTicker;
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    #[serde(flatten)]
    pub line: CartLine,
    pub price: String,
    pub line_price: String,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            line: line.clone(),
            price: Price::usd(line.usd_price).to_string(),
            line_price: Price::usd(line.line_total()).to_string(),
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    /// Exact total in USD.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// Total rounded for display, e.g. `$3.77`.
    pub subtotal: String,
    /// Total in SOL at the current quote, if known.
    pub sol_total: Option<String>,
    pub item_count: u64,
    /// Set when the change could not be saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl CartView {
    fn build(store: &CartStore, ticker: &PriceTicker, warning: Option<String>) -> Self {
        let total = store.total();
        Self {
            items: store.lines().iter().map(CartItemView::from).collect(),
            total,
            subtotal: Price::usd(total).to_string(),
            sol_total: ticker.sol_price_of(total).map(|p| p.to_string()),
            item_count: store.item_count(),
            warning,
        }
    }

    fn after(store: &CartStore, ticker: &PriceTicker, update: &CartUpdate) -> Self {
        let warning = update
            .warning
            .as_ref()
            .map(|e| format!("Cart changes could not be saved: {e}"));
        Self::build(store, ticker, warning)
    }
}

/// Cart badge count.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u64,
}

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update-quantity request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove-line request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

/// Show the cart.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<CartView> {
    let store = state.cart();
    Json(CartView::build(&store, state.ticker(), None))
}

/// Total units in the cart.
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> Json<CartCount> {
    Json(CartCount {
        count: state.cart().item_count(),
    })
}

/// Add a catalog product to the cart.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let product = state
        .catalog()
        .find_product(request.product_id)
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    let mut store = state.cart();
    let update = store.add_item(product, request.quantity.unwrap_or(DEFAULT_QUANTITY))?;
    Ok(Json(CartView::after(&store, state.ticker(), &update)))
}

/// Set a line's quantity. Zero removes the line; unknown ids are a no-op.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let mut store = state.cart();
    let update = store.set_quantity(request.product_id, request.quantity)?;
    Ok(Json(CartView::after(&store, state.ticker(), &update)))
}

/// Remove a line. Unknown ids are a no-op.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RemoveFromCartRequest>,
) -> Json<CartView> {
    let mut store = state.cart();
    let update = store.remove_item(request.product_id);
    Json(CartView::after(&store, state.ticker(), &update))
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Json<CartView> {
    let mut store = state.cart();
    let update = store.clear();
    Json(CartView::after(&store, state.ticker(), &update))
}
