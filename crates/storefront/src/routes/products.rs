//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use cartoon_cart_core::{Category, Product, ProductId};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::price_feed::PriceTicker;
use crate::state::AppState;

/// Product as shown in listings and detail views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// Formatted USD price, e.g. `$0.99`.
    pub price: String,
    /// Formatted SOL price at the current quote, if known.
    pub sol_price: Option<String>,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, ticker: &PriceTicker) -> Self {
        Self {
            product: product.clone(),
            price: product.price().to_string(),
            sol_price: ticker
                .sol_price_of(product.usd_price)
                .map(|p| p.to_string()),
        }
    }
}

/// Category without its products.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub slug: String,
    pub image: String,
    pub product_count: usize,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            image: category.image.clone(),
            product_count: category.products.len(),
        }
    }
}

/// Products of one category.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    /// Canonical category name, or the requested name if none matched.
    pub name: String,
    pub products: Vec<ProductView>,
}

fn views<'a>(products: impl IntoIterator<Item = &'a Product>, ticker: &PriceTicker) -> Vec<ProductView> {
    products
        .into_iter()
        .map(|p| ProductView::new(p, ticker))
        .collect()
}

/// List category summaries.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Json<Vec<CategorySummary>> {
    Json(
        state
            .catalog()
            .all_categories()
            .iter()
            .map(CategorySummary::from)
            .collect(),
    )
}

/// List a category's products. Unknown categories are empty, not an error.
#[instrument(skip(state))]
pub async fn category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<CategoryView> {
    let catalog = state.catalog();
    let name = catalog
        .category(&name)
        .map_or(name, |c| c.name.clone());
    let products = views(catalog.products_by_category(&name), state.ticker());
    Json(CategoryView { name, products })
}

/// List every product.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Vec<ProductView>> {
    Json(views(state.catalog().all_products(), state.ticker()))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>> {
    let id: ProductId = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid product id: {id}")))?;
    let product = state
        .catalog()
        .find_product(id)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(ProductView::new(product, state.ticker())))
}
