//! Home page and price ticker handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::routes::products::{CategorySummary, ProductView};
use crate::services::account::UserProfile;
use crate::services::price_feed::{PriceTicker, Quote};
use crate::state::AppState;

/// Header price display.
#[derive(Debug, Clone, Serialize)]
pub struct TickerView {
    /// `1 SOL = $145.32`, or `1 SOL = ...` before the first quote.
    pub label: String,
    pub quote: Option<Quote>,
}

impl From<&PriceTicker> for TickerView {
    fn from(ticker: &PriceTicker) -> Self {
        Self {
            label: ticker.label(),
            quote: ticker.current(),
        }
    }
}

/// Home page data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    pub featured: Vec<ProductView>,
    pub categories: Vec<CategorySummary>,
    pub ticker: TickerView,
    pub cart_count: u64,
    pub user: Option<UserProfile>,
}

/// Home page. The first visit of a session is reported to the visit counter.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Json<HomeView> {
    state.visits().track_once();

    let catalog = state.catalog();
    let ticker = state.ticker();
    Json(HomeView {
        featured: catalog
            .featured_products()
            .into_iter()
            .map(|p| ProductView::new(p, ticker))
            .collect(),
        categories: catalog
            .all_categories()
            .iter()
            .map(CategorySummary::from)
            .collect(),
        ticker: TickerView::from(ticker),
        cart_count: state.cart().item_count(),
        user: state.account().current_user(),
    })
}

/// Current SOL/USD quote.
#[instrument(skip(state))]
pub async fn ticker(State(state): State<AppState>) -> Json<TickerView> {
    Json(TickerView::from(state.ticker()))
}
