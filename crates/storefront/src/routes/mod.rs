//! HTTP route handlers for storefront.
//!
//! All routes respond with JSON. Errors use `{"error": "<message>"}`.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home: featured products, categories, quote, cart count
//! GET  /ticker                 - Current SOL/USD quote
//!
//! # Catalog
//! GET  /categories             - Category summaries
//! GET  /categories/{name}      - Products of a category (empty if unknown)
//! GET  /products               - All products
//! GET  /products/{id}          - Product detail
//!
//! # Cart
//! GET  /cart                   - Cart lines and totals
//! GET  /cart/count             - Total units
//! POST /cart/add               - Add a product
//! POST /cart/update            - Set a line's quantity (0 removes)
//! POST /cart/remove            - Remove a line
//! POST /cart/clear             - Empty the cart
//!
//! # Auth
//! POST /auth/login             - Sign in
//! POST /auth/register          - Create an account
//! POST /auth/logout            - Sign out
//!
//! # Account (requires sign-in)
//! GET  /account                - Stored profile
//! POST /account/documents      - Submit documents (multipart)
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod home;
pub mod products;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRequest},
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// JSON request body whose rejections answer as [`AppError`] JSON.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Upload limit for document submissions.
const DOCUMENT_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::categories))
        .route("/{name}", get(products::category))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/", get(account::index)).route(
        "/documents",
        post(account::submit_documents).layer(DefaultBodyLimit::max(DOCUMENT_BODY_LIMIT)),
    )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/ticker", get(home::ticker))
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
}
