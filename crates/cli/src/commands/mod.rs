//! Subcommand implementations.
//!
//! Each command writes its output to the given writer so it can be exercised
//! in tests without touching stdout.

use cartoon_cart_core::{CartError, ProductId};
use cartoon_cart_storefront::cart::PersistError;
use cartoon_cart_storefront::catalog::CatalogError;
use thiserror::Error;

pub mod cart;
pub mod catalog;
pub mod price;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no product with id {0}")]
    UnknownProduct(ProductId),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("cart change was not saved: {0}")]
    NotSaved(#[from] PersistError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}
