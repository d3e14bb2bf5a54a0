//! Persistent cart store.
//!
//! Wraps the pure [`Cart`] with load/save against a [`Storage`] backend. The
//! cart is stored as a JSON array of lines under [`keys::CART`].
//!
//! Persistence is fail-soft in both directions:
//! - a missing or unreadable value loads as an empty cart
//! - a failed save is returned to the caller as a warning next to the new
//!   state; the in-memory cart stays authoritative

use std::sync::Arc;

use cartoon_cart_core::{Cart, CartError, CartLine, Product, ProductId};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::storage::{Storage, StorageError, keys};

/// Quantity used when a caller does not specify one.
pub const DEFAULT_QUANTITY: u32 = 1;

/// Why a cart mutation could not be persisted.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result of a cart mutation: the new lines plus any persistence warning.
#[derive(Debug)]
#[must_use]
pub struct CartUpdate {
    pub lines: Vec<CartLine>,
    pub warning: Option<PersistError>,
}

impl CartUpdate {
    /// Whether the new state reached storage.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.warning.is_none()
    }
}

/// The shopper's cart, synchronized to storage on every mutation.
pub struct CartStore {
    cart: Cart,
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Open the store, loading any persisted cart.
    #[must_use]
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let cart = read_persisted(storage.as_ref());
        Self { cart, storage }
    }

    /// Reload the cart from storage, discarding in-memory state.
    ///
    /// Never fails: an absent or malformed value yields an empty cart.
    pub fn load(&mut self) -> Vec<CartLine> {
        self.cart = read_persisted(self.storage.as_ref());
        self.cart.lines().to_vec()
    }

    /// Current lines.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    /// The underlying cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Add `quantity` units of `product`, then persist.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the quantity is rejected; the cart and storage
    /// are untouched in that case.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<CartUpdate, CartError> {
        self.cart.add(product, quantity)?;
        debug!(quantity, "added to cart");
        Ok(self.persist())
    }

    /// Set a line's quantity (zero removes it), then persist.
    ///
    /// Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart total would overflow; the cart and
    /// storage are untouched in that case.
    #[instrument(skip(self))]
    pub fn set_quantity(&mut self, id: ProductId, quantity: u32) -> Result<CartUpdate, CartError> {
        if !self.cart.set_quantity(id, quantity)? {
            debug!("no cart line to update");
        }
        Ok(self.persist())
    }

    /// Remove the line for `id`, then persist. Unknown ids are a no-op.
    #[instrument(skip(self))]
    pub fn remove_item(&mut self, id: ProductId) -> CartUpdate {
        if !self.cart.remove(id) {
            debug!("no cart line to remove");
        }
        self.persist()
    }

    /// Empty the cart, then persist.
    #[instrument(skip(self))]
    pub fn clear(&mut self) -> CartUpdate {
        self.cart.clear();
        self.persist()
    }

    /// Exact cart total in USD. Round only for display.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.cart.total()
    }

    /// Total units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    fn persist(&self) -> CartUpdate {
        let warning = self.save().err();
        if let Some(err) = &warning {
            warn!(error = %err, "cart not persisted, keeping in-memory state");
        }
        CartUpdate {
            lines: self.cart.lines().to_vec(),
            warning,
        }
    }

    fn save(&self) -> Result<(), PersistError> {
        let json = serde_json::to_string(&self.cart)?;
        self.storage.set(keys::CART, &json)?;
        Ok(())
    }
}

/// Read the persisted cart, treating every failure as "no cart".
fn read_persisted(storage: &dyn Storage) -> Cart {
    let raw = match storage.get(keys::CART) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Cart::new(),
        Err(e) => {
            warn!(error = %e, "failed to read persisted cart, starting empty");
            return Cart::new();
        }
    };

    let lines: Vec<CartLine> = match serde_json::from_str(&raw) {
        Ok(lines) => lines,
        Err(e) => {
            warn!(error = %e, "persisted cart is malformed, starting empty");
            return Cart::new();
        }
    };

    let cart = Cart::from_lines(lines.clone());
    if cart.lines() != lines.as_slice() {
        warn!(
            stored = lines.len(),
            kept = cart.len(),
            "persisted cart had duplicate, empty or unpriceable lines, normalized"
        );
    }
    cart
}
