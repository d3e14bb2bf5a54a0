//! Shopping cart lines and the pure mutation logic over them.
//!
//! A [`Cart`] holds at most one [`CartLine`] per product. Adding a product
//! that is already present increases that line's quantity instead of creating
//! a second line. Persistence is not handled here; see the storefront's cart
//! store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;
use super::price::Price;
use super::product::Product;

/// Errors rejected by cart mutations. The cart is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Quantities must be at least one.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// The line's quantity would no longer fit in a `u32`.
    #[error("quantity for product {id} would exceed {max}")]
    QuantityOverflow { id: ProductId, max: u32 },

    /// Prices below zero never enter the cart.
    #[error("product {id} has a negative price")]
    NegativePrice { id: ProductId },

    /// The cart total would no longer be representable.
    #[error("cart total would overflow with product {id}")]
    TotalOverflow { id: ProductId },
}

/// One row in the cart.
///
/// `name`, `usd_price` and `image` are a snapshot of the product taken when
/// the line was created; they are not re-synced with the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub usd_price: Decimal,
    pub image: String,
    pub quantity: u32,
}

impl CartLine {
    /// Snapshot a product into a new line.
    #[must_use]
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            usd_price: product.usd_price,
            image: product.image.clone(),
            quantity,
        }
    }

    /// Unit price times quantity, unrounded.
    ///
    /// Lines held by a [`Cart`] never overflow here.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.usd_price.saturating_mul(Decimal::from(self.quantity))
    }

    fn checked_line_total(&self) -> Option<Decimal> {
        self.usd_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// The shopper's in-progress order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from lines that may not satisfy the cart invariants.
    ///
    /// Lines sharing an id are merged into the first occurrence. Lines with a
    /// zero quantity or a negative price are dropped, as is any line that
    /// would overflow its quantity or the cart total.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity == 0 || line.usd_price < Decimal::ZERO {
                continue;
            }
            let (usd_price, current) = cart
                .line(line.id)
                .map_or((line.usd_price, 0), |existing| {
                    (existing.usd_price, existing.quantity)
                });
            let Some(quantity) = current.checked_add(line.quantity) else {
                continue;
            };
            if cart.ensure_total_fits(line.id, usd_price, quantity).is_err() {
                continue;
            }
            match cart.lines.iter_mut().find(|existing| existing.id == line.id) {
                Some(existing) => existing.quantity = quantity,
                None => cart.lines.push(line),
            }
        }
        cart
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Consume the cart, returning its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn line(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Add `quantity` units of `product`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] for a zero quantity,
    /// [`CartError::NegativePrice`] for a product priced below zero,
    /// [`CartError::QuantityOverflow`] if the line quantity would overflow and
    /// [`CartError::TotalOverflow`] if the cart total would.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if product.usd_price < Decimal::ZERO {
            return Err(CartError::NegativePrice { id: product.id });
        }

        let (usd_price, current) = self
            .line(product.id)
            .map_or((product.usd_price, 0), |line| (line.usd_price, line.quantity));
        let quantity = current
            .checked_add(quantity)
            .ok_or(CartError::QuantityOverflow {
                id: product.id,
                max: u32::MAX,
            })?;
        self.ensure_total_fits(product.id, usd_price, quantity)?;

        match self.lines.iter_mut().find(|line| line.id == product.id) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(CartLine::snapshot(product, quantity)),
        }
        Ok(())
    }

    /// Set the quantity of an existing line. Zero removes the line.
    ///
    /// Returns `Ok(false)` if no line exists for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalOverflow`] if the cart total would overflow;
    /// the cart is unchanged.
    pub fn set_quantity(&mut self, id: ProductId, quantity: u32) -> Result<bool, CartError> {
        if quantity == 0 {
            return Ok(self.remove(id));
        }
        let Some(usd_price) = self.line(id).map(|line| line.usd_price) else {
            return Ok(false);
        };
        self.ensure_total_fits(id, usd_price, quantity)?;
        if let Some(line) = self.lines.iter_mut().find(|line| line.id == id) {
            line.quantity = quantity;
        }
        Ok(true)
    }

    /// Remove the line for `id`. Returns `false` if there was none.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Exact sum of `usd_price * quantity` over all lines.
    ///
    /// Mutations keep this representable, so the saturating adds never clamp.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .fold(Decimal::ZERO, |total, line| total.saturating_add(line.line_total()))
    }

    /// Check that the line for `id` at `usd_price` x `quantity`, together with
    /// every other line, has a representable total.
    fn ensure_total_fits(
        &self,
        id: ProductId,
        usd_price: Decimal,
        quantity: u32,
    ) -> Result<(), CartError> {
        self.lines
            .iter()
            .filter(|line| line.id != id)
            .try_fold(Decimal::ZERO, |total, line| {
                total.checked_add(line.checked_line_total()?)
            })
            .and_then(|others| {
                others.checked_add(usd_price.checked_mul(Decimal::from(quantity))?)
            })
            .map(|_| ())
            .ok_or(CartError::TotalOverflow { id })
    }

    /// [`Cart::total`] as a USD price, for display.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        Price::usd(self.total())
    }
}
