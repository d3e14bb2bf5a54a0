//! Static, read-only product catalog.
//!
//! The catalog ships inside the binary (`data/catalog.json`) and is validated
//! once at startup. Nothing mutates it afterwards.

use std::collections::HashMap;

use cartoon_cart_core::{Category, Product, ProductId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Catalog bundled with the storefront.
static BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Home page selection: (category, how many of its leading products).
const FEATURED_SELECTION: &[(&str, usize)] = &[("Bakery", 2), ("Dairy", 1), ("Snacks", 1)];

/// Maximum number of featured products shown on the home page.
const FEATURED_LIMIT: usize = 4;

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("product id {id} appears in both {first} and {second}")]
    DuplicateProductId {
        id: ProductId,
        first: String,
        second: String,
    },

    #[error("product {id} has a negative price")]
    NegativePrice { id: ProductId },

    #[error("category names must not be empty")]
    EmptyCategoryName,
}

/// Categories and products, indexed by product id.
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<Category>,
    /// Product id -> (category index, product index).
    index: HashMap<ProductId, (usize, usize)>,
}

impl Catalog {
    /// Load the catalog bundled with the storefront.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the bundled data fails validation.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the JSON is malformed or violates catalog
    /// invariants.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let categories: Vec<Category> = serde_json::from_str(json)?;
        Self::new(categories)
    }

    /// Build a catalog from categories.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if a product id is repeated (categories must
    /// partition the catalog), a price is negative, or a category is unnamed.
    pub fn new(categories: Vec<Category>) -> Result<Self, CatalogError> {
        let mut index: HashMap<ProductId, (usize, usize)> = HashMap::new();

        for (ci, category) in categories.iter().enumerate() {
            if category.name.trim().is_empty() {
                return Err(CatalogError::EmptyCategoryName);
            }
            for (pi, product) in category.products.iter().enumerate() {
                if product.usd_price < Decimal::ZERO {
                    return Err(CatalogError::NegativePrice { id: product.id });
                }
                if let Some(&(first, _)) = index.get(&product.id) {
                    return Err(CatalogError::DuplicateProductId {
                        id: product.id,
                        first: categories
                            .get(first)
                            .map_or_else(String::new, |c| c.name.clone()),
                        second: category.name.clone(),
                    });
                }
                index.insert(product.id, (ci, pi));
            }
        }

        Ok(Self { categories, index })
    }

    /// All categories in catalog order.
    #[must_use]
    pub fn all_categories(&self) -> &[Category] {
        &self.categories
    }

    /// The category matching `name` (display name or slug, case-insensitive).
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.matches(name))
    }

    /// Products of a category; empty if no category matches.
    #[must_use]
    pub fn products_by_category(&self, name: &str) -> &[Product] {
        match self.category(name) {
            Some(category) => &category.products,
            None => &[],
        }
    }

    /// Every product, in category order then in-category order.
    pub fn all_products(&self) -> impl Iterator<Item = &Product> {
        self.categories.iter().flat_map(|c| c.products.iter())
    }

    /// Look up a product by id.
    #[must_use]
    pub fn find_product(&self, id: ProductId) -> Option<&Product> {
        let &(ci, pi) = self.index.get(&id)?;
        self.categories.get(ci)?.products.get(pi)
    }

    /// The category owning a product.
    #[must_use]
    pub fn category_of(&self, id: ProductId) -> Option<&Category> {
        let &(ci, _) = self.index.get(&id)?;
        self.categories.get(ci)
    }

    /// Products highlighted on the home page.
    #[must_use]
    pub fn featured_products(&self) -> Vec<&Product> {
        FEATURED_SELECTION
            .iter()
            .flat_map(|&(name, take)| self.products_by_category(name).iter().take(take))
            .take(FEATURED_LIMIT)
            .collect()
    }

    /// Number of products across all categories.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.index.len()
    }
}
