//! Catalog records: products and the categories that partition them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;
use super::status::Availability;

/// A product offered by the store.
///
/// Products are immutable for the lifetime of the catalog. Everything other
/// than `id`, `name`, `image` and `usd_price` is display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Opaque image reference (URL or asset path).
    pub image: String,
    /// Unit price in US dollars.
    #[serde(with = "rust_decimal::serde::float")]
    pub usd_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<String>,
}

impl Product {
    /// Unit price as a USD [`Price`].
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::usd(self.usd_price)
    }
}

/// Nutrition facts per serving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: u32,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
}

/// A named group of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Lowercase route segment (e.g. `bakery`).
    pub slug: String,
    pub image: String,
    pub products: Vec<Product>,
}

impl Category {
    /// Whether `name` refers to this category, by display name or slug.
    ///
    /// Matching is ASCII case-insensitive.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        self.name.eq_ignore_ascii_case(name) || self.slug.eq_ignore_ascii_case(name)
    }
}
