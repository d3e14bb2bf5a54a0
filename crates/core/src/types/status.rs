//! Stock status shown next to a product.

use serde::{Deserialize, Serialize};

/// Product availability.
///
/// Display-only: availability never blocks adding a product to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    #[default]
    Available,
    LowStock,
}

impl Availability {
    /// Label used by listings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Available => "In stock",
            Self::LowStock => "Low stock",
        }
    }
}
