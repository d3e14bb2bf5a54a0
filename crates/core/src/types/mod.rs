//! Core types for CartoonCart.
//!
//! This module provides type-safe wrappers for catalog and cart concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use cart::{Cart, CartError, CartLine};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::{Category, Nutrition, Product};
pub use status::Availability;
