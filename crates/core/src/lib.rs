//! CartoonCart Core - Shared catalog and cart types.
//!
//! This crate provides the domain types used by every CartoonCart component:
//! - `storefront` - JSON storefront application and its service clients
//! - `cli` - Terminal front end over the same catalog and cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no storage,
//! no HTTP clients. Persistence of the cart lives in the storefront crate.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, catalog records and the cart itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
