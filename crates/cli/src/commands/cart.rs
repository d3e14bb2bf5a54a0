//! Cart management commands.
//!
//! Unlike the server, the CLI treats a failed save as an error: there is no
//! in-memory session for the change to survive in.

use std::io::Write;
use std::sync::Arc;

use cartoon_cart_core::{Price, ProductId};
use cartoon_cart_storefront::cart::{CartStore, CartUpdate};
use cartoon_cart_storefront::catalog::Catalog;
use cartoon_cart_storefront::config::StorefrontConfig;
use cartoon_cart_storefront::storage::{FileStorage, StorageError};

use super::CommandError;

/// Open the cart persisted in the configured data directory.
///
/// # Errors
///
/// Returns `StorageError` if the data directory cannot be created.
pub fn open(config: &StorefrontConfig) -> Result<CartStore, StorageError> {
    let storage = FileStorage::open(&config.data_dir)?;
    Ok(CartStore::open(Arc::new(storage)))
}

fn saved(update: CartUpdate) -> Result<(), CommandError> {
    match update.warning {
        Some(e) => Err(CommandError::NotSaved(e)),
        None => Ok(()),
    }
}

/// Add `quantity` units of a catalog product.
///
/// # Errors
///
/// Returns `CommandError` for unknown products, rejected quantities or a
/// failed save.
pub fn add(store: &mut CartStore, id: ProductId, quantity: u32) -> Result<(), CommandError> {
    let catalog = Catalog::builtin()?;
    let product = catalog
        .find_product(id)
        .ok_or(CommandError::UnknownProduct(id))?;
    saved(store.add_item(product, quantity)?)
}

/// Set a line's quantity; zero removes it.
///
/// # Errors
///
/// Returns `CommandError::Cart` if the quantity is rejected, or
/// `CommandError::NotSaved` if the change could not be persisted.
pub fn update(store: &mut CartStore, id: ProductId, quantity: u32) -> Result<(), CommandError> {
    saved(store.set_quantity(id, quantity)?)
}

/// Remove a line.
///
/// # Errors
///
/// Returns `CommandError::NotSaved` if the change could not be persisted.
pub fn remove(store: &mut CartStore, id: ProductId) -> Result<(), CommandError> {
    saved(store.remove_item(id))
}

/// Empty the cart.
///
/// # Errors
///
/// Returns `CommandError::NotSaved` if the change could not be persisted.
pub fn clear(store: &mut CartStore) -> Result<(), CommandError> {
    saved(store.clear())
}

/// Print lines and totals.
///
/// # Errors
///
/// Returns `CommandError::Io` if output fails.
pub fn print(out: &mut impl Write, store: &CartStore) -> Result<(), CommandError> {
    if store.lines().is_empty() {
        writeln!(out, "Cart is empty")?;
        return Ok(());
    }

    for line in store.lines() {
        writeln!(
            out,
            "{:>4}  {:<28} {:>4} x {:>8} = {:>9}",
            line.id,
            line.name,
            line.quantity,
            Price::usd(line.usd_price).to_string(),
            Price::usd(line.line_total()).to_string(),
        )?;
    }
    writeln!(
        out,
        "Total: {} ({} items)",
        Price::usd(store.total()),
        store.item_count()
    )?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartoon_cart_core::CartError;
    use cartoon_cart_storefront::storage::{MemoryStorage, Storage};

    use super::*;

    fn store() -> CartStore {
        CartStore::open(Arc::new(MemoryStorage::new()))
    }

    fn printed(store: &CartStore) -> String {
        let mut buf = Vec::new();
        print(&mut buf, store).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(printed(&store()), "Cart is empty\n");
    }

    #[test]
    fn test_add_update_remove() {
        let mut store = store();
        add(&mut store, ProductId::new(6), 2).unwrap();
        add(&mut store, ProductId::new(6), 1).unwrap();

        let text = printed(&store);
        assert!(text.contains("Apple"));
        assert!(text.contains("Total: $2.97 (3 items)"));

        update(&mut store, ProductId::new(6), 1).unwrap();
        assert_eq!(store.item_count(), 1);

        remove(&mut store, ProductId::new(6)).unwrap();
        assert!(store.lines().is_empty());
    }

    #[test]
    fn test_add_unknown_product() {
        let err = add(&mut store(), ProductId::new(999), 1).unwrap_err();
        assert!(matches!(err, CommandError::UnknownProduct(_)));
    }

    #[test]
    fn test_add_zero_quantity() {
        let err = add(&mut store(), ProductId::new(6), 0).unwrap_err();
        assert!(matches!(err, CommandError::Cart(CartError::ZeroQuantity)));
    }

    #[test]
    fn test_failed_save_is_error() {
        let mut store = CartStore::open(Arc::new(MemoryStorage::with_quota(8)));
        let err = add(&mut store, ProductId::new(6), 1).unwrap_err();
        assert!(matches!(err, CommandError::NotSaved(_)));
    }

    #[test]
    fn test_open_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().into_owned();
        let config = StorefrontConfig::from_lookup(|key| {
            (key == "STOREFRONT_DATA_DIR").then(|| data_dir.clone())
        })
        .unwrap();

        let mut store = open(&config).unwrap();
        add(&mut store, ProductId::new(1), 1).unwrap();
        clear(&mut store).unwrap();
        add(&mut store, ProductId::new(2), 3).unwrap();

        let reopened = open(&config).unwrap();
        assert_eq!(reopened.lines(), store.lines());

        let storage = FileStorage::open(dir.path()).unwrap();
        assert!(storage.get("cart").unwrap().is_some());
    }
}
