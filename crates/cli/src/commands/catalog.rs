//! Catalog browsing commands.

use std::io::Write;

use cartoon_cart_core::{Product, ProductId};
use cartoon_cart_storefront::catalog::Catalog;

use super::CommandError;

fn product_row(out: &mut impl Write, product: &Product) -> std::io::Result<()> {
    writeln!(
        out,
        "{:>4}  {:<28} {:>8}",
        product.id,
        product.name,
        product.price().to_string()
    )
}

/// List categories, or the products of `category`.
///
/// # Errors
///
/// Returns `CommandError` if the catalog fails to load or output fails.
pub fn list(out: &mut impl Write, category: Option<&str>) -> Result<(), CommandError> {
    let catalog = Catalog::builtin()?;

    let Some(name) = category else {
        for category in catalog.all_categories() {
            writeln!(
                out,
                "{:<20} {:<16} {} products",
                category.name,
                category.slug,
                category.products.len()
            )?;
        }
        return Ok(());
    };

    let products = catalog.products_by_category(name);
    if products.is_empty() {
        writeln!(out, "No products in category {name:?}")?;
    }
    for product in products {
        product_row(out, product)?;
    }
    Ok(())
}

/// Show one product in detail.
///
/// # Errors
///
/// Returns `CommandError::UnknownProduct` if no product has the id.
pub fn show(out: &mut impl Write, id: ProductId) -> Result<(), CommandError> {
    let catalog = Catalog::builtin()?;
    let product = catalog
        .find_product(id)
        .ok_or(CommandError::UnknownProduct(id))?;

    product_row(out, product)?;
    if let Some(category) = catalog.category_of(id) {
        writeln!(out, "      category: {}", category.name)?;
    }
    writeln!(out, "      availability: {}", product.availability.label())?;
    if let Some(description) = &product.description {
        writeln!(out, "      {description}")?;
    }
    if let Some(nutrition) = &product.nutrition {
        writeln!(
            out,
            "      {} kcal, protein {}, carbs {}, fat {}",
            nutrition.calories, nutrition.protein, nutrition.carbs, nutrition.fat
        )?;
    }
    Ok(())
}
