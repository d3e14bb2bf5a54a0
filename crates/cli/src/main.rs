//! CartoonCart CLI - catalog browsing and cart management.
//!
//! Operates on the same data directory as the storefront server
//! (`STOREFRONT_DATA_DIR`), so a cart edited here shows up in the browser
//! session and vice versa. Avoid editing the cart while the server runs; the
//! server only reads persisted state at startup.
//!
//! # Usage
//!
//! ```bash
//! # List categories, or the products of one category
//! cc-cli catalog
//! cc-cli catalog --category bakery
//!
//! # Show a product
//! cc-cli product 6
//!
//! # Manage the persisted cart
//! cc-cli cart show
//! cc-cli cart add 6 -q 2
//! cc-cli cart update 6 5
//! cc-cli cart remove 6
//! cc-cli cart clear
//!
//! # Fetch the current SOL/USD price
//! cc-cli price
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;

use cartoon_cart_core::ProductId;
use cartoon_cart_storefront::config::StorefrontConfig;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cc-cli")]
#[command(author, version, about = "CartoonCart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List categories, or the products of one category
    Catalog {
        /// Category name or slug (case-insensitive)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show a product
    Product {
        /// Product ID
        id: ProductId,
    },
    /// Manage the persisted cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Fetch the current SOL/USD price (falls back on failure)
    Price,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product
    Add {
        /// Product ID
        id: ProductId,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Update {
        /// Product ID
        id: ProductId,

        /// New quantity
        quantity: u32,
    },
    /// Remove a line
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    // Initialize tracing (to stderr, so command output stays clean)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Catalog { category } => {
            commands::catalog::list(&mut out, category.as_deref())?;
        }
        Commands::Product { id } => commands::catalog::show(&mut out, id)?,
        Commands::Cart { action } => {
            let mut store = commands::cart::open(&config)?;
            match action {
                CartAction::Show => {}
                CartAction::Add { id, quantity } => commands::cart::add(&mut store, id, quantity)?,
                CartAction::Update { id, quantity } => {
                    commands::cart::update(&mut store, id, quantity)?;
                }
                CartAction::Remove { id } => commands::cart::remove(&mut store, id)?,
                CartAction::Clear => commands::cart::clear(&mut store)?,
            }
            commands::cart::print(&mut out, &store)?;
        }
        Commands::Price => commands::price::fetch(&mut out, &config).await?,
    }

    out.flush()?;
    Ok(())
}
