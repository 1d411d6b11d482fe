//! Kenzy CLI - Cart and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart stored in ./data
//! kenzy cart show
//!
//! # Add two of a product (looked up in the Firestore catalog)
//! kenzy cart add av1 -q 2
//!
//! # Set a quantity; zero or less removes the line
//! kenzy cart set av1 3
//!
//! # List catalog products under GHS 100 matching "round"
//! kenzy catalog list --query round --price 0-100
//!
//! # Check a product form before it goes to the catalog
//! kenzy catalog check-draft draft.json
//! ```
//!
//! # Commands
//!
//! - `cart` - Inspect and change the persisted cart
//! - `catalog` - List and summarize the product catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "kenzy")]
#[command(author, version, about = "Kenzy Specs CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and change the persisted cart
    Cart {
        /// Directory holding kenzyCart.json
        #[arg(long, default_value = "data")]
        cart_dir: PathBuf,

        #[command(subcommand)]
        action: CartAction,
    },
    /// Read the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show lines and total
    Show,
    /// Add a catalog product
    Add {
        /// Product ID
        product_id: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (zero or less removes it)
    Set {
        /// Product ID
        product_id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Decrement a line by one
    Remove {
        /// Product ID
        product_id: String,
    },
    /// Remove a line entirely
    Delete {
        /// Product ID
        product_id: String,
    },
    /// Empty the cart
    Clear,
    /// Place the order and empty the cart
    Checkout,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products, optionally filtered
    List {
        /// Free-text search over name, description and category
        #[arg(short, long)]
        query: Option<String>,

        /// Price bucket (`0-100`, `100-200`, `200+`)
        #[arg(short, long)]
        price: Option<String>,

        /// Exact category
        #[arg(short, long)]
        category: Option<String>,

        /// Listing status (`all`, `active`, `inactive`)
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Show stock counts
    Summary,
    /// Validate a product form saved as JSON
    CheckDraft {
        /// Path to the draft (`name`, `price`, `stock`, `image`, `category`)
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { cart_dir, action } => match action {
            CartAction::Show => commands::cart::show(&cart_dir)?,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&cart_dir, &product_id, quantity).await?,
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(&cart_dir, &product_id, quantity)?,
            CartAction::Remove { product_id } => commands::cart::remove(&cart_dir, &product_id)?,
            CartAction::Delete { product_id } => commands::cart::delete(&cart_dir, &product_id)?,
            CartAction::Clear => commands::cart::clear(&cart_dir)?,
            CartAction::Checkout => commands::cart::checkout(&cart_dir)?,
        },
        Commands::Catalog { action } => match action {
            CatalogAction::List {
                query,
                price,
                category,
                status,
            } => {
                commands::catalog::list(
                    query.as_deref(),
                    price.as_deref(),
                    category.as_deref(),
                    status.as_deref(),
                )
                .await?;
            }
            CatalogAction::Summary => commands::catalog::summary().await?,
            CatalogAction::CheckDraft { path } => commands::catalog::check_draft(&path)?,
        },
    }
    Ok(())
}
