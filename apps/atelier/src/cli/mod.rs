//! # Atelier CLI Module
//!
//! This module implements the CLI interface for Atelier.
//!
//! ## Available Commands
//!
//! - `status` - Show workshop status
//! - `stock` - Manage component stock (list/add/adjust/threshold/delete)
//! - `product` - Manage the product catalog (list/define/require/remove)
//! - `buildable` - Show how many units are buildable from current stock
//! - `assemble` - Build finished units, consuming components
//! - `plan` - Show the production plan grouped by color
//! - `order` - Manage client orders (create/list/show/delete)
//! - `start-batch` / `complete-batch` - Drive the production workflow
//! - `ship` / `cancel` - Close out an order
//! - `export` / `import` - Snapshot the full workshop state to/from a file
//! - `init` - Initialize a new database

mod commands;

use crate::config::AppConfig;
use atelier_core::AtelierError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Atelier - Workshop Inventory
///
/// A deterministic inventory and production core for small workshops.
/// Stock, bills of materials, batches, and shipments in one ledger.
#[derive(Parser, Debug)]
#[command(name = "atelier")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the workshop database (overrides the config file)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "memory" (volatile) or "redb" (ACID database)
    #[arg(short = 'B', long, global = true, default_value = "redb")]
    pub backend: String,

    /// Output in JSON format (for programmatic access)
    #[arg(long = "json", global = true)]
    pub json_mode: bool,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show workshop status
    Status,

    /// Manage component stock
    Stock {
        #[command(subcommand)]
        action: StockCommands,
    },

    /// Manage the product catalog
    Product {
        #[command(subcommand)]
        action: ProductCommands,
    },

    /// Show how many units of a product are buildable right now
    Buildable {
        /// Product name
        #[arg(short, long)]
        product: String,

        /// Main color (omit for a per-color breakdown)
        #[arg(short, long)]
        color: Option<String>,
    },

    /// Build finished units, consuming component stock atomically
    Assemble {
        /// Product name
        #[arg(short, long)]
        product: String,

        /// Main color (omit to pick the first fully-buildable color)
        #[arg(short, long)]
        color: Option<String>,

        /// Units to build
        #[arg(short = 'n', long, default_value = "1")]
        quantity: u32,

        /// Per-component color override, as "component=Color" (repeatable)
        #[arg(short = 'o', long = "override")]
        overrides: Vec<String>,
    },

    /// Show the production plan grouped by color
    Plan {
        /// Show aggregate stats and rankings
        #[arg(short, long)]
        detailed: bool,
    },

    /// Manage client orders
    Order {
        #[command(subcommand)]
        action: OrderCommands,
    },

    /// Move queued units of a (product, color) into production
    StartBatch {
        /// Product name
        #[arg(short, long)]
        product: String,

        /// Main color
        #[arg(short, long)]
        color: String,

        /// Units to start
        #[arg(short = 'n', long)]
        quantity: u32,
    },

    /// Complete producing units, crediting finished stock
    CompleteBatch {
        /// Product name
        #[arg(short, long)]
        product: String,

        /// Main color
        #[arg(short, long)]
        color: String,

        /// Restrict completion to these order ids (repeatable; default all)
        #[arg(short, long)]
        order: Vec<String>,
    },

    /// Ship a fully-produced order, claiming its finished stock
    Ship {
        /// Order id
        #[arg(short, long)]
        order: String,
    },

    /// Cancel an order, returning produced units to finished stock
    Cancel {
        /// Order id
        #[arg(short, long)]
        order: String,
    },

    /// Export the full workshop state to a snapshot file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import workshop state from a snapshot file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },
}

/// Component stock subcommands.
#[derive(Subcommand, Debug)]
pub enum StockCommands {
    /// List component stock
    List {
        /// Only show lines below their alert threshold
        #[arg(short, long)]
        low: bool,
    },

    /// Create a component entry or add stock to an existing one
    Add {
        /// Component name
        #[arg(short = 'm', long)]
        component: String,

        /// Component color
        #[arg(short, long)]
        color: String,

        /// Units to add
        #[arg(short = 'n', long)]
        quantity: u32,

        /// Alert threshold (defaults to the configured value)
        #[arg(short, long)]
        threshold: Option<u32>,
    },

    /// Apply a signed stock adjustment
    Adjust {
        /// Component name
        #[arg(short = 'm', long)]
        component: String,

        /// Component color
        #[arg(short, long)]
        color: String,

        /// Signed adjustment (negative removes stock)
        #[arg(short, long, allow_hyphen_values = true)]
        delta: i64,
    },

    /// Set the alert threshold for a component color
    Threshold {
        /// Component name
        #[arg(short = 'm', long)]
        component: String,

        /// Component color
        #[arg(short, long)]
        color: String,

        /// New threshold
        #[arg(short, long)]
        threshold: u32,
    },

    /// Delete a component color, or every color of a component
    Delete {
        /// Component name
        #[arg(short = 'm', long)]
        component: String,

        /// Component color (omit to delete all colors)
        #[arg(short, long)]
        color: Option<String>,
    },
}

/// Product catalog subcommands.
#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// List product definitions
    List,

    /// Create or replace a product definition
    Define {
        /// Product name
        #[arg(short, long)]
        name: String,

        /// Free-form description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Add or update a component requirement on a product
    Require {
        /// Product name
        #[arg(short, long)]
        product: String,

        /// Component name
        #[arg(short = 'm', long)]
        component: String,

        /// Units consumed per finished unit
        #[arg(short = 'n', long, default_value = "1")]
        quantity: u32,

        /// Always consume this fixed color
        #[arg(short, long, conflicts_with_all = ["same_as", "same_as_main"])]
        color: Option<String>,

        /// Always match the color resolved for another component
        #[arg(long, conflicts_with = "same_as_main")]
        same_as: Option<String>,

        /// Always match the build's main color (no override allowed)
        #[arg(long)]
        same_as_main: bool,
    },

    /// Remove a component requirement from a product
    Remove {
        /// Product name
        #[arg(short, long)]
        product: String,

        /// Component name
        #[arg(short = 'm', long)]
        component: String,
    },
}

/// Order subcommands.
#[derive(Subcommand, Debug)]
pub enum OrderCommands {
    /// Create an order from item lines
    Create {
        /// Order id
        #[arg(long)]
        id: String,

        /// Order date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Client name
        #[arg(long)]
        client: String,

        /// Client email
        #[arg(short, long, default_value = "")]
        email: String,

        /// Item line, as "product:color:quantity" (repeatable)
        #[arg(short, long)]
        item: Vec<String>,
    },

    /// List orders
    List,

    /// Show one order with its items
    Show {
        /// Order id
        #[arg(long)]
        id: String,
    },

    /// Delete an order
    Delete {
        /// Order id
        #[arg(long)]
        id: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), AtelierError> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let database = cli
        .database
        .clone()
        .or_else(|| config.database.clone())
        .unwrap_or_else(|| PathBuf::from("atelier.db"));
    let backend = cli.backend.as_str();
    let json_mode = cli.json_mode;

    if cli.verbose {
        tracing::info!(
            "database: {:?}, backend: {}, config: {:?}",
            database,
            backend,
            cli.config
        );
    }

    match cli.command {
        Some(Commands::Status) => cmd_status(&database, backend, json_mode),
        Some(Commands::Stock { action }) => match action {
            StockCommands::List { low } => cmd_stock_list(&database, backend, json_mode, low),
            StockCommands::Add {
                component,
                color,
                quantity,
                threshold,
            } => cmd_stock_add(
                &database,
                backend,
                json_mode,
                &config,
                &component,
                &color,
                quantity,
                threshold,
            ),
            StockCommands::Adjust {
                component,
                color,
                delta,
            } => cmd_stock_adjust(&database, backend, json_mode, &component, &color, delta),
            StockCommands::Threshold {
                component,
                color,
                threshold,
            } => cmd_stock_threshold(&database, backend, json_mode, &component, &color, threshold),
            StockCommands::Delete { component, color } => {
                cmd_stock_delete(&database, backend, json_mode, &component, color.as_deref())
            }
        },
        Some(Commands::Product { action }) => match action {
            ProductCommands::List => cmd_product_list(&database, backend, json_mode),
            ProductCommands::Define { name, description } => {
                cmd_product_define(&database, backend, json_mode, &name, &description)
            }
            ProductCommands::Require {
                product,
                component,
                quantity,
                color,
                same_as,
                same_as_main,
            } => cmd_product_require(
                &database,
                backend,
                json_mode,
                &product,
                &component,
                quantity,
                color.as_deref(),
                same_as.as_deref(),
                same_as_main,
            ),
            ProductCommands::Remove { product, component } => {
                cmd_product_remove(&database, backend, json_mode, &product, &component)
            }
        },
        Some(Commands::Buildable { product, color }) => {
            cmd_buildable(&database, backend, json_mode, &product, color.as_deref())
        }
        Some(Commands::Assemble {
            product,
            color,
            quantity,
            overrides,
        }) => cmd_assemble(
            &database,
            backend,
            json_mode,
            &product,
            color.as_deref(),
            quantity,
            &overrides,
        ),
        Some(Commands::Plan { detailed }) => cmd_plan(&database, backend, json_mode, detailed),
        Some(Commands::Order { action }) => match action {
            OrderCommands::Create {
                id,
                date,
                client,
                email,
                item,
            } => cmd_order_create(
                &database, backend, json_mode, &id, &date, &client, &email, &item,
            ),
            OrderCommands::List => cmd_order_list(&database, backend, json_mode),
            OrderCommands::Show { id } => cmd_order_show(&database, backend, json_mode, &id),
            OrderCommands::Delete { id } => cmd_order_delete(&database, backend, json_mode, &id),
        },
        Some(Commands::StartBatch {
            product,
            color,
            quantity,
        }) => cmd_start_batch(&database, backend, json_mode, &product, &color, quantity),
        Some(Commands::CompleteBatch {
            product,
            color,
            order,
        }) => cmd_complete_batch(&database, backend, json_mode, &product, &color, &order),
        Some(Commands::Ship { order }) => cmd_ship(&database, backend, json_mode, &order),
        Some(Commands::Cancel { order }) => cmd_cancel(&database, backend, json_mode, &order),
        Some(Commands::Export { output }) => cmd_export(&database, backend, &output),
        Some(Commands::Import { input }) => cmd_import(&database, backend, &input),
        Some(Commands::Init { force }) => cmd_init(&database, backend, force),
        None => {
            // No subcommand - show status by default
            cmd_status(&database, backend, json_mode)
        }
    }
}
