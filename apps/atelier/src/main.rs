//! # Atelier - Workshop Inventory
//!
//! The main binary for the Atelier deterministic workshop core.
//!
//! This application provides:
//! - CLI interface for stock, catalog, and production operations
//! - TOML configuration loading
//! - Snapshot file export/import
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                apps/atelier (THE BINARY)              │
//! │                                                       │
//! │  ┌─────────────┐   ┌──────────────┐   ┌───────────┐  │
//! │  │   CLI       │   │  Config      │   │ Snapshot  │  │
//! │  │  (clap)     │   │  (toml)      │   │ file I/O  │  │
//! │  └──────┬──────┘   └──────┬───────┘   └─────┬─────┘  │
//! │         │                 │                 │        │
//! │         └─────────────────┼─────────────────┘        │
//! │                           ▼                          │
//! │                   ┌───────────────┐                  │
//! │                   │ atelier-core  │                  │
//! │                   │  (THE LOGIC)  │                  │
//! │                   └───────────────┘                  │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Stock operations
//! atelier stock add --component hinge --color Black --quantity 25
//! atelier buildable --product "Jewelry Box"
//!
//! # Production workflow
//! atelier start-batch --product "Jewelry Box" --color Red --quantity 5
//! atelier complete-batch --product "Jewelry Box" --color Red
//! atelier ship --order A-1
//! ```

mod cli;
mod config;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Initialize tracing — ATELIER_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("ATELIER_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "atelier=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Atelier startup banner.
fn print_banner() {
    println!(
        r#"
   █████╗ ████████╗███████╗██╗     ██╗███████╗██████╗
  ██╔══██╗╚══██╔══╝██╔════╝██║     ██║██╔════╝██╔══██╗
  ███████║   ██║   █████╗  ██║     ██║█████╗  ██████╔╝
  ██╔══██║   ██║   ██╔══╝  ██║     ██║██╔══╝  ██╔══██╗
  ██║  ██║   ██║   ███████╗███████╗██║███████╗██║  ██║
  ╚═╝  ╚═╝   ╚═╝   ╚══════╝╚══════╝╚═╝╚══════╝╚═╝  ╚═╝

  Workshop Inventory v{}

  Deterministic • Atomic • Auditable
"#,
        env!("CARGO_PKG_VERSION")
    );
}
