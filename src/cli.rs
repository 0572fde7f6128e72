//! This module implements the CLI interface for shoplist: command parsing,
//! argument validation and the async entrypoint shared by `main` and tests.
//!
//! All pipeline logic lives in the library modules ([`crate::aggregate`],
//! [`crate::render`], [`crate::shopping_list`]); this module only wires config,
//! store and service together and prints results.
//!
//! ## How To Use
//! - For command-line users: run the `shoplist` binary with `--help`.
//! - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::contract::{RecipeStore, UserId};
use crate::load_config::load_config;
use crate::shopping_list::ShoppingListService;
use crate::store::MemoryStore;

/// CLI for shoplist: aggregate a user's shopping cart and export it as a PDF.
#[derive(Parser)]
#[clap(
    name = "shoplist",
    version,
    about = "Aggregate recipe ingredients in a shopping cart and export the shopping list as PDF"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the user's shopping list to a PDF file
    Download {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Id of the user whose cart is exported
        #[clap(long)]
        user: UserId,
        /// Output path; defaults to the configured filename
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Print the merged shopping list of a user
    List {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        #[clap(long)]
        user: UserId,
        /// Print JSON instead of text lines
        #[clap(long)]
        json: bool,
    },
    /// Print ingredients whose name starts with a prefix
    Ingredients {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        #[clap(long, default_value = "")]
        prefix: String,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Download {
            config,
            user,
            output,
        } => {
            let config = load_config(config)?;
            let store = MemoryStore::load(&config.store.fixture)
                .with_context(|| format!("loading fixture {}", config.store.fixture.display()))?;
            let service = ShoppingListService::from_config(&config)?;
            tracing::info!(command = "download", user, "Exporting shopping list");

            let download = service.download(&store, user).await?;
            let output = output.unwrap_or_else(|| PathBuf::from(&download.filename));
            std::fs::write(&output, &download.content)
                .with_context(|| format!("writing {}", output.display()))?;

            tracing::info!(
                command = "download",
                path = %output.display(),
                size = download.content.len(),
                "Shopping list written"
            );
            println!(
                "Wrote {} ({} lines, {} bytes) to {}",
                download.filename,
                download.lines,
                download.content.len(),
                output.display()
            );
            Ok(())
        }
        Commands::List { config, user, json } => {
            let config = load_config(config)?;
            let store = MemoryStore::load(&config.store.fixture)
                .with_context(|| format!("loading fixture {}", config.store.fixture.display()))?;
            let service = ShoppingListService::from_config(&config)?;
            let aggregation = service.aggregator().aggregate(&store, user).await?;
            tracing::info!(command = "list", user, lines = aggregation.lines.len(), "Listing shopping list");

            if json {
                println!("{}", serde_json::to_string_pretty(&aggregation.lines)?);
            } else {
                for line in &aggregation.lines {
                    println!("{}", line.display_text());
                }
            }
            for orphan in &aggregation.orphaned {
                eprintln!("[WARN] {orphan}");
            }
            Ok(())
        }
        Commands::Ingredients { config, prefix } => {
            let config = load_config(config)?;
            let store = MemoryStore::load(&config.store.fixture)
                .with_context(|| format!("loading fixture {}", config.store.fixture.display()))?;
            let found = store
                .search_ingredients(&prefix)
                .await
                .map_err(|e| anyhow::anyhow!("ingredient search failed: {e}"))?;
            tracing::info!(command = "ingredients", prefix = %prefix, found = found.len(), "Ingredient search");
            for ingredient in found {
                println!("{}\t{} ({})", ingredient.id, ingredient.name, ingredient.measurement_unit);
            }
            Ok(())
        }
    }
}
