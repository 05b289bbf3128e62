//! Command-line interface definitions using clap

mod commands;

use clap::{Parser, Subcommand};

pub use commands::{generate_config, load_data};

/// Foodgram - recipe sharing backend
#[derive(Parser)]
#[command(name = "foodgram")]
#[command(version)]
#[command(about = "Recipe sharing backend with shopping lists and short links", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, short = 'c', global = true, default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Load ingredients and tags from JSON files
    ///
    /// Ingredients: [{"name": ..., "measurement_unit": ...}]
    /// Tags: [{"name": ..., "slug": ...}]
    LoadData {
        /// Ingredients JSON file
        #[arg(long)]
        ingredients: String,

        /// Tags JSON file
        #[arg(long)]
        tags: Option<String>,
    },

    /// Generate an example configuration file
    GenerateConfig {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,
    },
}
