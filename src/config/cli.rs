use crate::config::toml_config::StorefrontConfig;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "storefront-cart")]
#[command(about = "Drive a storefront's cart endpoints from the terminal")]
pub struct CliConfig {
    /// Path to a TOML storefront configuration; the Australian defaults apply without one
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the storefront base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// File backing the recently-viewed list
    #[arg(long, default_value = "./storefront-state.json")]
    pub state_file: String,

    /// Emit JSON log lines instead of compact text
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show the cart item count badge
    Count,
    /// Add a variant to the cart
    Add {
        #[arg(long)]
        variant: u64,
        #[arg(long, default_value = "1")]
        quantity: String,
        /// Submit through the buy-now control (goes to checkout instead)
        #[arg(long)]
        buy_now: bool,
    },
    /// Remove a cart line (1-based)
    Remove {
        #[arg(long)]
        line: String,
    },
    /// Fetch a product for the quick-view modal
    QuickView { product_url: String },
    /// Record a product page view from its embedded product JSON file
    Track {
        product_json: String,
        #[arg(long)]
        page_path: String,
    },
    /// List recently viewed products
    Recent,
    /// Format an amount given in minor units
    Format { minor_units: i64 },
}

impl CliConfig {
    /// Config file (or defaults), then environment, then flags.
    pub fn load_storefront_config(&self) -> Result<StorefrontConfig> {
        let mut config = match &self.config {
            Some(path) => StorefrontConfig::from_file(path)?,
            None => StorefrontConfig::default(),
        };
        config.apply_env_overrides();
        if let Some(base_url) = &self.base_url {
            config.storefront.base_url = base_url.clone();
        }
        Ok(config)
    }
}
