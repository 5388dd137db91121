use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::commands;
use crate::constants::{
    DEFAULT_APP_ID, DEFAULT_BASE_DELAY_MS, DEFAULT_BATCH_SIZE, DEFAULT_MAX_RETRIES,
    DEFAULT_REQUESTS_PER_MINUTE,
};
use crate::error::{Error, Result};
use crate::models::RunConfig;
use crate::services::RetryPolicy;
use crate::utils::get_price_data_dir;

#[derive(Parser)]
#[command(name = "steampriceaction")]
#[command(about = "Steam market price collector", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect prices for the next slice of the catalog and merge them into the store
    Pull(PullArgs),
    /// Show run cursor and price store status
    Status {
        /// Directory holding state.json and the price store
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Rewind the run cursor to the start of the catalog
    Reset {
        /// Directory holding state.json and the price store
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PullArgs {
    /// steamLoginSecure cookie value of a logged-in market account
    #[arg(long, env = "STEAM_LOGIN_SECURE", hide_env_values = true)]
    pub login_secure: Option<String>,

    /// Items fetched concurrently per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Request ceiling for the price endpoint (0 disables the sleep)
    #[arg(long, default_value_t = DEFAULT_REQUESTS_PER_MINUTE)]
    pub requests_per_minute: u32,

    /// Soft wall-clock budget for the run, in hours
    #[arg(long, default_value_t = 5.7)]
    pub max_hours: f64,

    /// Retries per request after the first attempt
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds
    #[arg(long, default_value_t = DEFAULT_BASE_DELAY_MS)]
    pub base_delay_ms: u64,

    /// Random jitter added to each backoff, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub jitter_ms: u64,

    /// Steam app id of the catalog
    #[arg(long, default_value_t = DEFAULT_APP_ID)]
    pub app_id: u32,

    /// Catalog listing URL (repeatable; replaces the built-in list)
    #[arg(long = "catalog-url")]
    pub catalog_urls: Vec<String>,

    /// Directory holding state.json and the price store
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl PullArgs {
    /// Build the run configuration, validating numeric flags
    pub fn to_config(&self) -> Result<RunConfig> {
        if !self.max_hours.is_finite() || self.max_hours < 0.0 {
            return Err(Error::Config(format!(
                "--max-hours must be a non-negative number, got {}",
                self.max_hours
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("--batch-size must be at least 1".to_string()));
        }

        let defaults = RunConfig::default();

        Ok(RunConfig {
            batch_size: self.batch_size,
            requests_per_minute: self.requests_per_minute,
            max_duration: Duration::from_secs_f64(self.max_hours * 3600.0),
            retry: RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))
                .with_jitter(Duration::from_millis(self.jitter_ms)),
            app_id: self.app_id,
            catalog_urls: if self.catalog_urls.is_empty() {
                defaults.catalog_urls
            } else {
                self.catalog_urls.clone()
            },
            data_dir: self.data_dir.clone().unwrap_or_else(get_price_data_dir),
        })
    }
}

pub fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Pull(args) => {
            commands::pull::run(args);
        }
        Commands::Status { data_dir } => {
            commands::status::run(data_dir.unwrap_or_else(get_price_data_dir));
        }
        Commands::Reset { data_dir } => {
            commands::reset::run(data_dir.unwrap_or_else(get_price_data_dir));
        }
    }
}
