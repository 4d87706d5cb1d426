use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use knowguide_core::constants::DEFAULT_AGE;
use knowguide_core::{Currency, Horizon};

/// KnowAndGuide portfolio assistant.
#[derive(Debug, Parser)]
#[command(name = "knowguide", version, about)]
pub struct Cli {
    /// Backend base URL (overrides KG_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Request a portfolio recommendation
    Recommend(RecommendArgs),
    /// Connect a Superhero brokerage account and sync holdings
    Connect(ConnectArgs),
    /// Parse a brokerage holdings export
    Holdings {
        /// Path to the exported CSV file
        path: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct RecommendArgs {
    #[arg(long, default_value_t = DEFAULT_AGE)]
    pub age: u32,

    /// short, medium or long
    #[arg(long, default_value = "medium")]
    pub horizon: Horizon,

    /// Favour dividend-paying assets
    #[arg(long)]
    pub dividends: bool,

    /// Comma separated tickers, replacing the default universe
    #[arg(long, value_delimiter = ',')]
    pub assets: Vec<String>,

    /// AUD or USD
    #[arg(long, default_value = "AUD")]
    pub currency: Currency,

    /// Brokerage export whose tickers are added to the universe
    #[arg(long)]
    pub holdings_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ConnectArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long, env = "KG_SUPERHERO_PASSWORD", hide_env_values = true)]
    pub password: String,
}
