mod cli;
mod commands;
mod config;
mod main_lib;

use cli::Command;
use config::Config;
use main_lib::{build_client, init_tracing, parse_cli_from};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = parse_cli_from(None, std::env::args_os()).unwrap_or_else(|e| e.exit());
    init_tracing();

    let config = Config::from_env().with_api_url_override(cli.api_url.as_deref());

    match cli.command {
        Command::Recommend(args) => commands::recommend(&build_client(&config)?, args).await,
        Command::Connect(args) => commands::connect(build_client(&config)?, &config, args).await,
        Command::Holdings { path } => commands::holdings(&path),
    }
}
