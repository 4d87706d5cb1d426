use std::ffi::OsString;
use std::path::Path;

use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use knowguide_connect::ConnectApiClient;

use crate::cli::Cli;
use crate::config::Config;

/// Load `.env` (or `dotenv_path`) into the environment, then parse `args`.
///
/// Loading comes first so `env = ...` argument fallbacks such as
/// `KG_SUPERHERO_PASSWORD` see values from the file. Variables already set in
/// the environment are not overridden.
pub fn parse_cli_from<I, T>(dotenv_path: Option<&Path>, args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match dotenv_path {
        Some(path) => {
            let _ = dotenvy::from_path(path);
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }
    Cli::try_parse_from(args)
}

/// Log to stderr so rendered results on stdout stay pipeable.
pub fn init_tracing() {
    let log_format = std::env::var("KG_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub fn build_client(config: &Config) -> anyhow::Result<ConnectApiClient> {
    tracing::info!("Using backend at {}", config.api_url);
    Ok(ConnectApiClient::new(
        &config.api_url,
        config.request_timeout,
    )?)
}
