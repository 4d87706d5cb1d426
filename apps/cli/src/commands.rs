//! Subcommand implementations.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context};
use tracing::{info, warn};

use knowguide_connect::session::{
    ChannelObserver, ConnectionController, ConnectionSnapshot, ConnectionState,
    ControllerOptions, Credentials, HoldingsHandler, HoldingsSnapshot, HoldingsSyncStatus,
    RequireNonEmptyCredentials,
};
use knowguide_connect::ConnectApiClient;
use knowguide_core::{parse_holdings_export, Holding, InvestorProfile, RecommendationResult};

use crate::cli::{ConnectArgs, RecommendArgs};
use crate::config::Config;

// ─────────────────────────────────────────────────────────────────────────────
// recommend
// ─────────────────────────────────────────────────────────────────────────────

pub async fn recommend(client: &ConnectApiClient, args: RecommendArgs) -> anyhow::Result<()> {
    let profile = build_profile(args)?;
    info!(
        "Requesting recommendation for {} assets ({} horizon)",
        profile.assets.len(),
        profile.horizon
    );

    let result = client.recommend(&profile).await?;
    println!("{}", render_recommendation(&result)?);
    Ok(())
}

fn build_profile(args: RecommendArgs) -> anyhow::Result<InvestorProfile> {
    let mut profile = InvestorProfile {
        age: args.age,
        horizon: args.horizon,
        goal_dividends: args.dividends,
        currency: args.currency,
        ..InvestorProfile::default()
    };
    if !args.assets.is_empty() {
        profile = profile.with_assets(&args.assets);
    }

    if let Some(path) = &args.holdings_file {
        let holdings = read_holdings(path)?;
        let added = profile.merge_assets(holdings.iter().map(|h| h.ticker.as_str()));
        info!(
            "Added {} tickers from {} ({} holdings)",
            added,
            path.display(),
            holdings.len()
        );
    }

    profile.validate()?;
    Ok(profile)
}

fn render_recommendation(result: &RecommendationResult) -> anyhow::Result<String> {
    if let Some(error) = result.error() {
        bail!("Backend could not build a recommendation: {}", error);
    }
    if let Some(warning) = result.warning() {
        warn!("{}", warning);
    }
    Ok(serde_json::to_string_pretty(result.as_value())?)
}

// ─────────────────────────────────────────────────────────────────────────────
// connect
// ─────────────────────────────────────────────────────────────────────────────

/// Keeps the holdings delivered after login so they can be printed at the end.
#[derive(Default)]
struct CapturedHoldings {
    latest: Mutex<Option<HoldingsSnapshot>>,
}

impl HoldingsHandler for CapturedHoldings {
    fn on_holdings(&self, holdings: &HoldingsSnapshot) {
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(holdings.clone());
        }
    }
}

pub async fn connect(
    client: ConnectApiClient,
    config: &Config,
    args: ConnectArgs,
) -> anyhow::Result<()> {
    let (observer, mut updates) = ChannelObserver::new();
    let captured = Arc::new(CapturedHoldings::default());
    let controller = ConnectionController::new(
        Arc::new(client),
        ControllerOptions::default()
            .with_poll_config(config.poll.clone())
            .with_policy(Arc::new(RequireNonEmptyCredentials))
            .with_holdings_handler(captured.clone())
            .with_observer(Arc::new(observer)),
    );

    controller.start()?;
    controller.submit(Credentials::new(args.username, args.password))?;

    loop {
        let snapshot = tokio::select! {
            update = updates.recv() => match update {
                Some(snapshot) => snapshot,
                None => bail!("Connection ended unexpectedly"),
            },
            _ = tokio::signal::ctrl_c() => {
                let state = controller.state();
                if state.is_busy() {
                    warn!("Interrupted while {}, abandoning connection attempt", state);
                }
                drop(controller);
                bail!("Connection cancelled");
            }
        };

        if let Some(line) = render_snapshot(&snapshot) {
            println!("{}", line);
        }
        if snapshot.state == ConnectionState::Error {
            bail!("{}", snapshot.message);
        }
        if connection_settled(&snapshot) {
            break;
        }
    }

    let latest = captured.latest.lock().ok().and_then(|mut l| l.take());
    if let Some(holdings) = latest {
        println!();
        println!("{}", holdings.raw_text);
    }
    Ok(())
}

fn render_snapshot(snapshot: &ConnectionSnapshot) -> Option<String> {
    if snapshot.message.is_empty() {
        return None;
    }
    Some(format!("[{}] {}", snapshot.state, snapshot.message))
}

/// Connected and the holdings fetch has finished one way or the other.
fn connection_settled(snapshot: &ConnectionSnapshot) -> bool {
    snapshot.state.is_terminal()
        && snapshot.state != ConnectionState::Error
        && matches!(
            snapshot.holdings,
            HoldingsSyncStatus::Synced | HoldingsSyncStatus::Failed
        )
}

// ─────────────────────────────────────────────────────────────────────────────
// holdings
// ─────────────────────────────────────────────────────────────────────────────

pub fn holdings(path: &Path) -> anyhow::Result<()> {
    let holdings = read_holdings(path)?;
    if holdings.is_empty() {
        println!("No holdings found in {}", path.display());
        return Ok(());
    }
    print!("{}", render_holdings(&holdings));
    Ok(())
}

fn read_holdings(path: &Path) -> anyhow::Result<Vec<Holding>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read holdings export {}", path.display()))?;
    let holdings = parse_holdings_export(&text)
        .with_context(|| format!("Failed to parse holdings export {}", path.display()))?;
    Ok(holdings)
}

fn render_holdings(holdings: &[Holding]) -> String {
    let width = holdings
        .iter()
        .map(|h| h.ticker.len())
        .max()
        .unwrap_or(0)
        .max("TICKER".len());

    let mut out = format!("{:<width$}  UNITS\n", "TICKER", width = width);
    for holding in holdings {
        out.push_str(&format!(
            "{:<width$}  {}\n",
            holding.ticker,
            holding.units,
            width = width
        ));
    }
    out
}
