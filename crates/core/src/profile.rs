//! Investor profile submitted to the recommendation endpoint.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_AGE, DEFAULT_UNIVERSE, MAX_AGE};
use crate::errors::{Result, ValidationError};

/// Investment horizon of the investor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    Short,
    #[default]
    Medium,
    Long,
}

impl Horizon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Horizon::Short => "short",
            Horizon::Medium => "medium",
            Horizon::Long => "long",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Horizon {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Horizon::Short),
            "medium" => Ok(Horizon::Medium),
            "long" => Ok(Horizon::Long),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown horizon '{}', expected short, medium or long",
                other
            ))),
        }
    }
}

/// Reporting currency of the recommendation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Aud,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Aud => "AUD",
            Currency::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AUD" => Ok(Currency::Aud),
            "USD" => Ok(Currency::Usd),
            other => Err(ValidationError::InvalidInput(format!(
                "Currency '{}' is not supported",
                other
            ))),
        }
    }
}

/// The investor profile, serialized exactly as the backend expects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvestorProfile {
    pub age: u32,
    pub horizon: Horizon,
    pub goal_dividends: bool,
    /// Ordered ticker universe to optimize over
    pub assets: Vec<String>,
    pub currency: Currency,
}

impl Default for InvestorProfile {
    fn default() -> Self {
        Self {
            age: DEFAULT_AGE,
            horizon: Horizon::default(),
            goal_dividends: false,
            assets: DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect(),
            currency: Currency::default(),
        }
    }
}

/// Trim and uppercase a ticker symbol.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_ascii_uppercase()
}

impl InvestorProfile {
    /// Replace the asset universe.
    ///
    /// Tickers are normalized, blanks are dropped and duplicates keep their
    /// first position.
    pub fn with_assets<I, S>(mut self, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.assets.clear();
        self.merge_assets(assets);
        self
    }

    /// Append tickers that are not already part of the universe.
    ///
    /// Returns the number of tickers added.
    pub fn merge_assets<I, S>(&mut self, assets: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashSet<String> = self.assets.iter().cloned().collect();
        let before = self.assets.len();
        for ticker in assets {
            let ticker = normalize_ticker(ticker.as_ref());
            if ticker.is_empty() || !seen.insert(ticker.clone()) {
                continue;
            }
            self.assets.push(ticker);
        }
        self.assets.len() - before
    }

    /// Check the profile before it is submitted.
    pub fn validate(&self) -> Result<()> {
        if self.age > MAX_AGE {
            return Err(ValidationError::InvalidInput(format!(
                "Age {} is out of range (0-{})",
                self.age, MAX_AGE
            ))
            .into());
        }
        if self.assets.is_empty() {
            return Err(ValidationError::MissingField("assets".to_string()).into());
        }
        Ok(())
    }
}
