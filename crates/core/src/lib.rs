//! KnowAndGuide Core - Investor profile and portfolio data types.
//!
//! This crate holds the data contract shared by the backend client and the
//! command line front-end: the investor profile sent for a recommendation,
//! the opaque recommendation payload, brokerage holdings exports and the
//! resolution of the backend base URL.

pub mod api_base;
pub mod constants;
pub mod errors;
pub mod holdings;
pub mod profile;
pub mod recommendation;

pub use holdings::{parse_holdings_export, Holding};
pub use profile::{Currency, Horizon, InvestorProfile};
pub use recommendation::RecommendationResult;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
