//! HTTP client for the KnowAndGuide backend.
//!
//! Covers the recommendation endpoint and the three brokerage login
//! endpoints. The connection flow only sees the [`SessionApi`] trait.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use knowguide_core::{InvestorProfile, RecommendationResult};

use crate::error::{ConnectError, Result};
use crate::session::{Credentials, HoldingsPayload, LoginStatus, SessionApi, SessionStartReply};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const RECOMMEND_PATH: &str = "/api/recommend";
const CONNECT_PATH: &str = "/api/connect-superhero";
const STATUS_PATH: &str = "/api/superhero-status";
const HOLDINGS_PATH: &str = "/api/superhero-holdings";

#[derive(Debug, serde::Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the KnowAndGuide backend.
///
/// # Example
///
/// ```ignore
/// let client = ConnectApiClient::new("http://localhost:5001", Duration::from_secs(30))?;
/// let result = client.recommend(&InvestorProfile::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ConnectApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ConnectApiClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The backend base URL (e.g., "http://localhost:5001")
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Parse an HTTP response, turning non-2xx statuses into API errors.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Try to parse error response for a better message
            if let Ok(err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                let msg = err
                    .error
                    .or(err.message)
                    .unwrap_or_else(|| format!("HTTP {}", status));
                return Err(ConnectError::api(status.as_u16(), msg));
            }
            return Err(ConnectError::api(
                status.as_u16(),
                body.chars().take(200).collect::<String>(),
            ));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Request a portfolio recommendation for `profile`.
    ///
    /// POST /api/recommend
    ///
    /// The profile is validated locally before anything is sent.
    pub async fn recommend(&self, profile: &InvestorProfile) -> Result<RecommendationResult> {
        profile.validate()?;
        let url = self.url(RECOMMEND_PATH);
        debug!("[ConnectApi] POST {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(profile)
            .send()
            .await?;

        let value: Value = Self::parse_response(response).await?;
        Ok(RecommendationResult::from(value))
    }
}

#[async_trait]
impl SessionApi for ConnectApiClient {
    /// POST /api/connect-superhero
    async fn start_session(&self, credentials: &Credentials) -> Result<SessionStartReply> {
        let url = self.url(CONNECT_PATH);
        debug!("[ConnectApi] POST {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(credentials)
            .send()
            .await?;

        let status = response.status();
        let body: Value = serde_json::from_str(&response.text().await?)?;

        let error = match body.get("error") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        };

        if status.is_success() && error.is_none() {
            Ok(SessionStartReply::Started)
        } else {
            debug!("[ConnectApi] Session refused ({}): {:?}", status, error);
            Ok(SessionStartReply::Rejected { error })
        }
    }

    /// GET /api/superhero-status
    ///
    /// The body is read whatever the HTTP status.
    async fn login_status(&self) -> Result<LoginStatus> {
        let url = self.url(STATUS_PATH);
        debug!("[ConnectApi] GET {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            debug!("[ConnectApi] Status endpoint answered {}", status);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// GET /api/superhero-holdings
    async fn holdings(&self) -> Result<HoldingsPayload> {
        let url = self.url(HOLDINGS_PATH);
        debug!("[ConnectApi] GET {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers())
            .send()
            .await?;

        Self::parse_response(response).await
    }
}
