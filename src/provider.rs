//! Readiness data provider
//!
//! The tracker reads daily readiness records through a [`ReadinessProvider`].
//! [`OuraClient`] implements it against the Oura v2 REST API.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use tracing::{debug, error};

use crate::adapters::{OuraAdapter, ReadinessAdapter};
use crate::error::TrackerError;
use crate::types::DailyReading;

/// Default Oura API base URL
pub const OURA_API_BASE_URL: &str = "https://api.ouraring.com";

/// Source of daily readiness readings
#[async_trait]
pub trait ReadinessProvider: Send + Sync {
    /// Readings for the inclusive range `[start, end]`, oldest first.
    ///
    /// An empty vector means "no data yet" and is not an error.
    async fn fetch_daily_readiness(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyReading>, TrackerError>;
}

/// Oura v2 `daily_readiness` client authenticated with a personal access token
pub struct OuraClient {
    client: Client,
    base_url: String,
    token: String,
}

impl OuraClient {
    /// Create a client against the public Oura API
    pub fn new(token: &str) -> Self {
        Self::with_base_url(token, OURA_API_BASE_URL)
    }

    /// Create a client against a specific base URL
    pub fn with_base_url(token: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl ReadinessProvider for OuraClient {
    async fn fetch_daily_readiness(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyReading>, TrackerError> {
        let url = format!("{}/v2/usercollection/daily_readiness", self.base_url);
        let start_date = start.format("%Y-%m-%d").to_string();
        let end_date = end.format("%Y-%m-%d").to_string();
        debug!("Requesting Oura daily readiness {start_date}..{end_date}");

        let response = self
            .client
            .get(&url)
            .query(&[("start_date", &start_date), ("end_date", &end_date)])
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| TrackerError::ProviderFailure(format!("Failed to send request: {e}")))?;

        let status = response.status();
        debug!("Oura API response status: {status}");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(
                "Oura API request failed - status: {status}, body_length: {} bytes",
                text.len()
            );
            return Err(TrackerError::ProviderFailure(format!(
                "Oura API returned HTTP {status}"
            )));
        }

        let body = response.text().await.map_err(|e| {
            TrackerError::ProviderFailure(format!("Failed to read API response: {e}"))
        })?;

        OuraAdapter.parse(&body).map_err(|e| {
            TrackerError::ProviderFailure(format!("Failed to parse API response: {e}"))
        })
    }
}
