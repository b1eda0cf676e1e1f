use crate::core::error::ProviderError;
use crate::core::rate::{NO_TABLE, RatePoint, RateProvider};
use crate::providers::util::with_retry;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Rate provider backed by the NBP (National Bank of Poland) table A API.
///
/// Rates are mid rates in PLN per 1 unit of the requested currency.
pub struct NbpProvider {
    base_url: String,
    client: reqwest::Client,
}

impl NbpProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("xfx/0.1")
            .timeout(timeout)
            .build()?;
        Ok(NbpProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn latest_url(&self, code: &str) -> String {
        format!(
            "{}/api/exchangerates/rates/a/{}/?format=json",
            self.base_url,
            code.to_lowercase()
        )
    }

    fn history_url(&self, code: &str, days: u32) -> String {
        format!(
            "{}/api/exchangerates/rates/a/{}/last/{}/?format=json",
            self.base_url,
            code.to_lowercase(),
            days
        )
    }

    async fn fetch_rates(&self, url: &str, code: &str) -> Result<NbpResponse, ProviderError> {
        debug!("Requesting exchange rates from {}", url);

        let response = with_retry(
            || async {
                self.client
                    .get(url)
                    .header("Accept", "application/json")
                    .send()
                    .await
            },
            RETRIES,
            RETRY_DELAY,
        )
        .await
        .map_err(|e| {
            ProviderError::Upstream(format!("Request error: {e} for currency: {code}"))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(format!(
                "No exchange rate published for currency: {code}"
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::Upstream(format!(
                "HTTP error: {status} for currency: {code}"
            )));
        }

        let text = response.text().await.map_err(|e| {
            ProviderError::Upstream(format!(
                "Failed to read response body for currency: {code}: {e}"
            ))
        })?;
        if text.trim().is_empty() {
            return Err(ProviderError::Upstream(format!(
                "Received empty response for currency: {code}"
            )));
        }

        serde_json::from_str::<NbpResponse>(&text).map_err(|e| {
            ProviderError::Upstream(format!(
                "Failed to parse NBP response for currency: {code}: {e}"
            ))
        })
    }
}

#[derive(Debug, Deserialize)]
struct NbpResponse {
    #[serde(default)]
    rates: Vec<NbpRate>,
}

#[derive(Debug, Deserialize)]
struct NbpRate {
    no: Option<String>,
    #[serde(alias = "effectiveDate")]
    effective_date: NaiveDate,
    mid: f64,
}

impl From<NbpRate> for RatePoint {
    fn from(rate: NbpRate) -> Self {
        RatePoint {
            rate: rate.mid,
            effective_date: rate.effective_date,
            table_number: rate.no.unwrap_or_else(|| NO_TABLE.to_string()),
        }
    }
}

#[async_trait]
impl RateProvider for NbpProvider {
    #[instrument(name = "NbpLatestFetch", skip(self), fields(code = %code))]
    async fn get_latest(&self, code: &str) -> Result<Option<RatePoint>, ProviderError> {
        let url = self.latest_url(code);
        let data = self.fetch_rates(&url, code).await?;
        Ok(data.rates.into_iter().next().map(RatePoint::from))
    }

    #[instrument(name = "NbpHistoryFetch", skip(self), fields(code = %code, days = days))]
    async fn get_historical(&self, code: &str, days: u32) -> Result<Vec<RatePoint>, ProviderError> {
        let url = self.history_url(code, days);
        let data = self.fetch_rates(&url, code).await?;
        debug!("Parsed {} rates from NBP response", data.rates.len());
        Ok(data.rates.into_iter().map(RatePoint::from).collect())
    }
}
