//! Cache and merge policy for exchange rate queries.
//!
//! [`RateCacheService`] answers "current rate" and "N-day history" queries from
//! the [`RateStore`] when the stored data is fresh or complete enough, and tops
//! the store up from the [`RateProvider`] otherwise. Provider calls never hold a
//! store lock; fetched data is merged through `insert_if_absent` only after the
//! call has completed, so a timed out or failed call leaves the store untouched.

use crate::catalog::seed_default_currencies;
use crate::core::config::AppConfig;
use crate::core::error::{ProviderError, RateError};
use crate::core::rate::{
    Clock, CurrencyInfo, ExchangeRateRecord, HistoryEntry, QueryLogEntry, RatePoint, RateProvider,
    SystemClock, distinct_dates, sort_history,
};
use crate::core::store::RateStore;
use crate::core::validation::{validate_currency_code, validate_days, validate_history_code};
use chrono::{DateTime, NaiveDate, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Age after which a stored current rate is re-fetched.
    pub freshness_window: chrono::Duration,
    /// Upper bound on a single provider call.
    pub provider_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            freshness_window: chrono::Duration::hours(24),
            provider_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&AppConfig> for ServiceSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            freshness_window: config.freshness_window(),
            provider_timeout: config.provider_timeout(),
        }
    }
}

pub struct RateCacheService {
    store: Arc<dyn RateStore>,
    provider: Arc<dyn RateProvider>,
    settings: ServiceSettings,
    clock: Arc<dyn Clock>,
}

impl RateCacheService {
    pub async fn new(
        store: Arc<dyn RateStore>,
        provider: Arc<dyn RateProvider>,
        settings: ServiceSettings,
    ) -> Self {
        Self::with_clock(store, provider, settings, Arc::new(SystemClock)).await
    }

    /// Builds the service and seeds the default currency catalog.
    pub async fn with_clock(
        store: Arc<dyn RateStore>,
        provider: Arc<dyn RateProvider>,
        settings: ServiceSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if let Err(e) = seed_default_currencies(store.as_ref()).await {
            warn!(error = %e, "Failed to seed default currencies");
        }
        Self {
            store,
            provider,
            settings,
            clock,
        }
    }

    /// Current rate for `code`, served from the store when fresh.
    pub async fn get_current_rate(&self, code: &str) -> Result<f64, RateError> {
        self.get_current_rate_for_client(code, None).await
    }

    #[instrument(name = "CurrentRate", skip(self, client_info), fields(code = %code))]
    pub async fn get_current_rate_for_client(
        &self,
        code: &str,
        client_info: Option<&str>,
    ) -> Result<f64, RateError> {
        let code = validate_currency_code(code)?;
        let now = self.clock.now();

        match self.store.latest_for(&code).await {
            Ok(Some(record)) if now - record.fetch_date < self.settings.freshness_window => {
                debug!(
                    "Cache HIT for {}: {} fetched at {}",
                    code, record.rate, record.fetch_date
                );
                self.record_query(&code, now, true, client_info).await;
                return Ok(record.rate);
            }
            Ok(_) => debug!("Cache MISS for {}", code),
            Err(e) => warn!(error = %e, "Failed to read cached rate for {}", code),
        }

        let point = self
            .call_provider(self.provider.get_latest(&code))
            .await?
            .ok_or_else(|| {
                RateError::NotFound(format!("Provider returned no rate for currency: {code}"))
            })?;
        if !point.is_usable() {
            return Err(RateError::Upstream(format!(
                "Provider returned an invalid rate {} for currency: {code}",
                point.rate
            )));
        }

        let rate = point.rate;
        let record = ExchangeRateRecord::from_point(&code, point, now);
        if let Err(e) = self.store.insert_if_absent(record).await {
            warn!(error = %e, "Failed to cache fetched rate for {}", code);
        }
        self.register_currency(&code).await;
        self.record_query(&code, now, false, client_info).await;

        info!("Fetched exchange rate for {}: {}", code, rate);
        Ok(rate)
    }

    /// Records for `code` over the trailing `days` days, newest first.
    #[instrument(name = "History", skip(self), fields(code = %code, days = days))]
    pub async fn get_history(
        &self,
        code: &str,
        days: i64,
    ) -> Result<Vec<ExchangeRateRecord>, RateError> {
        let code = validate_history_code(code)?;
        let days = validate_days(days)?;
        let now = self.clock.now();
        let today = now.date_naive();

        let cached = self.read_history(&code, days, today).await;
        let covered = distinct_dates(&cached);
        debug!("Store covers {} of {} days for {}", covered, days, code);

        if covered < days as usize {
            match self
                .call_provider(self.provider.get_historical(&code, days))
                .await
            {
                Ok(points) => self.merge_points(&code, points, now).await,
                Err(e) if cached.len() >= days as usize => {
                    warn!(error = %e, "History top-up failed for {}, using stored records", code);
                }
                // Any untolerated top-up failure is upstream, including a 404
                Err(e) => return Err(RateError::Upstream(e.to_string())),
            }
        }

        let mut records = self.read_history(&code, days, today).await;
        sort_history(&mut records);
        debug!("Returning {} historical records for {}", records.len(), code);
        Ok(records)
    }

    pub async fn get_exchange_rate_history(
        &self,
        code: &str,
        days: i64,
    ) -> Result<Vec<HistoryEntry>, RateError> {
        let records = self.get_history(code, days).await?;
        Ok(records.iter().map(HistoryEntry::from).collect())
    }

    /// Catalog sorted by currency code.
    pub async fn get_available_currencies(&self) -> Vec<CurrencyInfo> {
        match self.store.all_currencies().await {
            Ok(mut currencies) => {
                currencies.sort_by(|a, b| a.currency_code.cmp(&b.currency_code));
                currencies
            }
            Err(e) => {
                warn!(error = %e, "Failed to read currency catalog");
                Vec::new()
            }
        }
    }

    pub async fn recent_queries(&self, count: usize) -> Vec<QueryLogEntry> {
        self.store.recent_queries(count).await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read query log");
            Vec::new()
        })
    }

    async fn call_provider<T, F>(&self, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.settings.provider_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Upstream(format!(
                "Provider call timed out after {:?}",
                self.settings.provider_timeout
            ))),
        }
    }

    async fn read_history(
        &self,
        code: &str,
        days: u32,
        today: NaiveDate,
    ) -> Vec<ExchangeRateRecord> {
        self.store
            .history_for(code, days, today)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read stored history for {}", code);
                Vec::new()
            })
    }

    async fn merge_points(&self, code: &str, points: Vec<RatePoint>, now: DateTime<Utc>) {
        let received = points.len();
        let mut usable = 0;
        let mut inserted = 0;
        for point in points {
            if !point.is_usable() {
                warn!(
                    "Skipping invalid rate {} for {} on {}",
                    point.rate, code, point.effective_date
                );
                continue;
            }
            usable += 1;
            match self
                .store
                .insert_if_absent(ExchangeRateRecord::from_point(code, point, now))
                .await
            {
                Ok(true) => inserted += 1,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Failed to store historical rate for {}", code),
            }
        }
        if usable > 0 {
            self.register_currency(code).await;
        }
        debug!(
            "Merged history for {}: {} received, {} new",
            code, received, inserted
        );
    }

    async fn register_currency(&self, code: &str) {
        if let Err(e) = self.store.register_currency_if_absent(code, code, false).await {
            warn!(error = %e, "Failed to register currency {}", code);
        }
    }

    async fn record_query(
        &self,
        code: &str,
        query_time: DateTime<Utc>,
        was_from_cache: bool,
        client_info: Option<&str>,
    ) {
        let entry = QueryLogEntry {
            currency_code: code.to_string(),
            query_time,
            was_from_cache,
            client_info: client_info.map(str::to_string),
        };
        if let Err(e) = self.store.log_query(entry).await {
            warn!(error = %e, "Failed to record query for {}", code);
        }
    }
}
