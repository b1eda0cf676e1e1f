//! Exchange rate types and the upstream provider abstraction

use crate::core::error::ProviderError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Placeholder used when the provider does not report a table number.
pub const NO_TABLE: &str = "N/A";

/// A single rate point as reported by the upstream provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub rate: f64,
    pub effective_date: NaiveDate,
    pub table_number: String,
}

impl RatePoint {
    /// A point is usable when its rate is a positive finite number.
    pub fn is_usable(&self) -> bool {
        self.rate.is_finite() && self.rate > 0.0
    }
}

/// An observed exchange rate, expressed in local currency per 1 unit of
/// `currency_code`. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateRecord {
    pub currency_code: String,
    pub rate: f64,
    pub effective_date: NaiveDate,
    pub fetch_date: DateTime<Utc>,
    pub table_number: String,
}

impl ExchangeRateRecord {
    pub fn from_point(code: &str, point: RatePoint, fetch_date: DateTime<Utc>) -> Self {
        let table_number = if point.table_number.trim().is_empty() {
            NO_TABLE.to_string()
        } else {
            point.table_number
        };
        Self {
            currency_code: code.to_uppercase(),
            rate: point.rate,
            effective_date: point.effective_date,
            fetch_date,
            table_number,
        }
    }

    /// The (code, effective date, table) triple that identifies a record.
    pub fn natural_key(&self) -> (String, NaiveDate, String) {
        (
            self.currency_code.clone(),
            self.effective_date,
            self.table_number.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    pub currency_code: String,
    pub currency_name: String,
    pub is_common: bool,
}

/// One row of an exchange rate history answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub rate: f64,
    pub table_number: String,
}

impl From<&ExchangeRateRecord> for HistoryEntry {
    fn from(record: &ExchangeRateRecord) -> Self {
        Self {
            date: record.effective_date,
            rate: record.rate,
            table_number: record.table_number.clone(),
        }
    }
}

/// Audit entry for a current-rate query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub currency_code: String,
    pub query_time: DateTime<Utc>,
    pub was_from_cache: bool,
    pub client_info: Option<String>,
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Latest published rate. `Ok(None)` means the provider answered with an
    /// empty result set.
    async fn get_latest(&self, code: &str) -> Result<Option<RatePoint>, ProviderError>;

    /// Up to `days` most recent published rates, in any order.
    async fn get_historical(&self, code: &str, days: u32) -> Result<Vec<RatePoint>, ProviderError>;
}

/// Source of the current time for cache decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Number of distinct effective dates covered by `records`.
pub fn distinct_dates(records: &[ExchangeRateRecord]) -> usize {
    records
        .iter()
        .map(|r| r.effective_date)
        .collect::<HashSet<_>>()
        .len()
}

/// Newest effective date first; same-date records ordered by table number.
pub fn sort_history(records: &mut [ExchangeRateRecord]) {
    records.sort_by(|a, b| {
        b.effective_date
            .cmp(&a.effective_date)
            .then_with(|| a.table_number.cmp(&b.table_number))
    });
}
