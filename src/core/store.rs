//! Persistence abstraction for rate records, the currency catalog and the query log.

use crate::core::error::StoreError;
use crate::core::rate::{CurrencyInfo, ExchangeRateRecord, QueryLogEntry};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};

pub type StoreResult<T> = Result<T, StoreError>;

/// Append-only store of observed rates.
///
/// Records are deduplicated on their natural key and never updated or removed.
/// Implementations must make [`RateStore::insert_if_absent`] a single atomic
/// step so that racing inserts of the same key leave exactly one record.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Returns `true` if the record was inserted, `false` if its key already existed.
    async fn insert_if_absent(&self, record: ExchangeRateRecord) -> StoreResult<bool>;

    /// Record with the most recent fetch date for `code`.
    async fn latest_for(&self, code: &str) -> StoreResult<Option<ExchangeRateRecord>>;

    /// Records for `code` effective within the `days` calendar days ending at `today`.
    async fn history_for(
        &self,
        code: &str,
        days: u32,
        today: NaiveDate,
    ) -> StoreResult<Vec<ExchangeRateRecord>>;

    async fn all_currencies(&self) -> StoreResult<Vec<CurrencyInfo>>;

    /// Returns `true` if a new catalog entry was created.
    async fn register_currency_if_absent(
        &self,
        code: &str,
        name: &str,
        is_common: bool,
    ) -> StoreResult<bool>;

    async fn log_query(&self, entry: QueryLogEntry) -> StoreResult<()>;

    /// Newest entries first.
    async fn recent_queries(&self, count: usize) -> StoreResult<Vec<QueryLogEntry>>;
}

/// Whether `date` falls inside the trailing window `(today - days, today]`.
pub fn within_window(date: NaiveDate, days: u32, today: NaiveDate) -> bool {
    let start = today - Duration::days(i64::from(days));
    date > start && date <= today
}
