use crate::core::rate::{CurrencyInfo, ExchangeRateRecord, QueryLogEntry};
use crate::core::store::{RateStore, StoreResult, within_window};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use tracing::debug;

type RateKey = (String, NaiveDate, String);

#[derive(Default)]
struct Inner {
    rates: BTreeMap<RateKey, ExchangeRateRecord>,
    currencies: HashMap<String, CurrencyInfo>,
    queries: Vec<QueryLogEntry>,
}

/// In-memory rate store. State lives as long as the instance.
pub struct MemoryRateStore {
    inner: Mutex<Inner>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Total number of stored rate records.
    pub async fn record_count(&self) -> usize {
        self.inner.lock().await.rates.len()
    }
}

impl Default for MemoryRateStore {
    fn default() -> Self {
        Self::new()
    }
}

fn code_range(code: &str) -> std::ops::RangeInclusive<RateKey> {
    (code.to_string(), NaiveDate::MIN, String::new())
        ..=(code.to_string(), NaiveDate::MAX, char::MAX.to_string())
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn insert_if_absent(&self, record: ExchangeRateRecord) -> StoreResult<bool> {
        let key = record.natural_key();
        let mut inner = self.inner.lock().await;
        if inner.rates.contains_key(&key) {
            debug!("Rate already stored for key: {:?}", key);
            return Ok(false);
        }
        debug!("Rate PUT for key: {:?}", key);
        inner.rates.insert(key, record);
        Ok(true)
    }

    async fn latest_for(&self, code: &str) -> StoreResult<Option<ExchangeRateRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .rates
            .range(code_range(code))
            .map(|(_, record)| record)
            .max_by_key(|record| record.fetch_date)
            .cloned())
    }

    async fn history_for(
        &self,
        code: &str,
        days: u32,
        today: NaiveDate,
    ) -> StoreResult<Vec<ExchangeRateRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .rates
            .range(code_range(code))
            .map(|(_, record)| record)
            .filter(|record| within_window(record.effective_date, days, today))
            .cloned()
            .collect())
    }

    async fn all_currencies(&self) -> StoreResult<Vec<CurrencyInfo>> {
        let inner = self.inner.lock().await;
        Ok(inner.currencies.values().cloned().collect())
    }

    async fn register_currency_if_absent(
        &self,
        code: &str,
        name: &str,
        is_common: bool,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        if inner.currencies.contains_key(code) {
            return Ok(false);
        }
        debug!("Registering currency {} ({})", code, name);
        inner.currencies.insert(
            code.to_string(),
            CurrencyInfo {
                currency_code: code.to_string(),
                currency_name: name.to_string(),
                is_common,
            },
        );
        Ok(true)
    }

    async fn log_query(&self, entry: QueryLogEntry) -> StoreResult<()> {
        self.inner.lock().await.queries.push(entry);
        Ok(())
    }

    async fn recent_queries(&self, count: usize) -> StoreResult<Vec<QueryLogEntry>> {
        let inner = self.inner.lock().await;
        let mut queries = inner.queries.clone();
        queries.sort_by(|a, b| b.query_time.cmp(&a.query_time));
        queries.truncate(count);
        Ok(queries)
    }
}
