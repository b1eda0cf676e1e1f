use crate::core::error::StoreError;
use crate::core::rate::{CurrencyInfo, ExchangeRateRecord, QueryLogEntry};
use crate::core::store::{RateStore, StoreResult, within_window};
use async_trait::async_trait;
use chrono::NaiveDate;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const RATES_PARTITION: &str = "rates";
const CURRENCIES_PARTITION: &str = "currencies";
const QUERIES_PARTITION: &str = "queries";

/// Rate store persisted in a fjall keyspace.
///
/// Rate keys are laid out as `CODE|YYYY-MM-DD|TABLE` so that all records of a
/// currency form one contiguous prefix. Writers serialize on `write_lock`,
/// which turns each check-then-insert into a single atomic step.
pub struct DiskRateStore {
    _keyspace: Keyspace,
    rates: PartitionHandle,
    currencies: PartitionHandle,
    queries: PartitionHandle,
    write_lock: Mutex<()>,
    query_seq: AtomicU64,
}

impl DiskRateStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(path).map_err(|e| StoreError::Backend(e.to_string()))?;
        let keyspace = fjall::Config::new(path.join("rates_db")).open()?;
        let rates = keyspace.open_partition(RATES_PARTITION, PartitionCreateOptions::default())?;
        let currencies =
            keyspace.open_partition(CURRENCIES_PARTITION, PartitionCreateOptions::default())?;
        let queries =
            keyspace.open_partition(QUERIES_PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened disk rate store at {}", path.display());

        Ok(Self {
            _keyspace: keyspace,
            rates,
            currencies,
            queries,
            write_lock: Mutex::new(()),
            query_seq: AtomicU64::new(0),
        })
    }

    fn rate_key(record: &ExchangeRateRecord) -> String {
        format!(
            "{}|{}|{}",
            record.currency_code,
            record.effective_date.format("%Y-%m-%d"),
            record.table_number
        )
    }

    fn code_prefix(code: &str) -> String {
        format!("{code}|")
    }

    fn records_for(&self, code: &str) -> StoreResult<Vec<ExchangeRateRecord>> {
        let mut records = Vec::new();
        for item in self.rates.prefix(Self::code_prefix(code)) {
            let (_key, value) = item?;
            records.push(serde_json::from_slice::<ExchangeRateRecord>(&value)?);
        }
        Ok(records)
    }

    fn query_key(&self, entry: &QueryLogEntry) -> String {
        let nanos = entry.query_time.timestamp_nanos_opt().unwrap_or_default().max(0);
        let seq = self.query_seq.fetch_add(1, Ordering::SeqCst);
        format!("{nanos:020}|{seq:020}")
    }
}

#[async_trait]
impl RateStore for DiskRateStore {
    async fn insert_if_absent(&self, record: ExchangeRateRecord) -> StoreResult<bool> {
        let key = Self::rate_key(&record);
        let value = serde_json::to_vec(&record)?;

        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        if self.rates.contains_key(&key)? {
            debug!("Rate already stored for key: {}", key);
            return Ok(false);
        }
        self.rates.insert(key.as_str(), value)?;
        debug!("Rate PUT for key: {}", key);
        Ok(true)
    }

    async fn latest_for(&self, code: &str) -> StoreResult<Option<ExchangeRateRecord>> {
        Ok(self
            .records_for(code)?
            .into_iter()
            .max_by_key(|record| record.fetch_date))
    }

    async fn history_for(
        &self,
        code: &str,
        days: u32,
        today: NaiveDate,
    ) -> StoreResult<Vec<ExchangeRateRecord>> {
        Ok(self
            .records_for(code)?
            .into_iter()
            .filter(|record| within_window(record.effective_date, days, today))
            .collect())
    }

    async fn all_currencies(&self) -> StoreResult<Vec<CurrencyInfo>> {
        let mut currencies = Vec::new();
        for item in self.currencies.iter() {
            let (_key, value) = item?;
            currencies.push(serde_json::from_slice::<CurrencyInfo>(&value)?);
        }
        Ok(currencies)
    }

    async fn register_currency_if_absent(
        &self,
        code: &str,
        name: &str,
        is_common: bool,
    ) -> StoreResult<bool> {
        let info = CurrencyInfo {
            currency_code: code.to_string(),
            currency_name: name.to_string(),
            is_common,
        };
        let value = serde_json::to_vec(&info)?;

        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        if self.currencies.contains_key(code)? {
            return Ok(false);
        }
        self.currencies.insert(code, value)?;
        debug!("Registered currency {} ({})", code, name);
        Ok(true)
    }

    async fn log_query(&self, entry: QueryLogEntry) -> StoreResult<()> {
        let key = self.query_key(&entry);
        let value = serde_json::to_vec(&entry)?;
        self.queries.insert(key.as_str(), value)?;
        Ok(())
    }

    async fn recent_queries(&self, count: usize) -> StoreResult<Vec<QueryLogEntry>> {
        let mut entries = Vec::with_capacity(count);
        for item in self.queries.iter().rev().take(count) {
            let (_key, value) = item?;
            entries.push(serde_json::from_slice::<QueryLogEntry>(&value)?);
        }
        Ok(entries)
    }
}
