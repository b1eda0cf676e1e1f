//! Core types, abstractions and ambient plumbing

pub mod config;
pub mod error;
pub mod log;
pub mod rate;
pub mod store;
pub mod validation;

// Re-export main types for cleaner imports
pub use error::{ProviderError, RateError, StoreError};
pub use rate::{
    Clock, CurrencyInfo, ExchangeRateRecord, HistoryEntry, QueryLogEntry, RatePoint, RateProvider,
    SystemClock,
};
pub use store::RateStore;
