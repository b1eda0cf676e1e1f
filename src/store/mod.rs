pub mod disk;
pub mod memory;

use crate::core::config::{AppConfig, StoreBackend};
use crate::core::store::RateStore;
use anyhow::{Context, Result};
use disk::DiskRateStore;
use memory::MemoryRateStore;
use std::sync::Arc;
use tracing::debug;

/// Opens the rate store selected by `config`.
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn RateStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            debug!("Using in-memory rate store");
            Ok(Arc::new(MemoryRateStore::new()))
        }
        StoreBackend::Disk => {
            let path = config.default_data_path()?.join("cache");
            let store = DiskRateStore::open(&path)
                .with_context(|| format!("Failed to open rate store at {}", path.display()))?;
            Ok(Arc::new(store))
        }
    }
}
