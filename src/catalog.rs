//! Default currency catalog seeding.

use crate::core::error::StoreError;
use crate::core::store::RateStore;
use tracing::debug;

/// Currencies registered as common on every startup.
pub const DEFAULT_CURRENCIES: [(&str, &str); 10] = [
    ("EUR", "Euro"),
    ("USD", "US Dollar"),
    ("GBP", "British Pound"),
    ("CHF", "Swiss Franc"),
    ("JPY", "Japanese Yen"),
    ("CAD", "Canadian Dollar"),
    ("AUD", "Australian Dollar"),
    ("CZK", "Czech Koruna"),
    ("SEK", "Swedish Krona"),
    ("NOK", "Norwegian Krone"),
];

/// Registers the default currencies. Safe to call repeatedly; returns how many
/// entries were newly created.
pub async fn seed_default_currencies(store: &dyn RateStore) -> Result<usize, StoreError> {
    let mut added = 0;
    for (code, name) in DEFAULT_CURRENCIES {
        if store.register_currency_if_absent(code, name, true).await? {
            added += 1;
        }
    }
    debug!("Seeded {} default currencies", added);
    Ok(added)
}
