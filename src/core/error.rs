//! Error kinds surfaced by the rate service and its collaborators.

use thiserror::Error;

/// Errors returned to callers of the rate service.
///
/// A transport layer is expected to translate these into its own fault
/// representation; the message carried by each variant is meant for the end
/// user and preserves any diagnostic text coming from the upstream provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("No exchange rate data found: {0}")]
    NotFound(String),

    #[error("Upstream provider error: {0}")]
    Upstream(String),

    #[error("Failed to persist exchange rate data: {0}")]
    Persistence(String),
}

/// Errors raised by a [`crate::core::store::RateStore`] implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend failure: {0}")]
    Backend(String),

    #[error("Failed to (de)serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<fjall::Error> for StoreError {
    fn from(err: fjall::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<StoreError> for RateError {
    fn from(err: StoreError) -> Self {
        RateError::Persistence(err.to_string())
    }
}

/// Errors raised by a [`crate::core::rate::RateProvider`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(String),
}

impl From<ProviderError> for RateError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(msg) => RateError::NotFound(msg),
            ProviderError::Upstream(msg) => RateError::Upstream(msg),
        }
    }
}
