//! Input checks shared by every service entry point.

use crate::core::error::RateError;

/// Command word reserved by the front end; never a currency.
pub const RESERVED_HISTORY_WORD: &str = "HISTORY";

pub const MIN_HISTORY_DAYS: i64 = 1;
pub const MAX_HISTORY_DAYS: i64 = 30;

/// Checks that `code` is exactly three ASCII letters and returns it uppercased.
pub fn validate_currency_code(code: &str) -> Result<String, RateError> {
    if code.is_empty() {
        return Err(RateError::Validation(
            "Currency code cannot be empty".to_string(),
        ));
    }
    if code.chars().count() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(RateError::Validation(format!(
            "'{code}' is not a valid currency code. Use a 3-letter code like EUR or USD"
        )));
    }
    Ok(code.to_ascii_uppercase())
}

/// Like [`validate_currency_code`], but also rejects the reserved history command word.
pub fn validate_history_code(code: &str) -> Result<String, RateError> {
    if code.eq_ignore_ascii_case(RESERVED_HISTORY_WORD) {
        return Err(RateError::Validation(format!(
            "'{RESERVED_HISTORY_WORD}' is not a valid currency code"
        )));
    }
    validate_currency_code(code)
}

pub fn validate_days(days: i64) -> Result<u32, RateError> {
    if !(MIN_HISTORY_DAYS..=MAX_HISTORY_DAYS).contains(&days) {
        return Err(RateError::Validation(format!(
            "Number of days must be between {MIN_HISTORY_DAYS} and {MAX_HISTORY_DAYS}, got {days}"
        )));
    }
    Ok(days as u32)
}
