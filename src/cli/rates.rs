use super::ui::{self, StyleType};
use crate::core::rate::HistoryEntry;
use crate::service::RateCacheService;
use anyhow::Result;
use comfy_table::Cell;

/// Local currency every rate is quoted in.
pub const LOCAL_CURRENCY: &str = "PLN";

pub fn format_rate(code: &str, rate: f64) -> String {
    let mut out = format!(
        "{}\n1 {code} = {} {LOCAL_CURRENCY}\n",
        ui::style_text(&format!("Exchange rate for {code}"), StyleType::Title),
        ui::style_text(&format!("{rate:.4}"), StyleType::Value),
    );
    for amount in [10.0, 100.0] {
        out.push_str(&format!(
            "{amount} {code} = {:.2} {LOCAL_CURRENCY}\n",
            amount * rate
        ));
    }
    out.push_str(&format!("1000 {LOCAL_CURRENCY} = {:.2} {code}", 1000.0 / rate));
    out
}

pub fn format_history(code: &str, days: i64, entries: &[HistoryEntry]) -> String {
    let title = ui::style_text(
        &format!("Exchange rate history for {code} (last {days} days)"),
        StyleType::Title,
    );
    if entries.is_empty() {
        return format!(
            "{title}\n{}",
            ui::style_text("No historical data available yet", StyleType::Subtle)
        );
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell(&format!("Rate ({LOCAL_CURRENCY})")),
        ui::header_cell("Table"),
    ]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.date.format("%Y-%m-%d")),
            ui::rate_cell(entry.rate),
            Cell::new(&entry.table_number),
        ]);
    }
    format!("{title}\n{table}")
}

pub async fn display_rate(service: &RateCacheService, code: &str) -> Result<()> {
    let rate = service.get_current_rate_for_client(code, Some("cli")).await?;
    println!("{}", format_rate(&code.to_uppercase(), rate));
    Ok(())
}

pub async fn display_history(service: &RateCacheService, code: &str, days: i64) -> Result<()> {
    let entries = service.get_exchange_rate_history(code, days).await?;
    println!(
        "{}",
        format_history(&code.to_uppercase(), days, &entries)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_rate_contains_conversions() {
        let text = console::strip_ansi_codes(&format_rate("EUR", 4.0)).to_string();
        assert!(text.contains("1 EUR = 4.0000 PLN"), "{text}");
        assert!(text.contains("100 EUR = 400.00 PLN"), "{text}");
        assert!(text.contains("1000 PLN = 250.00 EUR"), "{text}");
    }

    #[test]
    fn test_format_history_rows() {
        let entries = vec![HistoryEntry {
            date: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
            rate: 3.9876,
            table_number: "048/A/NBP/2024".to_string(),
        }];
        let text = console::strip_ansi_codes(&format_history("USD", 5, &entries)).to_string();
        assert!(text.contains("2024-03-08"));
        assert!(text.contains("3.9876"));
        assert!(text.contains("048/A/NBP/2024"));

        let empty = console::strip_ansi_codes(&format_history("USD", 5, &[])).to_string();
        assert!(empty.contains("No historical data available yet"));
    }
}
