use super::ui::{self, StyleType};
use crate::core::rate::{CurrencyInfo, QueryLogEntry};
use crate::service::RateCacheService;
use anyhow::Result;
use comfy_table::Cell;

pub fn format_currencies(currencies: &[CurrencyInfo]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Common"),
    ]);
    for currency in currencies {
        table.add_row(vec![
            Cell::new(&currency.currency_code),
            Cell::new(&currency.currency_name),
            if currency.is_common {
                Cell::new("yes")
            } else {
                ui::subtle_cell("no")
            },
        ]);
    }
    format!(
        "{}\n{table}",
        ui::style_text("Available currencies", StyleType::Title)
    )
}

pub fn format_queries(queries: &[QueryLogEntry]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Time (UTC)"),
        ui::header_cell("Code"),
        ui::header_cell("Source"),
        ui::header_cell("Client"),
    ]);
    for query in queries {
        table.add_row(vec![
            Cell::new(query.query_time.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&query.currency_code),
            Cell::new(if query.was_from_cache { "cache" } else { "provider" }),
            query
                .client_info
                .as_deref()
                .map_or_else(|| ui::subtle_cell("unknown"), Cell::new),
        ]);
    }
    format!(
        "{}\n{table}",
        ui::style_text("Recent rate queries", StyleType::Title)
    )
}

pub async fn display_currencies(service: &RateCacheService) -> Result<()> {
    let currencies = service.get_available_currencies().await;
    println!("{}", format_currencies(&currencies));
    Ok(())
}

pub async fn display_queries(service: &RateCacheService, count: usize) -> Result<()> {
    let queries = service.recent_queries(count).await;
    println!("{}", format_queries(&queries));
    Ok(())
}
