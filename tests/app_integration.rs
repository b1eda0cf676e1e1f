use chrono::{Duration, NaiveDate, Utc};
use std::fs;
use std::sync::Arc;
use tracing::info;
use xfx::core::RateError;
use xfx::core::store::RateStore;
use xfx::providers::NbpProvider;
use xfx::service::{RateCacheService, ServiceSettings};
use xfx::store::memory::MemoryRateStore;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Mounts a GET mock that must be hit exactly `expected_calls` times.
    pub async fn mount_nbp(server: &MockServer, url_path: &str, body: &str, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    pub fn rates_body(code: &str, rates: &[(String, f64, String)]) -> String {
        let rates: Vec<String> = rates
            .iter()
            .map(|(date, mid, no)| {
                format!(r#"{{"no":"{no}","effectiveDate":"{date}","mid":{mid}}}"#)
            })
            .collect();
        format!(
            r#"{{"table":"A","currency":"test","code":"{code}","rates":[{}]}}"#,
            rates.join(",")
        )
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn service_for(
    server: &wiremock::MockServer,
    store: Arc<MemoryRateStore>,
) -> RateCacheService {
    let provider = NbpProvider::new(&server.uri(), std::time::Duration::from_secs(5)).unwrap();
    RateCacheService::new(store, Arc::new(provider), ServiceSettings::default()).await
}

#[test_log::test(tokio::test)]
async fn test_current_rate_is_fetched_once_then_cached() {
    let server = wiremock::MockServer::start().await;
    let body = test_utils::rates_body(
        "EUR",
        &[(
            today().format("%Y-%m-%d").to_string(),
            4.3210,
            "050/A/NBP/2024".to_string(),
        )],
    );
    test_utils::mount_nbp(&server, "/api/exchangerates/rates/a/eur/", &body, 1).await;

    let store = Arc::new(MemoryRateStore::new());
    let service = service_for(&server, store.clone()).await;

    // Empty store: one provider call, one new record
    let rate = service.get_current_rate("EUR").await.unwrap();
    info!(?rate, "First EUR query");
    assert_eq!(rate, 4.3210);
    assert_eq!(store.record_count().await, 1);

    // Repeat: served from the store
    assert_eq!(service.get_current_rate("EUR").await.unwrap(), 4.3210);
    assert_eq!(store.record_count().await, 1);

    server.verify().await;
}

#[test_log::test(tokio::test)]
async fn test_history_is_fetched_once_and_served_from_store() {
    let server = wiremock::MockServer::start().await;
    let points: Vec<_> = (0..5)
        .rev()
        .map(|offset| {
            (
                (today() - Duration::days(offset))
                    .format("%Y-%m-%d")
                    .to_string(),
                3.95 + offset as f64 / 100.0,
                format!("{:03}/A/NBP/2024", 100 - offset),
            )
        })
        .collect();
    let body = test_utils::rates_body("USD", &points);
    test_utils::mount_nbp(&server, "/api/exchangerates/rates/a/usd/last/5/", &body, 1).await;

    let store = Arc::new(MemoryRateStore::new());
    let service = service_for(&server, store.clone()).await;

    let history = service.get_exchange_rate_history("USD", 5).await.unwrap();
    assert_eq!(history.len(), 5);
    assert_eq!(store.record_count().await, 5);
    assert!(history.windows(2).all(|w| w[0].date > w[1].date));
    assert_eq!(history[0].date, today());
    assert_eq!(history[0].table_number, "100/A/NBP/2024");

    let recent = service.get_exchange_rate_history("USD", 3).await.unwrap();
    assert_eq!(recent, history[..3].to_vec());

    // Unchanged upstream data: same answer without another call
    let again = service.get_exchange_rate_history("USD", 5).await.unwrap();
    assert_eq!(again, history);

    server.verify().await;
}

#[test_log::test(tokio::test)]
async fn test_unknown_currency_is_not_found() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/api/exchangerates/rates/a/xyz/"))
        .respond_with(wiremock::ResponseTemplate::new(404).set_body_string("404 NotFound"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryRateStore::new());
    let service = service_for(&server, store.clone()).await;

    let err = service.get_current_rate("XYZ").await.unwrap_err();
    assert!(matches!(err, RateError::NotFound(_)), "{err:?}");
    assert!(store.latest_for("XYZ").await.unwrap().is_none());
    // Unseen codes only join the catalog once a rate was observed
    assert_eq!(service.get_available_currencies().await.len(), 10);
}

#[test_log::test(tokio::test)]
async fn test_invalid_input_never_reaches_provider() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::any())
        .respond_with(wiremock::ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryRateStore::new());
    let service = service_for(&server, store).await;

    assert!(matches!(
        service.get_current_rate("EU").await,
        Err(RateError::Validation(_))
    ));
    assert!(matches!(
        service.get_history("HISTORY", 5).await,
        Err(RateError::Validation(_))
    ));
    assert!(matches!(
        service.get_history("EUR", 0).await,
        Err(RateError::Validation(_))
    ));
    assert!(matches!(
        service.get_history("EUR", 31).await,
        Err(RateError::Validation(_))
    ));

    server.verify().await;
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let server = wiremock::MockServer::start().await;
    let body = test_utils::rates_body(
        "GBP",
        &[(
            today().format("%Y-%m-%d").to_string(),
            5.0123,
            "050/A/NBP/2024".to_string(),
        )],
    );
    test_utils::mount_nbp(&server, "/api/exchangerates/rates/a/gbp/", &body, 1).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_path = config_file.path();
    let config_content = format!(
        r#"
        provider:
          nbp:
            base_url: {}
          timeout_secs: 5
        store:
          backend: memory
    "#,
        server.uri()
    );
    fs::write(config_path, &config_content).expect("Failed to write config file");

    let result = xfx::run_command(
        xfx::AppCommand::Rate {
            code: "gbp".to_string(),
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Main function failed with: {:?}",
        result.err()
    );

    let result = xfx::run_command(
        xfx::AppCommand::History {
            code: "HISTORY".to_string(),
            days: 5,
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("not a valid currency code"), "{err}");

    server.verify().await;
}

#[test_log::test(tokio::test)]
async fn test_disk_store_flow_with_mock() {
    let server = wiremock::MockServer::start().await;
    let body = test_utils::rates_body(
        "CHF",
        &[(
            today().format("%Y-%m-%d").to_string(),
            4.5,
            "050/A/NBP/2024".to_string(),
        )],
    );
    test_utils::mount_nbp(&server, "/api/exchangerates/rates/a/chf/", &body, 1).await;

    let data_dir = tempfile::TempDir::new().unwrap();
    let config: xfx::core::config::AppConfig = serde_yaml::from_str(&format!(
        r#"
        provider:
          nbp:
            base_url: {}
        store:
          backend: disk
        data_path: "{}"
    "#,
        server.uri(),
        data_dir.path().display()
    ))
    .unwrap();

    let service = xfx::build_service(&config).await.unwrap();
    assert_eq!(service.get_current_rate("CHF").await.unwrap(), 4.5);
    assert_eq!(service.get_current_rate("CHF").await.unwrap(), 4.5);

    let queries = service.recent_queries(10).await;
    assert_eq!(queries.len(), 2);
    assert!(queries[0].was_from_cache);
    assert!(!queries[1].was_from_cache);

    server.verify().await;
}
