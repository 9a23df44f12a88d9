//! Tests for layered configuration loading

use std::io::Write;

use serial_test::serial;
use tempfile::NamedTempFile;

use surfe_diem::config::Config;

const OVERRIDES: &[&str] = &[
    "SURFE_API_KEY",
    "SURFE_BATCH_CONCURRENCY",
    "SURFE_BIND_ADDRESS",
    "SURFE_FORECAST_TTL",
    "DATABASE_URL",
];

fn clear_env() {
    for name in OVERRIDES {
        std::env::remove_var(name);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_load_from_file() {
    clear_env();
    let file = write_config(
        r#"
        [server]
        bind_address = "127.0.0.1:9100"
        api_key = "from-file"

        [batch]
        max_concurrent_fetches = 4
        request_deadline_secs = 20
        "#,
    );

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.server.bind_address.port(), 9100);
    assert_eq!(config.server.api_key.as_deref(), Some("from-file"));
    assert_eq!(config.batch.max_concurrent_fetches, 4);
    assert_eq!(config.cache.forecast_ttl_secs, 900);
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let file = write_config(
        r#"
        [cache]
        forecast_ttl_secs = 60
        "#,
    );

    std::env::set_var("SURFE_FORECAST_TTL", "120");
    std::env::set_var("SURFE_API_KEY", "from-env");
    std::env::set_var("DATABASE_URL", "postgres://surf:surf@db:5432/surfe");

    let config = Config::load(Some(file.path()));
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.cache.forecast_ttl_secs, 120);
    assert_eq!(config.server.api_key.as_deref(), Some("from-env"));
    assert_eq!(config.database.postgres_url, "postgres://surf:surf@db:5432/surfe");
}

#[test]
#[serial]
fn test_invalid_env_value_is_an_error() {
    clear_env();
    std::env::set_var("SURFE_BATCH_CONCURRENCY", "lots");
    let result = Config::from_env();
    clear_env();

    let err = result.unwrap_err().to_string();
    assert!(err.contains("SURFE_BATCH_CONCURRENCY"));
}

#[test]
#[serial]
fn test_validation_runs_after_overrides() {
    clear_env();
    std::env::set_var("SURFE_BATCH_CONCURRENCY", "0");
    let result = Config::load(None);
    clear_env();

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_malformed_file_reports_path() {
    clear_env();
    let file = write_config("[server\nbind_address = ");

    let err = Config::load(Some(file.path())).unwrap_err();
    assert!(format!("{err:#}").contains(&file.path().display().to_string()));
}
