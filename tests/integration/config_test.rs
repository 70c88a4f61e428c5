//! Configuration file integration tests.

use sqlquery_collector::config::CollectorConfig;
use sqlquery_collector::db::DatabaseBackend;
use std::io::Write;
use std::path::Path;

#[test]
fn test_load_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
measurement = "inventory"
server_url = "sqlite:///var/lib/inventory.db"
queries = ["SELECT location, used_count FROM inventory"]
tag_cols = ["location"]
int_fields = ["used_count"]
"#
    )
    .unwrap();

    let config = CollectorConfig::load_from_file(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.measurement, "inventory");
    assert_eq!(config.backend().unwrap(), DatabaseBackend::Sqlite);

    let run = config.to_run_config();
    assert_eq!(run.queries.len(), 1);
    assert!(run.tag_columns.contains("location"));
    assert!(run.int_columns.contains("used_count"));
}

#[test]
fn test_missing_file_yields_defaults() {
    let config =
        CollectorConfig::load_from_file(Path::new("/nonexistent/sqlquery/config.toml")).unwrap();
    assert_eq!(config.measurement, "sqlquery");
    assert!(config.queries.is_empty());
}

#[test]
fn test_invalid_toml_names_the_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "queries = \"not a list\"").unwrap();

    let err = CollectorConfig::load_from_file(file.path()).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Configuration error"));
    assert!(message.contains(&file.path().display().to_string()));
}
