//! Query runner integration tests.
//!
//! Drives full polling cycles against scripted executors.

use pretty_assertions::assert_eq;
use sqlquery_collector::db::{MockExecutor, MockResult};
use sqlquery_collector::error::{CollectorError, DecodeErrorKind};
use sqlquery_collector::metrics::MetricRecord;
use sqlquery_collector::query::{run, RunConfig};
use sqlquery_collector::sink::{CollectingSink, LineProtocolSink};

fn inventory_result() -> MockResult {
    MockResult::new(&["location", "used_count", "status"])
        .with_row(&[Some("us-east"), Some("42"), Some("ok")])
        .with_row(&[None, Some("7"), None])
}

fn inventory_config(queries: &[&str]) -> RunConfig {
    RunConfig::new("sqlquery", queries.iter().map(|q| q.to_string()).collect())
        .with_tag_columns(["location"])
        .with_int_columns(["used_count"])
}

/// Scenario: Mixed tag, integer and string columns with NULLs
/// Given a query returning location, used_count and status
/// When one polling cycle runs
/// Then each row becomes one record
/// And NULL cells are left out of the record
#[tokio::test]
async fn test_end_to_end_scenario() {
    let executor = MockExecutor::new().with_result("SELECT * FROM inventory", inventory_result());
    let config = inventory_config(&["SELECT * FROM inventory"]);
    let mut sink = CollectingSink::new();

    let summary = run(&config, &executor, &mut sink).await.unwrap();

    assert_eq!(summary.records, 2);
    assert_eq!(
        sink.into_records(),
        vec![
            (
                "sqlquery".to_string(),
                MetricRecord::new()
                    .with_tag("location", "us-east")
                    .with_field("used_count", 42i64)
                    .with_field("status", "ok"),
            ),
            (
                "sqlquery".to_string(),
                MetricRecord::new().with_field("used_count", 7i64),
            ),
        ]
    );
}

/// Scenario: Rows arrive at the sink in result order
#[tokio::test]
async fn test_streaming_order_preserved() {
    let executor = MockExecutor::new().with_result(
        "q",
        MockResult::new(&["seq"])
            .with_row(&[Some("r1")])
            .with_row(&[Some("r2")])
            .with_row(&[Some("r3")]),
    );
    let config = RunConfig::new("m", vec!["q".to_string()]);
    let mut sink = CollectingSink::new();

    run(&config, &executor, &mut sink).await.unwrap();

    let seqs: Vec<String> = sink
        .records()
        .iter()
        .map(|(_, record)| record.fields["seq"].to_string())
        .collect();
    assert_eq!(seqs, vec!["r1", "r2", "r3"]);
}

/// Scenario: The second of two queries fails to execute
/// Given a first query that succeeds and a second that fails
/// When one polling cycle runs
/// Then the second query's error is returned
/// And every row of the first query already reached the sink
#[tokio::test]
async fn test_multi_query_sequencing() {
    let executor = MockExecutor::new()
        .with_result("first", inventory_result())
        .with_error("second", "relation \"missing\" does not exist")
        .with_result("third", inventory_result());
    let config = inventory_config(&["first", "second", "third"]);
    let mut sink = CollectingSink::new();

    let err = run(&config, &executor, &mut sink).await.unwrap_err();

    assert!(matches!(err, CollectorError::Query(_)));
    assert!(err.to_string().contains("relation \"missing\" does not exist"));
    assert_eq!(sink.records().len(), 2);
    assert_eq!(executor.executed_queries(), vec!["first", "second"]);
    assert_eq!(executor.opened_cursors(), executor.closed_cursors());
}

/// Scenario: A typed-numeric cell holds non-integer text
/// Then the run stops with a decode error naming the column and text
/// And no record is emitted for the bad row or anything after it
#[tokio::test]
async fn test_bad_numeric_text_stops_the_run() {
    let executor = MockExecutor::new()
        .with_result(
            "q1",
            MockResult::new(&["location", "used_count"])
                .with_row(&[Some("a"), Some("1")])
                .with_row(&[Some("b"), Some("12.5")])
                .with_row(&[Some("c"), Some("3")]),
        )
        .with_result("q2", inventory_result());
    let config = inventory_config(&["q1", "q2"]);
    let mut sink = CollectingSink::new();

    let err = run(&config, &executor, &mut sink).await.unwrap_err();

    let decode = match err {
        CollectorError::Decode(decode) => decode,
        other => panic!("expected a decode error, got {other:?}"),
    };
    assert_eq!(decode.kind, DecodeErrorKind::NumericParse);
    assert_eq!(decode.column, "used_count");
    assert_eq!(decode.raw_text, "12.5");

    assert_eq!(sink.records().len(), 1);
    assert_eq!(executor.executed_queries(), vec!["q1"]);
    assert_eq!(executor.closed_cursors(), 1);
}

/// Scenario: Column roles are derived per query
/// Given two queries whose results have different column layouts
/// Then each query is classified against its own column names
#[tokio::test]
async fn test_classification_is_per_query() {
    let executor = MockExecutor::new()
        .with_result(
            "a",
            MockResult::new(&["used_count", "location"]).with_row(&[Some("5"), Some("eu")]),
        )
        .with_result(
            "b",
            MockResult::new(&["status", "used_count"]).with_row(&[Some("ok"), Some("6")]),
        );
    let config = inventory_config(&["a", "b"]);
    let mut sink = CollectingSink::new();

    run(&config, &executor, &mut sink).await.unwrap();

    let records: Vec<MetricRecord> = sink.into_records().into_iter().map(|(_, r)| r).collect();
    assert_eq!(
        records,
        vec![
            MetricRecord::new()
                .with_tag("location", "eu")
                .with_field("used_count", 5i64),
            MetricRecord::new()
                .with_field("status", "ok")
                .with_field("used_count", 6i64),
        ]
    );
}

/// Scenario: A row where every cell is NULL
/// Then the runner still emits a record with no fields
#[tokio::test]
async fn test_all_null_row_is_emitted() {
    let executor = MockExecutor::new().with_result(
        "q",
        MockResult::new(&["location", "used_count"]).with_row(&[None, None]),
    );
    let config = inventory_config(&["q"]);
    let mut sink = CollectingSink::new();

    run(&config, &executor, &mut sink).await.unwrap();

    assert_eq!(sink.records().len(), 1);
    assert_eq!(sink.records()[0].1, MetricRecord::new());
}

/// Scenario: The measurement name is constant for the whole run
#[tokio::test]
async fn test_measurement_is_constant() {
    let executor = MockExecutor::new()
        .with_result("a", inventory_result())
        .with_result("b", inventory_result());
    let config = RunConfig::new("oracle_usage", vec!["a".to_string(), "b".to_string()]);
    let mut sink = CollectingSink::new();

    run(&config, &executor, &mut sink).await.unwrap();

    assert_eq!(sink.records().len(), 4);
    assert!(sink.records().iter().all(|(name, _)| name == "oracle_usage"));
}

/// Scenario: Runs do not share state
/// Given the same executor and configuration
/// When two polling cycles run back to back
/// Then both produce identical records
#[tokio::test]
async fn test_successive_runs_are_independent() {
    let executor = MockExecutor::new().with_result("q", inventory_result());
    let config = inventory_config(&["q"]);

    let mut first = CollectingSink::new();
    let mut second = CollectingSink::new();
    run(&config, &executor, &mut first).await.unwrap();
    run(&config, &executor, &mut second).await.unwrap();

    assert_eq!(first.records(), second.records());
    assert_eq!(executor.closed_cursors(), 2);
}

/// Scenario: Line protocol output of a run
/// Then the all-NULL-fields record is dropped by the sink, not the runner
#[tokio::test]
async fn test_line_protocol_output() {
    let executor = MockExecutor::new().with_result(
        "q",
        MockResult::new(&["location", "used_count", "status"])
            .with_row(&[Some("us-east"), Some("42"), Some("ok")])
            .with_row(&[Some("us-west"), None, None]),
    );
    let config = inventory_config(&["q"]);
    let mut sink = LineProtocolSink::new(Vec::new()).with_clock(|| 1);

    let summary = run(&config, &executor, &mut sink).await.unwrap();

    assert_eq!(summary.records, 2);
    let out = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(
        out,
        "sqlquery,location=us-east status=\"ok\",used_count=42i 1\n"
    );
}
