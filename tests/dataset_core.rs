//! Dataset behaviour against in-memory and filesystem engines.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{client_ids, group_key, local_engine, memory_engine, session};
use moztelemetry::prelude::*;
use serde_json::json;

fn telemetry() -> Dataset {
    session(memory_engine()).dataset("telemetry").unwrap()
}

fn keys(summaries: &[Summary]) -> Vec<String> {
    summaries.iter().map(|s| s.key.clone()).collect()
}

#[test]
fn where_does_not_modify_receiver() {
    let all = telemetry();
    let main = all.where_eq("docType", "main").unwrap();
    assert!(all.criteria().is_empty());
    assert_eq!(all.summaries().unwrap().len(), 4);
    assert_eq!(main.summaries().unwrap().len(), 3);
    let _ = all.select(Selection::fields(["clientId"])).limit(1);
    assert_eq!(all.selection(), &Selection::All);
}

#[test]
fn repeated_where_is_idempotent() {
    let once = telemetry().where_eq("docType", "main").unwrap();
    let twice = once.where_eq("docType", "main").unwrap();
    assert_eq!(keys(&once.summaries().unwrap()), keys(&twice.summaries().unwrap()));
    let a: Vec<Record> = once.collect().unwrap();
    let b: Vec<Record> = twice.collect().unwrap();
    assert_eq!(client_ids(&a), client_ids(&b));
}

#[test]
fn where_order_does_not_matter() {
    let ds = telemetry();
    let ab = ds
        .where_eq("docType", "main")
        .unwrap()
        .where_eq("appUpdateChannel", "nightly")
        .unwrap();
    let ba = ds
        .where_eq("appUpdateChannel", "nightly")
        .unwrap()
        .where_eq("docType", "main")
        .unwrap();
    assert_eq!(keys(&ab.summaries().unwrap()), keys(&ba.summaries().unwrap()));
    let a: Vec<Record> = ab.collect().unwrap();
    let b: Vec<Record> = ba.collect().unwrap();
    assert_eq!(client_ids(&a), vec!["a", "b", "e"]);
    assert_eq!(client_ids(&a), client_ids(&b));
}

#[test]
fn nonexistent_value_gives_empty_result() {
    let ds = telemetry().where_eq("docType", "nonexistent").unwrap();
    assert!(ds.summaries().unwrap().is_empty());
    assert_eq!(ds.records().unwrap().count(), 0);
    assert_eq!(ds.dataframe().unwrap().count(), 0);
}

#[test]
fn incomplete_source_is_a_configuration_error() {
    let err = Dataset::from_source(memory_engine(), SourceConfig::default()).unwrap_err();
    assert!(matches!(err, DatasetError::Configuration(_)));
    let err = session(memory_engine()).dataset("crash_stats").unwrap_err();
    assert!(matches!(err, DatasetError::Configuration(_)));
}

#[test]
fn records_read_exactly_the_summarized_groups() {
    let ds = telemetry().where_in("appName", ["Firefox"]).unwrap();
    let summarized: BTreeSet<String> = keys(&ds.summaries().unwrap()).into_iter().collect();
    let mut records = ds.records().unwrap();
    let n = records.by_ref().map(Result::unwrap).count();
    assert_eq!(n, 5);
    assert_eq!(records.groups_read(), &summarized);
}

#[test]
fn concurrency_hint_is_forwarded_and_does_not_change_results() {
    let engine = memory_engine();
    let ds = session(engine.clone()).dataset("telemetry").unwrap();
    let one: Vec<Record> = ds.max_concurrency(1).unwrap().collect().unwrap();
    let eight: Vec<Record> = ds.max_concurrency(8).unwrap().collect().unwrap();
    assert_eq!(client_ids(&one), client_ids(&eight));
    assert_eq!(engine.observed_hints(), vec![Some(1), Some(8)]);
}

#[test]
fn session_default_concurrency_applies_until_overridden() {
    let engine = memory_engine();
    let session = TelemetrySession::builder()
        .engine(engine.clone())
        .source(common::telemetry_source())
        .default_max_concurrency(3)
        .get_or_create();
    let ds = session.dataset("telemetry").unwrap();
    ds.records().unwrap().for_each(drop);
    ds.max_concurrency(5).unwrap().records().unwrap().for_each(drop);
    assert_eq!(engine.observed_hints(), vec![Some(3), Some(5)]);
}

#[test]
fn non_dimension_fields_filter_records() {
    let ds = telemetry()
        .where_eq("environment/build/buildId", "20160101")
        .unwrap();
    // All groups stay candidates; only records are filtered.
    assert_eq!(ds.summaries().unwrap().len(), 4);
    let rows: Vec<Record> = ds.collect().unwrap();
    assert_eq!(client_ids(&rows), vec!["a", "a"]);
}

#[test]
fn range_and_prefix_predicates() {
    let ds = telemetry()
        .where_([
            ("submissionDate", between("20160102", "20160131")),
            ("appName", starts_with("Fire")),
        ])
        .unwrap();
    let summaries = ds.summaries().unwrap();
    assert_eq!(
        keys(&summaries),
        vec![group_key(&["20160102", "main", "Firefox", "release"])]
    );
    let rows: Vec<Record> = ds
        .where_([("payload/info/subsessionLength", at_least(35))])
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(client_ids(&rows), vec!["d"]);
}

#[test]
fn select_reshapes_without_changing_count() {
    let ds = telemetry()
        .where_eq("docType", "main")
        .unwrap()
        .select(Selection::aliased([
            ("client", "clientId"),
            ("build", "environment/build/buildId"),
            ("missing", "payload/nope"),
        ]));
    let rows: Vec<Record> = ds.collect().unwrap();
    assert_eq!(rows.len(), 5);
    for row in &rows {
        assert_eq!(row.len(), 3);
        assert_eq!(row["missing"], json!(null));
    }
    let df = ds.dataframe().unwrap();
    assert_eq!(df.columns(), vec!["client", "build", "missing"]);
    assert_eq!(df.count(), 5);
}

#[test]
fn limit_caps_record_groups() {
    let ds = telemetry().limit(2);
    let summaries = ds.summaries().unwrap();
    assert_eq!(summaries.len(), 2);
    let mut records = ds.records().unwrap();
    let rows: Vec<Record> = records.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(records.groups_read().len(), 2);
    assert!(telemetry().limit(0).summaries().unwrap().is_empty());
}

#[test]
fn sample_is_reproducible_for_a_seed() {
    let ds = telemetry();
    let a = ds.sample(0.5, 42).unwrap().summaries().unwrap();
    let b = ds.sample(0.5, 42).unwrap().summaries().unwrap();
    assert_eq!(a.len(), 2);
    assert_eq!(keys(&a), keys(&b));
    assert_eq!(ds.sample(1.0, 7).unwrap().summaries().unwrap().len(), 4);
    assert!(ds.sample(0.0, 1).is_err());
    assert!(ds.sample(1.5, 1).is_err());
}

#[test]
fn dataframe_infers_column_types() {
    let df = telemetry()
        .select(Selection::aliased([
            ("clientId", "clientId"),
            ("length", "payload/info/subsessionLength"),
        ]))
        .dataframe()
        .unwrap();
    let pl = df.collect();
    assert_eq!(pl.height(), 6);
    assert_eq!(
        pl.column("length").unwrap().dtype(),
        &polars::prelude::DataType::Int64
    );
}

#[test]
fn local_engine_matches_memory_engine() {
    let (_dir, local) = local_engine();
    let local_ds = session(local).dataset("telemetry").unwrap();
    let memory_ds = telemetry();
    for ds in [&local_ds, &memory_ds] {
        assert_eq!(ds.summaries().unwrap().len(), 4);
    }
    let query = |ds: &Dataset| -> Vec<Record> {
        ds.where_eq("docType", "main")
            .unwrap()
            .where_eq("appUpdateChannel", "release")
            .unwrap()
            .collect()
            .unwrap()
    };
    assert_eq!(client_ids(&query(&local_ds)), vec!["a", "d"]);
    assert_eq!(client_ids(&query(&local_ds)), client_ids(&query(&memory_ds)));
    assert_eq!(
        keys(&local_ds.summaries().unwrap()),
        keys(&memory_ds.summaries().unwrap())
    );
}

#[test]
fn local_engine_results_do_not_depend_on_threads() {
    let (_dir, local) = local_engine();
    let ds = session(local).dataset("telemetry").unwrap();
    let one: Vec<Record> = ds.max_concurrency(1).unwrap().collect().unwrap();
    let eight: Vec<Record> = ds.max_concurrency(8).unwrap().collect().unwrap();
    assert_eq!(one.len(), 6);
    assert_eq!(client_ids(&one), client_ids(&eight));
}

#[test]
fn summaries_report_dimensions_and_size() {
    let summaries = telemetry().where_eq("docType", "crash").unwrap().summaries().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].dimensions["docType"], json!("crash"));
    assert_eq!(summaries[0].dimensions["submissionDate"], json!("20160101"));
    assert!(summaries[0].size > 0);
}

#[test]
fn collect_into_json_lines() {
    let lines: Vec<String> = telemetry()
        .where_eq("docType", "crash")
        .unwrap()
        .select(Selection::fields(["clientId"]))
        .collect()
        .unwrap();
    assert_eq!(lines, vec![r#"{"clientId":"c"}"#.to_string()]);
}

#[test]
fn engines_can_be_shared_between_sessions() {
    let engine = memory_engine();
    let shared: Arc<dyn ScanEngine> = engine.clone();
    let a = session(shared.clone()).dataset("telemetry").unwrap();
    let b = session(shared).dataset("telemetry").unwrap();
    assert_eq!(a.summaries().unwrap().len(), b.summaries().unwrap().len());
}

#[test]
fn local_records_are_read_after_the_terminal_call() {
    let (dir, local) = local_engine();
    let ds = session(local).dataset("telemetry").unwrap();
    let records = ds.max_concurrency(1).unwrap().records().unwrap();
    std::fs::remove_dir_all(dir.path().join("telemetry-bucket")).unwrap();
    let items: Vec<_> = records.collect();
    assert_eq!(items.len(), 1);
    assert!(items[0].as_ref().unwrap_err().is_materialization());
}

#[test]
fn empty_groups_count_as_read() {
    let (dir, local) = local_engine();
    let empty = ["20160103", "main", "Firefox", "release"];
    moztelemetry::engine::write_group(dir.path().join(group_key(&empty)), &[]).unwrap();
    let ds = session(local).dataset("telemetry").unwrap();
    let summarized: BTreeSet<String> = keys(&ds.summaries().unwrap()).into_iter().collect();
    assert_eq!(summarized.len(), 5);
    let mut records = ds.records().unwrap();
    assert_eq!(records.by_ref().map(Result::unwrap).count(), 6);
    assert_eq!(records.groups_read(), &summarized);
}
