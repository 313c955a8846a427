//! Error taxonomy: configuration, predicate and materialization failures.

mod common;

use std::sync::Arc;

use common::{DIMENSIONS, group_key, memory_engine, rec, session, telemetry_source};
use moztelemetry::prelude::*;
use serde_json::json;

#[test]
fn malformed_predicates_fail_at_where() {
    let ds = session(memory_engine()).dataset("telemetry").unwrap();
    let cases = [
        ds.where_eq("docType", json!({"nested": true})),
        ds.where_range("submissionDate", "20160131", "20160101"),
        ds.where_in("docType", [json!(["main"])]),
        ds.where_eq("", "main"),
    ];
    for result in cases {
        match result {
            Err(DatasetError::Predicate(e)) => assert!(!e.message.is_empty()),
            other => panic!("expected predicate error, got {other:?}"),
        }
    }
}

#[test]
fn custom_predicate_error_on_dimension_is_a_predicate_error() {
    let ds = session(memory_engine())
        .dataset("telemetry")
        .unwrap()
        .where_fn("docType", |_| Err("lookup table unavailable".to_string()))
        .unwrap();
    let err = ds.summaries().unwrap_err();
    match err {
        DatasetError::Predicate(e) => {
            assert_eq!(e.field, "docType");
            assert!(e.message.contains("lookup table unavailable"));
        }
        other => panic!("expected predicate error, got {other:?}"),
    }
}

#[test]
fn custom_predicate_error_on_record_field_surfaces_from_records() {
    let ds = session(memory_engine())
        .dataset("telemetry")
        .unwrap()
        .where_fn("clientId", |v| match v.as_str() {
            Some("b") => Err("client b is quarantined".to_string()),
            _ => Ok(true),
        })
        .unwrap();
    let items: Vec<_> = ds.records().unwrap().collect();
    let last = items.last().unwrap();
    assert!(matches!(last, Err(DatasetError::Predicate(_))));
    assert_eq!(items.iter().filter(|r| r.is_err()).count(), 1);
}

#[test]
fn unreadable_group_is_a_materialization_error() {
    let bad = ["20160101", "main", "Firefox", "nightly"];
    let engine = InMemoryEngine::new()
        .with_group(
            "telemetry",
            &group_key(&bad),
            &DIMENSIONS.iter().copied().zip(bad).collect::<Vec<_>>(),
            vec![rec(json!({"clientId": "a"}))],
        )
        .with_failing_group(&group_key(&bad));
    let ds = session(Arc::new(engine)).dataset("telemetry").unwrap();
    let mut records = ds.records().unwrap();
    let first = records.next().unwrap();
    match first {
        Err(err) => assert!(err.is_materialization()),
        Ok(r) => panic!("expected failure, got {r:?}"),
    }
    assert!(records.next().is_none());
    assert!(ds.dataframe().unwrap_err().is_materialization());
}

#[test]
fn missing_source_in_engine_is_a_materialization_error() {
    let ds = Dataset::from_source(
        Arc::new(InMemoryEngine::new()),
        telemetry_source(),
    )
    .unwrap();
    let err = ds.summaries().unwrap_err();
    assert!(matches!(
        err,
        DatasetError::Materialization(EngineError::NotFound(_))
    ));
}

#[test]
fn configuration_error_names_missing_fields() {
    let err = Dataset::from_source(
        memory_engine(),
        SourceConfig::new("telemetry", "", ""),
    )
    .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("bucket"));
    assert!(msg.contains("prefix"));
}
