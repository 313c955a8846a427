//! Shared helpers for integration tests (sessions and ping fixtures).

#![allow(dead_code)]

use std::sync::Arc;

use moztelemetry::engine::write_group;
use moztelemetry::{
    InMemoryEngine, LocalEngine, PartitionSchema, Record, SourceConfig, TelemetrySession,
};
use serde_json::{Value as JsonValue, json};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

pub const DIMENSIONS: [&str; 4] = ["submissionDate", "docType", "appName", "appUpdateChannel"];

/// The `telemetry` source used by every fixture.
pub fn telemetry_source() -> SourceConfig {
    SourceConfig::new("telemetry", "telemetry-bucket", "telemetry-2")
        .with_schema(PartitionSchema::from_fields(DIMENSIONS))
}

pub fn rec(v: JsonValue) -> Record {
    v.as_object().cloned().unwrap()
}

fn ping(client: &str, build: &str, sessions: i64) -> Record {
    rec(json!({
        "clientId": client,
        "environment": {"build": {"buildId": build}},
        "payload": {"info": {"subsessionLength": sessions}}
    }))
}

/// Four record groups as `(partition values, records)`, sorted by partition path.
pub fn fixture_groups() -> Vec<([&'static str; 4], Vec<Record>)> {
    vec![
        (
            ["20160101", "crash", "Firefox", "release"],
            vec![ping("c", "20151231", 1)],
        ),
        (
            ["20160101", "main", "Firefox", "nightly"],
            vec![ping("a", "20160101", 10), ping("b", "20151230", 20)],
        ),
        (
            ["20160102", "main", "Fennec", "nightly"],
            vec![ping("e", "20160102", 5)],
        ),
        (
            ["20160102", "main", "Firefox", "release"],
            vec![ping("a", "20160101", 30), ping("d", "20160102", 40)],
        ),
    ]
}

/// Group key the in-memory engine uses for a fixture group.
pub fn group_key(parts: &[&str; 4]) -> String {
    format!("telemetry-bucket/telemetry-2/{}/part-0.json", parts.join("/"))
}

pub fn memory_engine() -> Arc<InMemoryEngine> {
    let mut engine = InMemoryEngine::new();
    for (parts, records) in fixture_groups() {
        let dims: Vec<(&str, &str)> = DIMENSIONS.iter().copied().zip(parts).collect();
        engine = engine.with_group("telemetry", &group_key(&parts), &dims, records);
    }
    Arc::new(engine)
}

/// Same groups written as JSON-lines files under a temporary root.
pub fn local_engine() -> (TempDir, Arc<LocalEngine>) {
    let dir = TempDir::new().unwrap();
    for (parts, records) in fixture_groups() {
        write_group(dir.path().join(group_key(&parts)), &records).unwrap();
    }
    let engine = Arc::new(LocalEngine::new(dir.path()));
    (dir, engine)
}

/// Route library logs to the test harness; `RUST_LOG=moztelemetry=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Create a TelemetrySession over `engine` with the fixture source registered.
pub fn session(engine: Arc<dyn moztelemetry::ScanEngine>) -> TelemetrySession {
    init_tracing();
    TelemetrySession::builder()
        .app_name("moztelemetry_tests")
        .engine(engine)
        .source(telemetry_source())
        .get_or_create()
}

/// Sorted `clientId`s of a record list.
pub fn client_ids(records: &[Record]) -> Vec<String> {
    let mut ids: Vec<String> = records
        .iter()
        .filter_map(|r| r.get("clientId").and_then(JsonValue::as_str))
        .map(str::to_string)
        .collect();
    ids.sort();
    ids
}
