//! End-to-end tests of one invocation: an S3 notification read from disk,
//! objects served from a local directory, items captured in memory.
mod common;

use common::ndjson_lines;
use s3ddb::cli::run::read_event;
use s3ddb::cli::{build_controller, invoke, InvocationError};
use s3ddb::config::Config;
use s3ddb::pipeline::IngestError;
use s3ddb::store::{LocalObjectReader, MemoryTable};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn put_object(root: &Path, bucket: &str, key: &str, body: &str) {
    let path = root.join(bucket).join(key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, body).unwrap();
}

fn config() -> Config {
    let mut config = Config::default();
    config.table.name = "Readings".to_string();
    config
}

#[tokio::test]
async fn test_event_file_is_loaded_into_table() {
    let root = TempDir::new().unwrap();
    put_object(
        root.path(),
        "telemetry",
        "daily/site one/2023-01-01.json",
        &(ndjson_lines(30).join("\n") + "\n"),
    );
    put_object(
        root.path(),
        "telemetry",
        "daily/site+two/2023-01-01.json",
        "{\"DeviceId\":\"solo\",\"StatusTime\":\"2023-06-01T12:00:00.250Z\"}",
    );

    let event = read_event(&fixture("s3-put-event.json")).unwrap();
    let table = Arc::new(MemoryTable::new());
    let controller = build_controller(
        &config(),
        Arc::new(LocalObjectReader::new(root.path())),
        table.clone(),
    )
    .unwrap();

    let response = invoke(&controller, &event).await.unwrap();

    assert_eq!(response.message, "Processed 2 file(s)");
    assert_eq!(response.outcome.items, 31);
    assert_eq!(response.outcome.batches, 3);

    let written = table.items("Readings");
    assert_eq!(written.len(), 31);
    let solo = written
        .iter()
        .find(|item| item.get("DeviceId") == Some(&json!("solo")))
        .unwrap();
    assert_eq!(solo.get("StatusTime"), Some(&json!(1_685_620_800_250i64)));
}

#[tokio::test]
async fn test_response_serializes_with_message() {
    let root = TempDir::new().unwrap();
    put_object(root.path(), "telemetry", "daily/site one/2023-01-01.json", "");
    put_object(root.path(), "telemetry", "daily/site+two/2023-01-01.json", "\n\n");

    let event = read_event(&fixture("s3-put-event.json")).unwrap();
    let controller = build_controller(
        &config(),
        Arc::new(LocalObjectReader::new(root.path())),
        Arc::new(MemoryTable::new()),
    )
    .unwrap();

    let response = invoke(&controller, &event).await.unwrap();

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "message": "Processed 2 file(s)",
            "locations": 2,
            "batches": 0,
            "items": 0,
            "attempts": 0
        })
    );
}

#[tokio::test]
async fn test_missing_object_fails_invocation() {
    let root = TempDir::new().unwrap();
    put_object(
        root.path(),
        "telemetry",
        "daily/site one/2023-01-01.json",
        &ndjson_lines(3).join("\n"),
    );

    let event = read_event(&fixture("s3-put-event.json")).unwrap();
    let table = Arc::new(MemoryTable::new());
    let controller = build_controller(
        &config(),
        Arc::new(LocalObjectReader::new(root.path())),
        table.clone(),
    )
    .unwrap();

    let err = invoke(&controller, &event).await.unwrap_err();

    match err {
        InvocationError::Ingest(IngestError::Read { location, .. }) => {
            assert_eq!(location.key, "daily/site+two/2023-01-01.json");
        }
        other => panic!("expected read failure, got {:?}", other),
    }
    // The readable object was still written
    assert_eq!(table.items("Readings").len(), 3);
}

#[tokio::test]
async fn test_key_attributes_are_required() {
    let root = TempDir::new().unwrap();
    put_object(
        root.path(),
        "telemetry",
        "daily/site one/2023-01-01.json",
        "{\"DeviceId\":\"a\",\"StatusTime\":\"2023-01-01T00:00:00Z\"}\n{\"StatusTime\":\"2023-01-01T00:00:01Z\"}\n",
    );
    put_object(root.path(), "telemetry", "daily/site+two/2023-01-01.json", "");

    let mut config = config();
    config.transform.key_attributes = vec!["DeviceId".to_string()];

    let event = read_event(&fixture("s3-put-event.json")).unwrap();
    let table = Arc::new(MemoryTable::new());
    let controller = build_controller(
        &config,
        Arc::new(LocalObjectReader::new(root.path())),
        table.clone(),
    )
    .unwrap();

    let err = invoke(&controller, &event).await.unwrap_err();

    match err {
        InvocationError::Ingest(IngestError::Malformed { source, .. }) => {
            assert_eq!(source.line_index, 1);
        }
        other => panic!("expected malformed record, got {:?}", other),
    }
    assert!(table.items("Readings").is_empty());
}

#[test]
fn test_unreadable_event_file() {
    let err = read_event(&fixture("does-not-exist.json")).unwrap_err();
    assert!(err.to_string().contains("does-not-exist.json"));
}
