// ABOUTME: Integration tests for the metadata file: creation, migration, and locking.
// ABOUTME: Uses temporary state directories; no container runtime needed.

use scon::error::{Error, ErrorKind};
use scon::metadata::{InstanceStatus, LockInfo, MetadataStore, SCHEMA_VERSION};
use scon::paths::StatePaths;
use std::fs;

fn store() -> (MetadataStore, StatePaths, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let paths = StatePaths::new(dir.path());
    (MetadataStore::new(&paths), paths, dir)
}

#[test]
fn first_load_writes_versioned_empty_document() {
    let (store, paths, _dir) = store();

    store.load().unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(paths.metadata()).unwrap()).unwrap();
    assert_eq!(raw["version"], SCHEMA_VERSION);
    assert_eq!(raw["containers"], serde_json::json!([]));
    assert_eq!(raw["archived"], serde_json::json!([]));
}

#[test]
fn legacy_array_is_migrated_and_saved_in_new_layout() {
    let (store, paths, _dir) = store();
    fs::write(
        paths.metadata(),
        r#"[
            {
                "name": "db",
                "image": "postgres:16",
                "original_image": "postgres:16",
                "history": [
                    {"container_id": "aaa", "timestamp": "2024-03-01T08:00:00", "image": "postgres:16"},
                    {"container_id": "aaa", "timestamp": "2024-03-01T09:00:00", "image": "db:v1"}
                ]
            }
        ]"#,
    )
    .unwrap();

    let doc = store.load().unwrap();
    let db = &doc.containers[0];
    assert_eq!(db.name.as_str(), "db");
    assert_eq!(db.containers[0].status, InstanceStatus::Stopped);
    assert_eq!(db.snapshots[0].name, "db:v1");
    assert_eq!(db.next_snapshot_to_start.as_deref(), Some("db:v1"));
    assert_eq!(doc.next_snapshot_version(&db.name), 2);

    store.save(&doc).unwrap();
    let raw = fs::read_to_string(paths.metadata()).unwrap();
    assert!(raw.trim_start().starts_with('{'));
    assert!(raw.contains("nextSnapshotToStart"));
    assert_eq!(store.load().unwrap(), doc);
}

#[test]
fn corrupt_file_is_a_storage_error() {
    let (store, paths, _dir) = store();
    fs::write(paths.metadata(), "{not json").unwrap();

    let err = store.load().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[test]
fn future_version_is_refused() {
    let (store, paths, _dir) = store();
    fs::write(paths.metadata(), r#"{"version": 2, "containers": []}"#).unwrap();

    let err = store.load().unwrap_err();
    assert!(matches!(err, Error::UnsupportedVersion { found: 2, .. }));
}

#[test]
fn lock_file_records_holder_and_is_removed_on_drop() {
    let (store, paths, _dir) = store();

    let lock = store.lock("stop").unwrap();
    let info: LockInfo =
        serde_json::from_str(&fs::read_to_string(paths.lock()).unwrap()).unwrap();
    assert_eq!(info.operation, "stop");
    assert_eq!(info.pid, std::process::id());

    let err = store.lock("start").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    drop(lock);
    assert!(!paths.lock().exists());
    store.lock("start").unwrap().release().unwrap();
}
