// ABOUTME: Migration of older metadata layouts into the current schema.
// ABOUTME: Legacy files are a bare array of {name, image, original_image, history} entries.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use super::model::{
    ContainerInstance, InstanceStatus, MetadataDocument, SCHEMA_VERSION, SnapshotRecord,
    StatefulContainer,
};
use crate::error::{Error, Result};
use crate::types::{ContainerId, ContainerName, ImageId};

#[derive(Debug, Deserialize)]
struct LegacyContainer {
    name: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    original_image: Option<String>,
    #[serde(default)]
    history: Vec<LegacyHistory>,
}

/// History entries were plain image names in the earliest layout, objects later.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyHistory {
    Image(String),
    Entry(LegacyEntry),
}

#[derive(Debug, Deserialize)]
struct LegacyEntry {
    #[serde(default)]
    container_id: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    image: String,
    #[serde(default)]
    tagged: bool,
}

impl LegacyHistory {
    fn into_entry(self) -> LegacyEntry {
        match self {
            LegacyHistory::Image(image) => LegacyEntry {
                container_id: None,
                timestamp: None,
                image,
                tagged: false,
            },
            LegacyHistory::Entry(entry) => entry,
        }
    }
}

/// Decode a metadata file of any known layout.
pub fn decode(path: &Path, raw: &str) -> Result<MetadataDocument> {
    if raw.trim().is_empty() {
        return Ok(MetadataDocument::default());
    }

    let value: Value = serde_json::from_str(raw)?;
    match value {
        Value::Array(_) => {
            tracing::info!("migrating legacy metadata layout in {}", path.display());
            let legacy: Vec<LegacyContainer> = serde_json::from_value(value)?;
            migrate_legacy(legacy, Utc::now())
        }
        value => {
            let found = value
                .get("version")
                .and_then(Value::as_u64)
                .map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX));
            if found > SCHEMA_VERSION {
                return Err(Error::UnsupportedVersion {
                    path: path.to_path_buf(),
                    found,
                });
            }
            let mut doc: MetadataDocument = serde_json::from_value(value)?;
            doc.version = SCHEMA_VERSION;
            Ok(doc)
        }
    }
}

fn migrate_legacy(legacy: Vec<LegacyContainer>, now: DateTime<Utc>) -> Result<MetadataDocument> {
    let containers = legacy
        .into_iter()
        .map(|entry| migrate_container(entry, now))
        .collect::<Result<Vec<_>>>()?;

    Ok(MetadataDocument {
        version: SCHEMA_VERSION,
        containers,
        archived: Vec::new(),
    })
}

fn migrate_container(legacy: LegacyContainer, now: DateTime<Utc>) -> Result<StatefulContainer> {
    let name = ContainerName::new(&legacy.name)?;
    let history: Vec<LegacyEntry> = legacy
        .history
        .into_iter()
        .map(LegacyHistory::into_entry)
        .collect();

    let base = legacy
        .original_image
        .or(legacy.image)
        .or_else(|| history.first().map(|e| e.image.clone()))
        .unwrap_or_default();

    let mut sc = StatefulContainer {
        name,
        containers: Vec::new(),
        snapshots: Vec::new(),
        next_snapshot_to_start: None,
        deleted: Vec::new(),
    };

    let last_idx = history.len().saturating_sub(1);
    let mut clock: Option<DateTime<Utc>> = None;

    for (idx, entry) in history.into_iter().enumerate() {
        let parsed = entry.timestamp.as_deref().and_then(parse_timestamp);
        let created_at = match (parsed, clock) {
            (Some(ts), Some(prev)) if ts < prev => prev,
            (Some(ts), _) => ts,
            (None, Some(prev)) => prev,
            (None, None) => now,
        };
        clock = Some(created_at);

        if entry.image == base {
            // Start entries: the last one was never followed by a stop.
            let Some(id) = entry.container_id.filter(|id| !id.is_empty()) else {
                continue;
            };
            let status = if idx == last_idx {
                InstanceStatus::Running
            } else {
                InstanceStatus::Stopped
            };
            sc.containers.push(ContainerInstance {
                container_id: Some(ContainerId::new(id)),
                image: entry.image,
                created_at,
                status,
            });
        } else if sc.snapshot(&entry.image).is_none() {
            sc.snapshots.push(SnapshotRecord {
                name: entry.image.clone(),
                image_id: ImageId::new(entry.image),
                created_at,
                tagged: entry.tagged,
            });
        }
    }

    if sc.containers.is_empty() && sc.snapshots.is_empty() && !base.is_empty() {
        sc.containers.push(ContainerInstance {
            container_id: None,
            image: base,
            created_at: clock.unwrap_or(now),
            status: InstanceStatus::Created,
        });
    }

    sc.next_snapshot_to_start = sc.snapshots.last().map(|s| s.name.clone());
    Ok(sc)
}

/// ISO-8601 with or without offset; naive values are taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
