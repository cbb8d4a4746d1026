// ABOUTME: Canonical on-disk schema for stateful containers.
// ABOUTME: Instances, snapshots, the audit archive, and the versioned document wrapping them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ContainerId, ContainerName, ImageId, ImageRef};

/// Current document version written by `MetadataStore::save`.
pub const SCHEMA_VERSION: u32 = 1;

/// Lifecycle status of one runtime container incarnation.
///
/// `Created → Running → Stopped`; `Stopped` is terminal for the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Created,
    Running,
    Stopped,
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            InstanceStatus::Created => "created",
            InstanceStatus::Running => "running",
            InstanceStatus::Stopped => "stopped",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInstance {
    /// Null until the runtime has actually run this instance.
    pub container_id: Option<ContainerId>,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub status: InstanceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    /// The tag the snapshot was committed to, e.g. `web:v3`.
    pub name: String,
    pub image_id: ImageId,
    pub created_at: DateTime<Utc>,
    /// Tagged snapshots are never garbage-collected.
    #[serde(default)]
    pub tagged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveReason {
    /// Removed by the snapshot retention policy.
    Retention,
    /// Removed by an explicit delete.
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ArchivedRecord {
    Container(ContainerInstance),
    Snapshot(SnapshotRecord),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedEntry {
    pub deleted_at: DateTime<Utc>,
    pub reason: ArchiveReason,
    pub entry: ArchivedRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatefulContainer {
    pub name: ContainerName,
    #[serde(default)]
    pub containers: Vec<ContainerInstance>,
    #[serde(default)]
    pub snapshots: Vec<SnapshotRecord>,
    /// Name of the snapshot the next `start` runs from.
    #[serde(default)]
    pub next_snapshot_to_start: Option<String>,
    #[serde(default)]
    pub deleted: Vec<ArchivedEntry>,
}

impl StatefulContainer {
    /// A new entry with a single `created` instance of `image`.
    pub fn new(name: ContainerName, image: &ImageRef, now: DateTime<Utc>) -> Self {
        Self {
            name,
            containers: vec![ContainerInstance {
                container_id: None,
                image: image.to_string(),
                created_at: now,
                status: InstanceStatus::Created,
            }],
            snapshots: Vec::new(),
            next_snapshot_to_start: None,
            deleted: Vec::new(),
        }
    }

    pub fn latest_instance(&self) -> Option<&ContainerInstance> {
        self.containers.last()
    }

    pub fn latest_instance_mut(&mut self) -> Option<&mut ContainerInstance> {
        self.containers.last_mut()
    }

    pub fn running_count(&self) -> usize {
        self.containers
            .iter()
            .filter(|c| c.status == InstanceStatus::Running)
            .count()
    }

    pub fn snapshot(&self, name: &str) -> Option<&SnapshotRecord> {
        self.snapshots.iter().find(|s| s.name == name)
    }

    pub fn snapshot_mut(&mut self, name: &str) -> Option<&mut SnapshotRecord> {
        self.snapshots.iter_mut().find(|s| s.name == name)
    }

    /// The snapshot `start` would resume from.
    pub fn next_snapshot(&self) -> Option<&SnapshotRecord> {
        self.next_snapshot_to_start
            .as_deref()
            .and_then(|name| self.snapshot(name))
    }

    /// Most recent snapshot by `createdAt`; later position wins ties.
    pub fn latest_snapshot(&self) -> Option<&SnapshotRecord> {
        self.snapshots
            .iter()
            .enumerate()
            .max_by_key(|(idx, s)| (s.created_at, *idx))
            .map(|(_, s)| s)
    }

    /// A timestamp not earlier than anything already recorded here.
    pub fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let newest = self
            .containers
            .iter()
            .map(|c| c.created_at)
            .chain(self.snapshots.iter().map(|s| s.created_at))
            .max();
        match newest {
            Some(newest) if newest > now => newest,
            _ => now,
        }
    }

    /// Move a snapshot from the active sequence into the archive.
    ///
    /// Clears `nextSnapshotToStart` if it pointed at the removed snapshot.
    pub fn archive_snapshot(
        &mut self,
        name: &str,
        reason: ArchiveReason,
        now: DateTime<Utc>,
    ) -> Option<SnapshotRecord> {
        let idx = self.snapshots.iter().position(|s| s.name == name)?;
        let record = self.snapshots.remove(idx);
        if self.next_snapshot_to_start.as_deref() == Some(name) {
            self.next_snapshot_to_start = None;
        }
        self.deleted.push(ArchivedEntry {
            deleted_at: now,
            reason,
            entry: ArchivedRecord::Snapshot(record.clone()),
        });
        Some(record)
    }

    /// Move the most recent instance into the archive.
    pub fn archive_latest_instance(&mut self, now: DateTime<Utc>) -> Option<ContainerInstance> {
        let instance = self.containers.pop()?;
        self.deleted.push(ArchivedEntry {
            deleted_at: now,
            reason: ArchiveReason::Delete,
            entry: ArchivedRecord::Container(instance.clone()),
        });
        Some(instance)
    }

    /// Every snapshot ever recorded here, active or archived.
    pub fn all_snapshot_names(&self) -> impl Iterator<Item = &str> {
        self.snapshots
            .iter()
            .map(|s| s.name.as_str())
            .chain(self.deleted.iter().filter_map(|d| match &d.entry {
                ArchivedRecord::Snapshot(s) => Some(s.name.as_str()),
                ArchivedRecord::Container(_) => None,
            }))
    }
}

/// The whole metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDocument {
    pub version: u32,
    /// Active stateful containers, in creation order.
    #[serde(default)]
    pub containers: Vec<StatefulContainer>,
    /// Entries removed by delete, kept for audit.
    #[serde(default)]
    pub archived: Vec<StatefulContainer>,
}

impl Default for MetadataDocument {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            containers: Vec::new(),
            archived: Vec::new(),
        }
    }
}

impl MetadataDocument {
    pub fn get(&self, name: &ContainerName) -> Option<&StatefulContainer> {
        self.containers.iter().find(|c| &c.name == name)
    }

    pub fn get_mut(&mut self, name: &ContainerName) -> Option<&mut StatefulContainer> {
        self.containers.iter_mut().find(|c| &c.name == name)
    }

    pub fn contains(&self, name: &ContainerName) -> bool {
        self.get(name).is_some()
    }

    /// Remove an active entry and keep it in the archive.
    pub fn archive(&mut self, name: &ContainerName) -> Option<&StatefulContainer> {
        let idx = self.containers.iter().position(|c| &c.name == name)?;
        let entry = self.containers.remove(idx);
        self.archived.push(entry);
        self.archived.last()
    }

    /// Next unused snapshot version for `name`.
    ///
    /// Counts archived entries of the same name too, so a recreated container
    /// never commits over an image a previous incarnation left behind.
    pub fn next_snapshot_version(&self, name: &ContainerName) -> u32 {
        self.containers
            .iter()
            .chain(self.archived.iter())
            .filter(|c| &c.name == name)
            .flat_map(|c| c.all_snapshot_names())
            .filter_map(|tag| ImageRef::parse(tag).ok()?.snapshot_version(name))
            .max()
            .map_or(1, |v| v + 1)
    }
}
