// ABOUTME: The lifecycle engine: create, start, stop, snapshot, delete and friends.
// ABOUTME: Each operation is one locked load-mutate-save cycle around runtime driver calls.

use chrono::Utc;

use super::deletion::DeleteOption;
use super::retention::{RetentionPolicy, RetentionReport};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::metadata::{
    ArchiveReason, ContainerInstance, InstanceStatus, MetadataDocument, MetadataStore,
    SnapshotRecord, StatefulContainer,
};
use crate::paths::StatePaths;
use crate::runtime::{CliDriver, RuntimeDriver};
use crate::types::{ContainerId, ContainerName, ImageRef};

/// Orchestrates runtime driver calls and metadata updates.
///
/// Metadata is only written once every driver step of an operation has
/// succeeded. Retention runs after the snapshot is persisted and saves again.
pub struct Engine<D> {
    driver: D,
    store: MetadataStore,
    policy: RetentionPolicy,
}

impl Engine<CliDriver> {
    /// Engine over the local docker or podman binary.
    pub fn from_config(paths: &StatePaths, config: &Config) -> Self {
        Engine::new(
            CliDriver::from_config(config),
            MetadataStore::new(paths),
            RetentionPolicy::from_config(config),
        )
    }
}

impl<D: RuntimeDriver> Engine<D> {
    pub fn new(driver: D, store: MetadataStore, policy: RetentionPolicy) -> Self {
        Self {
            driver,
            store,
            policy,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Register a new stateful container. Nothing is run yet.
    pub async fn create(
        &self,
        name: &ContainerName,
        image: &ImageRef,
    ) -> Result<StatefulContainer> {
        let _lock = self.store.lock("create")?;
        let mut doc = self.store.load()?;

        if doc.contains(name) {
            return Err(Error::AlreadyExists(name.to_string()));
        }
        if self.driver.query_exists(name).await? {
            return Err(Error::RuntimeNameInUse(name.to_string()));
        }

        let sc = StatefulContainer::new(name.clone(), image, Utc::now());
        doc.containers.push(sc.clone());
        self.store.save(&doc)?;

        tracing::info!(container = %name, image = %image, "created stateful container");
        Ok(sc)
    }

    /// Run a fresh instance from the next snapshot, or from the base image
    /// if the container has never been started.
    pub async fn start(&self, name: &ContainerName) -> Result<StartOutcome> {
        let _lock = self.store.lock("start")?;
        let mut doc = self.store.load()?;
        let sc = entry_mut(&mut doc, name)?;

        if let Some(id) = self.driver.query_running(name).await? {
            return Err(Error::AlreadyRunning {
                name: name.to_string(),
                id: id.to_string(),
            });
        }

        let latest_status = sc.latest_instance().map(|i| i.status);
        if latest_status == Some(InstanceStatus::Running) {
            return Err(Error::InvalidState(format!(
                "'{name}' is already marked running; stop it first"
            )));
        }

        let (image, first_run) = match sc.next_snapshot() {
            Some(snapshot) => (snapshot.image_id.to_string(), false),
            None => match sc.latest_instance() {
                Some(instance) if instance.status == InstanceStatus::Created => {
                    (instance.image.clone(), true)
                }
                _ => {
                    return Err(Error::InvalidState(format!(
                        "'{name}' has no saved snapshot to start from"
                    )));
                }
            },
        };

        let container_id = self.driver.run_detached(name, &image).await?;
        let now = sc.next_timestamp(Utc::now());

        if first_run && let Some(instance) = sc.latest_instance_mut() {
            instance.container_id = Some(container_id.clone());
            instance.status = InstanceStatus::Running;
        } else {
            sc.containers.push(ContainerInstance {
                container_id: Some(container_id.clone()),
                image: image.clone(),
                created_at: now,
                status: InstanceStatus::Running,
            });
        }
        self.store.save(&doc)?;

        tracing::info!(container = %name, id = %container_id.short(), image = %image, "started");
        Ok(StartOutcome {
            container_id,
            image,
        })
    }

    /// Stop the running instance and commit its state as the next snapshot.
    ///
    /// Stop, rename and commit must all succeed before anything is recorded.
    pub async fn stop(&self, name: &ContainerName) -> Result<StopOutcome> {
        let _lock = self.store.lock("stop")?;
        let mut doc = self.store.load()?;
        let tag = ImageRef::snapshot(name, doc.next_snapshot_version(name));
        let sc = entry_mut(&mut doc, name)?;
        let container_id = running_instance_id(sc)?;

        let renamed_to = format!("{name}_stopped_{}", Utc::now().format("%Y%m%d%H%M%S"));
        self.driver.stop(&container_id).await?;
        self.driver.rename(&container_id, &renamed_to).await?;
        let image_id = self.driver.commit(&container_id, &tag).await?;

        let now = sc.next_timestamp(Utc::now());
        let snapshot = SnapshotRecord {
            name: tag.to_string(),
            image_id,
            created_at: now,
            tagged: false,
        };
        if let Some(instance) = sc.latest_instance_mut() {
            instance.status = InstanceStatus::Stopped;
        }
        sc.snapshots.push(snapshot.clone());
        sc.next_snapshot_to_start = Some(snapshot.name.clone());
        self.store.save(&doc)?;

        tracing::info!(
            container = %name,
            snapshot = %snapshot.name,
            renamed_to = %renamed_to,
            "stopped"
        );
        let retention = self.apply_retention(&mut doc, name).await?;

        Ok(StopOutcome {
            snapshot,
            renamed_to,
            retention,
        })
    }

    /// Commit the running instance without stopping it.
    pub async fn snapshot(&self, name: &ContainerName, tagged: bool) -> Result<SnapshotOutcome> {
        let _lock = self.store.lock("snapshot")?;
        let mut doc = self.store.load()?;
        let tag = ImageRef::snapshot(name, doc.next_snapshot_version(name));
        let sc = entry_mut(&mut doc, name)?;
        let container_id = running_instance_id(sc)?;

        let image_id = self.driver.commit(&container_id, &tag).await?;

        let snapshot = SnapshotRecord {
            name: tag.to_string(),
            image_id,
            created_at: sc.next_timestamp(Utc::now()),
            tagged,
        };
        sc.snapshots.push(snapshot.clone());
        self.store.save(&doc)?;

        tracing::info!(container = %name, snapshot = %snapshot.name, tagged, "snapshot taken");
        let retention = self.apply_retention(&mut doc, name).await?;

        Ok(SnapshotOutcome {
            snapshot,
            retention,
        })
    }

    /// Protect a snapshot from retention.
    pub async fn tag(&self, name: &ContainerName, snapshot: &str) -> Result<SnapshotRecord> {
        self.set_tagged(name, snapshot, true)
    }

    /// Make a snapshot eligible for retention again.
    pub async fn untag(&self, name: &ContainerName, snapshot: &str) -> Result<SnapshotRecord> {
        self.set_tagged(name, snapshot, false)
    }

    fn set_tagged(
        &self,
        name: &ContainerName,
        snapshot: &str,
        tagged: bool,
    ) -> Result<SnapshotRecord> {
        let _lock = self.store.lock(if tagged { "tag" } else { "untag" })?;
        let mut doc = self.store.load()?;
        let sc = entry_mut(&mut doc, name)?;

        // Accept both `v3` and `web:v3`.
        let full = if snapshot.contains(':') {
            snapshot.to_string()
        } else {
            format!("{name}:{snapshot}")
        };
        let record = sc
            .snapshot_mut(&full)
            .ok_or_else(|| Error::SnapshotNotFound {
                container: name.to_string(),
                snapshot: full.clone(),
            })?;
        record.tagged = tagged;
        let record = record.clone();
        self.store.save(&doc)?;

        tracing::info!(
            container = %name,
            snapshot = %record.name,
            tagged,
            "updated snapshot protection"
        );
        Ok(record)
    }

    /// Run the retention policy on one entry, or on every entry.
    pub async fn prune(
        &self,
        name: Option<&ContainerName>,
    ) -> Result<Vec<(ContainerName, RetentionReport)>> {
        let _lock = self.store.lock("prune")?;
        let mut doc = self.store.load()?;
        let now = Utc::now();

        if let Some(name) = name
            && !doc.contains(name)
        {
            return Err(Error::NotFound(name.to_string()));
        }

        let mut reports = Vec::new();
        let mut changed = false;
        for sc in doc
            .containers
            .iter_mut()
            .filter(|sc| name.is_none_or(|n| &sc.name == n))
        {
            let report = self.policy.enforce(sc, &self.driver, now).await;
            changed |= !report.removed.is_empty();
            reports.push((sc.name.clone(), report));
        }

        if changed {
            self.store.save(&doc)?;
        }
        Ok(reports)
    }

    /// Delete according to `option`.
    ///
    /// Images are removed one at a time. Successful removals are archived and
    /// saved even when a later one fails, in which case the entry stays and
    /// `ImagesNotRemoved` lists what is left.
    pub async fn delete(
        &self,
        name: &ContainerName,
        option: DeleteOption,
    ) -> Result<DeleteOutcome> {
        let _lock = self.store.lock("delete")?;
        let mut doc = self.store.load()?;
        let sc = entry_mut(&mut doc, name)?;
        let now = sc.next_timestamp(Utc::now());

        let mut removed = Vec::new();
        let mut failed = Vec::new();
        for snapshot in option.snapshots_to_remove(sc) {
            let Some(image) = sc.snapshot(&snapshot).map(|s| s.image_id.clone()) else {
                continue;
            };
            match self.driver.remove_image(&image).await {
                Ok(()) => {}
                Err(e) if e.is_image_not_found() => {
                    tracing::debug!(snapshot = %snapshot, "image already removed");
                }
                Err(e) => {
                    tracing::warn!(
                        container = %name,
                        snapshot = %snapshot,
                        "could not remove image: {e}"
                    );
                    failed.push(snapshot);
                    continue;
                }
            }
            sc.archive_snapshot(&snapshot, ArchiveReason::Delete, now);
            removed.push(snapshot);
        }

        if !failed.is_empty() {
            if !removed.is_empty() {
                self.store.save(&doc)?;
            }
            return Err(Error::ImagesNotRemoved {
                name: name.to_string(),
                images: failed,
            });
        }

        let kept = match option {
            DeleteOption::KeepLatestSnapshot => {
                let kept = sc.latest_snapshot().map(|s| s.name.clone());
                sc.next_snapshot_to_start = kept.clone();
                kept
            }
            DeleteOption::EntryOnly => {
                sc.archive_latest_instance(now);
                None
            }
            DeleteOption::AllSnapshots => None,
        };
        if option.removes_entry() {
            doc.archive(name);
        }
        self.store.save(&doc)?;

        tracing::info!(container = %name, option = %option, removed = removed.len(), "deleted");
        Ok(DeleteOutcome {
            option,
            removed,
            kept,
        })
    }

    /// Active stateful containers in creation order.
    pub fn list(&self) -> Result<Vec<StatefulContainer>> {
        Ok(self.store.load()?.containers)
    }

    /// One active stateful container.
    pub fn get(&self, name: &ContainerName) -> Result<StatefulContainer> {
        let doc = self.store.load()?;
        doc.get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    /// Enforce retention on `name` inside an operation that already saved.
    async fn apply_retention(
        &self,
        doc: &mut MetadataDocument,
        name: &ContainerName,
    ) -> Result<RetentionReport> {
        let sc = entry_mut(doc, name)?;
        let now = sc.next_timestamp(Utc::now());
        let report = self.policy.enforce(sc, &self.driver, now).await;
        if !report.removed.is_empty() {
            self.store.save(doc)?;
        }
        Ok(report)
    }
}

fn entry_mut<'a>(
    doc: &'a mut MetadataDocument,
    name: &ContainerName,
) -> Result<&'a mut StatefulContainer> {
    doc.get_mut(name)
        .ok_or_else(|| Error::NotFound(name.to_string()))
}

/// ID of the latest instance, which must be running.
fn running_instance_id(sc: &StatefulContainer) -> Result<ContainerId> {
    match sc.latest_instance() {
        Some(ContainerInstance {
            status: InstanceStatus::Running,
            container_id: Some(id),
            ..
        }) => Ok(id.clone()),
        Some(instance) if instance.status == InstanceStatus::Stopped => Err(Error::InvalidState(
            format!("'{}' is already stopped", sc.name),
        )),
        Some(instance) if instance.status == InstanceStatus::Created => Err(Error::InvalidState(
            format!("'{}' has never been started", sc.name),
        )),
        _ => Err(Error::InvalidState(format!(
            "'{}' has no running instance",
            sc.name
        ))),
    }
}

#[derive(Debug, Clone)]
pub struct StartOutcome {
    pub container_id: ContainerId,
    /// Image the instance was run from.
    pub image: String,
}

#[derive(Debug)]
pub struct StopOutcome {
    pub snapshot: SnapshotRecord,
    /// Name the stopped runtime container now carries.
    pub renamed_to: String,
    pub retention: RetentionReport,
}

#[derive(Debug)]
pub struct SnapshotOutcome {
    pub snapshot: SnapshotRecord,
    pub retention: RetentionReport,
}

#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub option: DeleteOption,
    /// Snapshots whose images were removed and records archived.
    pub removed: Vec<String>,
    /// The snapshot left behind by `keep-latest-snapshot`.
    pub kept: Option<String>,
}
