// ABOUTME: Persistent record of every stateful container, its instances and snapshots.
// ABOUTME: JSON document on disk, guarded by an exclusive lock during mutations.

mod lock;
mod migrate;
mod model;
mod store;

pub use lock::{LockInfo, MetadataLock};
pub use model::{
    ArchiveReason, ArchivedEntry, ArchivedRecord, ContainerInstance, InstanceStatus,
    MetadataDocument, SCHEMA_VERSION, SnapshotRecord, StatefulContainer,
};
pub use store::MetadataStore;
