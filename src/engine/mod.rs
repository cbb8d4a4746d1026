// ABOUTME: Stateful container lifecycle with its retention and deletion policies.
// ABOUTME: Generic over the RuntimeDriver so tests can run it without a container runtime.

mod deletion;
mod lifecycle;
mod retention;

pub use deletion::DeleteOption;
pub use lifecycle::{DeleteOutcome, Engine, SnapshotOutcome, StartOutcome, StopOutcome};
pub use retention::{RetentionFailure, RetentionPolicy, RetentionReport};
