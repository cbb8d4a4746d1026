// ABOUTME: Snapshot garbage collection by age and count.
// ABOUTME: Tagged snapshots and the next snapshot to start are never candidates.

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::metadata::{ArchiveReason, StatefulContainer};
use crate::runtime::{DriverError, RuntimeDriver};

/// Limits applied after every new snapshot.
///
/// The age and count filters are independent: the age purge runs first and the
/// count purge only considers what survived it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    max_snapshots: usize,
    max_age: chrono::Duration,
}

impl RetentionPolicy {
    pub fn new(max_snapshots: usize, retention_days: u32) -> Self {
        Self {
            max_snapshots,
            max_age: chrono::Duration::days(i64::from(retention_days)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            max_snapshots: config.max_snapshots,
            max_age: config.retention_window(),
        }
    }

    /// Names of the snapshots this policy would remove, in sequence order.
    pub fn plan(&self, sc: &StatefulContainer, now: DateTime<Utc>) -> Vec<String> {
        let cutoff = now - self.max_age;
        let protected = sc.next_snapshot_to_start.as_deref();

        let mut aged = Vec::new();
        let mut survivors = Vec::new();
        for (idx, snapshot) in sc.snapshots.iter().enumerate() {
            if snapshot.tagged || Some(snapshot.name.as_str()) == protected {
                continue;
            }
            if snapshot.created_at < cutoff {
                aged.push(idx);
            } else {
                survivors.push(idx);
            }
        }

        let excess = survivors.len().saturating_sub(self.max_snapshots);
        if excess > 0 {
            // Stable sort keeps insertion order for equal timestamps.
            survivors.sort_by_key(|&idx| sc.snapshots[idx].created_at);
            aged.extend(survivors.into_iter().take(excess));
        }

        aged.sort_unstable();
        aged.into_iter()
            .map(|idx| sc.snapshots[idx].name.clone())
            .collect()
    }

    /// Remove planned snapshots' images and archive the records that went.
    ///
    /// A failed removal leaves its record active and is reported; the rest of
    /// the batch still runs.
    pub async fn enforce<D: RuntimeDriver + ?Sized>(
        &self,
        sc: &mut StatefulContainer,
        driver: &D,
        now: DateTime<Utc>,
    ) -> RetentionReport {
        let mut report = RetentionReport::default();

        for name in self.plan(sc, now) {
            let Some(image) = sc.snapshot(&name).map(|s| s.image_id.clone()) else {
                continue;
            };

            match driver.remove_image(&image).await {
                Ok(()) => {}
                Err(e) if e.is_image_not_found() => {
                    tracing::debug!(snapshot = %name, "image already removed");
                }
                Err(error) => {
                    tracing::warn!(
                        container = %sc.name,
                        snapshot = %name,
                        "retention could not remove image: {error}"
                    );
                    report.failures.push(RetentionFailure {
                        snapshot: name,
                        error,
                    });
                    continue;
                }
            }

            sc.archive_snapshot(&name, ArchiveReason::Retention, now);
            tracing::info!(container = %sc.name, snapshot = %name, "snapshot removed by retention");
            report.removed.push(name);
        }

        report
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What one retention pass did.
#[derive(Debug, Default)]
pub struct RetentionReport {
    /// Snapshots archived by this pass.
    pub removed: Vec<String>,
    /// Snapshots whose image could not be removed; still active.
    pub failures: Vec<RetentionFailure>,
}

impl RetentionReport {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct RetentionFailure {
    pub snapshot: String,
    pub error: DriverError,
}
