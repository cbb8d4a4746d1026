// ABOUTME: The three delete modes and which snapshots each one removes.
// ABOUTME: Parsing is strict; the interactive menu lives in the command adapter.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::metadata::StatefulContainer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOption {
    /// Drop the entry and leave every image in place.
    EntryOnly,
    /// Remove every snapshot image, then drop the entry.
    AllSnapshots,
    /// Remove every snapshot image except the newest; the entry stays.
    KeepLatestSnapshot,
}

impl DeleteOption {
    pub const ALL: [DeleteOption; 3] = [
        DeleteOption::EntryOnly,
        DeleteOption::AllSnapshots,
        DeleteOption::KeepLatestSnapshot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteOption::EntryOnly => "entry-only",
            DeleteOption::AllSnapshots => "all-snapshots",
            DeleteOption::KeepLatestSnapshot => "keep-latest-snapshot",
        }
    }

    /// Whether the stateful container leaves active metadata.
    pub fn removes_entry(&self) -> bool {
        !matches!(self, DeleteOption::KeepLatestSnapshot)
    }

    /// Snapshot names whose images must be removed, in sequence order.
    pub fn snapshots_to_remove(&self, sc: &StatefulContainer) -> Vec<String> {
        match self {
            DeleteOption::EntryOnly => Vec::new(),
            DeleteOption::AllSnapshots => sc.snapshots.iter().map(|s| s.name.clone()).collect(),
            DeleteOption::KeepLatestSnapshot => {
                let keep = sc.latest_snapshot().map(|s| s.name.as_str());
                sc.snapshots
                    .iter()
                    .filter(|s| Some(s.name.as_str()) != keep)
                    .map(|s| s.name.clone())
                    .collect()
            }
        }
    }
}

impl fmt::Display for DeleteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeleteOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeleteOption::ALL
            .into_iter()
            .find(|option| option.as_str() == s)
            .ok_or_else(|| {
                Error::InvalidOption(format!(
                    "unknown delete option '{s}' (use one of: {})",
                    DeleteOption::ALL.map(|o| o.as_str()).join(", ")
                ))
            })
    }
}
