// ABOUTME: Location of scon's state directory and the files inside it.
// ABOUTME: XDG state dir by default, overridable with SCON_HOME.

use std::path::PathBuf;

use crate::config::CONFIG_FILENAME;
use crate::error::{Error, Result};

/// Environment variable that overrides the state directory.
pub const STATE_DIR_ENV: &str = "SCON_HOME";

const METADATA_FILENAME: &str = "containers.json";
const LOCK_FILENAME: &str = "containers.lock";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    root: PathBuf,
}

impl StatePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$SCON_HOME`, else the platform state dir, else `~/.local/state/scon`.
    pub fn resolve() -> Result<Self> {
        if let Some(dir) = std::env::var_os(STATE_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(dir));
        }
        dirs::state_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("state")))
            .map(|base| Self::new(base.join("scon")))
            .ok_or(Error::NoStateDir)
    }

    pub fn metadata(&self) -> PathBuf {
        self.root.join(METADATA_FILENAME)
    }

    pub fn config(&self) -> PathBuf {
        self.root.join(CONFIG_FILENAME)
    }

    pub fn lock(&self) -> PathBuf {
        self.root.join(LOCK_FILENAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn files_live_under_root() {
        let paths = StatePaths::new("/tmp/scon-state");
        assert_eq!(paths.metadata(), Path::new("/tmp/scon-state/containers.json"));
        assert_eq!(paths.config(), Path::new("/tmp/scon-state/config.yml"));
        assert_eq!(paths.lock(), Path::new("/tmp/scon-state/containers.lock"));
    }
}
