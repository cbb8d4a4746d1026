// ABOUTME: Reads and writes containers.json and hands out the metadata lock.
// ABOUTME: Saves go through a temp file and rename so readers never see a partial write.

use std::fs;
use std::path::{Path, PathBuf};

use super::lock::MetadataLock;
use super::migrate;
use super::model::MetadataDocument;
use crate::error::Result;
use crate::paths::StatePaths;

#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl MetadataStore {
    pub fn new(paths: &StatePaths) -> Self {
        Self {
            path: paths.metadata(),
            lock_path: paths.lock(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, creating an empty file on first use.
    pub fn load(&self) -> Result<MetadataDocument> {
        if !self.path.exists() {
            let doc = MetadataDocument::default();
            self.save(&doc)?;
            tracing::debug!("created empty metadata file at {}", self.path.display());
            return Ok(doc);
        }
        let raw = fs::read_to_string(&self.path)?;
        migrate::decode(&self.path, &raw)
    }

    pub fn save(&self, doc: &MetadataDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Take the exclusive lock for a load-modify-save cycle.
    pub fn lock(&self, operation: &str) -> Result<MetadataLock> {
        MetadataLock::acquire(&self.lock_path, operation)
    }
}
