// ABOUTME: Application-wide error types for scon.
// ABOUTME: Uses thiserror, with ErrorKind for programmatic handling by callers.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

use crate::runtime::DriverError;
use crate::types::{ContainerNameError, ParseImageRefError};

#[derive(Debug, Error)]
pub enum Error {
    #[error("stateful container '{0}' not found")]
    NotFound(String),

    #[error("snapshot '{snapshot}' not found for stateful container '{container}'")]
    SnapshotNotFound { container: String, snapshot: String },

    #[error("a stateful container named '{0}' already exists")]
    AlreadyExists(String),

    #[error("a runtime container named '{0}' already exists; remove it or choose another name")]
    RuntimeNameInUse(String),

    #[error("a runtime container named '{name}' is already running ({id})")]
    AlreadyRunning { name: String, id: String },

    #[error("metadata is locked by {holder} (pid {pid}) since {started_at}")]
    LockHeld {
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("invalid container name: {0}")]
    InvalidName(#[from] ContainerNameError),

    #[error("invalid image reference: {0}")]
    InvalidImage(#[from] ParseImageRefError),

    #[error("runtime command failed: {0}")]
    Runtime(#[from] DriverError),

    #[error("failed to remove {} image(s) of '{name}': {}", images.len(), images.join(", "))]
    ImagesNotRemoved { name: String, images: Vec<String> },

    #[error("unsupported metadata version {found} in {path}")]
    UnsupportedVersion { path: PathBuf, found: u32 },

    #[error("could not determine a state directory; set SCON_HOME")]
    NoStateDir,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Error category, independent of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown stateful container or snapshot.
    NotFound,
    /// Name collision, running runtime container, or held lock.
    Conflict,
    /// A runtime driver call failed or timed out.
    RuntimeCommand,
    /// Unrecognised option, config key or value, or malformed input.
    InvalidOption,
    /// Operation not valid for the current lifecycle state.
    State,
    /// Metadata or config could not be read or written.
    Storage,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) | Error::SnapshotNotFound { .. } => ErrorKind::NotFound,
            Error::AlreadyExists(_)
            | Error::RuntimeNameInUse(_)
            | Error::AlreadyRunning { .. }
            | Error::LockHeld { .. } => ErrorKind::Conflict,
            Error::Runtime(_) | Error::ImagesNotRemoved { .. } => ErrorKind::RuntimeCommand,
            Error::InvalidOption(_) | Error::InvalidName(_) | Error::InvalidImage(_) => {
                ErrorKind::InvalidOption
            }
            Error::InvalidState(_) => ErrorKind::State,
            Error::UnsupportedVersion { .. }
            | Error::NoStateDir
            | Error::Io(_)
            | Error::Json(_)
            | Error::Yaml(_) => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
