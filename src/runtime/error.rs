// ABOUTME: Runtime driver error types with SNAFU pattern.
// ABOUTME: Every variant carries the rendered command line for diagnostics.

use snafu::Snafu;
use std::time::Duration;

/// A driver call that did not complete successfully.
///
/// Never implies any metadata change: callers abort the operation on any of
/// these.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DriverError {
    #[snafu(display("failed to launch `{command}`: {source}"))]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("`{command}` timed out after {timeout:?}"))]
    Timeout { command: String, timeout: Duration },

    #[snafu(display("`{command}` failed ({status}): {stderr}"))]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[snafu(display("image not found: {image}"))]
    ImageNotFound { image: String },

    #[snafu(display("`{command}` printed no identifier"))]
    EmptyOutput { command: String },
}

impl DriverError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }

    /// The image is already gone, which removal callers treat as success.
    pub fn is_image_not_found(&self) -> bool {
        matches!(self, DriverError::ImageNotFound { .. })
    }
}
