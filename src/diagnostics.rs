// ABOUTME: Diagnostics accumulator for non-fatal warnings during an operation.
// ABOUTME: Collects problems that shouldn't fail a command but should be shown to users.

use crate::engine::RetentionReport;
use crate::types::ContainerName;

/// Collects non-fatal warnings during engine operations.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Record every failed removal in a retention pass.
    pub fn record_retention(&mut self, name: &ContainerName, report: &RetentionReport) {
        for failure in &report.failures {
            self.warn(Warning::retention_failure(format!(
                "{name}: snapshot {} kept, image removal failed: {}",
                failure.snapshot, failure.error
            )));
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during an operation.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Create a retention failure warning.
    pub fn retention_failure(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::RetentionFailure,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Retention could not remove a snapshot image; the record stays active.
    RetentionFailure,
}
