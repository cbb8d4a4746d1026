// ABOUTME: The RuntimeDriver trait consumed by the lifecycle engine.
// ABOUTME: One method per container-engine operation; implemented by CliDriver and test doubles.

use async_trait::async_trait;

use super::DriverError;
use crate::types::{ContainerId, ContainerName, ImageId, ImageRef};

/// Container-engine operations the engine depends on.
///
/// Each call blocks until the runtime answers or a bounded timeout expires.
/// Failures are reported, never acted on: only the engine mutates metadata.
#[async_trait]
pub trait RuntimeDriver: Send + Sync {
    /// Start `image` detached under `name`, returning the new container ID.
    async fn run_detached(
        &self,
        name: &ContainerName,
        image: &str,
    ) -> Result<ContainerId, DriverError>;

    /// Stop a running container.
    async fn stop(&self, id: &ContainerId) -> Result<(), DriverError>;

    /// Rename a container, freeing its old name.
    async fn rename(&self, id: &ContainerId, new_name: &str) -> Result<(), DriverError>;

    /// Commit a container's filesystem to `tag`, returning the image ID.
    async fn commit(&self, id: &ContainerId, tag: &ImageRef) -> Result<ImageId, DriverError>;

    /// Remove an image. Returns `DriverError::ImageNotFound` if it is already gone.
    async fn remove_image(&self, image: &ImageId) -> Result<(), DriverError>;

    /// ID of a running container matching `name`, if any.
    async fn query_running(&self, name: &ContainerName)
    -> Result<Option<ContainerId>, DriverError>;

    /// Whether any container (running or not) matches `name`.
    async fn query_exists(&self, name: &ContainerName) -> Result<bool, DriverError>;
}
