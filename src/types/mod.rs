// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Keeps runtime container IDs, image IDs, and names from being mixed up.

mod container_name;
mod id;
mod image_ref;

pub use container_name::{ContainerName, ContainerNameError};
pub use id::{ContainerId, ImageId};
pub use image_ref::{ImageRef, ParseImageRefError};
