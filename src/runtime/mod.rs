// ABOUTME: Container runtime access for Docker and Podman.
// ABOUTME: Structured command lines, the RuntimeDriver seam, and its process-backed implementation.

mod command;
mod driver;
mod error;
mod process;
mod types;

pub use command::{CommandBuilder, RuntimeCommand};
pub use driver::RuntimeDriver;
pub use error::DriverError;
pub use process::CliDriver;
pub use types::RuntimeType;
