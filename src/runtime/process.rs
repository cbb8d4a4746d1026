// ABOUTME: Process-backed RuntimeDriver that invokes the docker or podman binary.
// ABOUTME: Every invocation is bounded by a timeout and killed if it expires.

use async_trait::async_trait;
use snafu::ResultExt;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::error::{EmptyOutputSnafu, FailedSnafu, SpawnSnafu, TimeoutSnafu};
use super::{CommandBuilder, DriverError, RuntimeCommand, RuntimeDriver};
use crate::config::Config;
use crate::types::{ContainerId, ContainerName, ImageId, ImageRef};

/// Stderr fragments Docker and Podman print when `rmi` targets a missing image.
const MISSING_IMAGE_MARKERS: &[&str] = &["No such image", "image not known"];

/// Runs driver operations as child processes of the local runtime binary.
#[derive(Debug, Clone)]
pub struct CliDriver {
    commands: CommandBuilder,
    timeout: Duration,
}

impl CliDriver {
    pub fn new(commands: CommandBuilder, timeout: Duration) -> Self {
        Self { commands, timeout }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CommandBuilder::new(config.container_runtime, config.use_sudo),
            config.command_timeout,
        )
    }

    /// Run a command to completion and return its trimmed stdout.
    async fn execute(&self, command: &RuntimeCommand) -> Result<String, DriverError> {
        let rendered = command.to_string();
        tracing::debug!(command = %rendered, "running runtime command");

        let mut child = Command::new(command.program());
        child
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, child.output()).await {
            Ok(result) => result.context(SpawnSnafu {
                command: rendered.clone(),
            })?,
            Err(_) => {
                tracing::warn!(
                    command = %rendered,
                    timeout = ?self.timeout,
                    "runtime command timed out"
                );
                return TimeoutSnafu {
                    command: rendered,
                    timeout: self.timeout,
                }
                .fail();
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(command = %rendered, %stderr, "runtime command failed");
            return FailedSnafu {
                command: rendered,
                status: output.status.to_string(),
                stderr,
            }
            .fail();
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// First non-empty line of a command's output.
fn first_line(stdout: &str) -> Option<&str> {
    stdout.lines().map(str::trim).find(|l| !l.is_empty())
}

#[async_trait]
impl RuntimeDriver for CliDriver {
    async fn run_detached(
        &self,
        name: &ContainerName,
        image: &str,
    ) -> Result<ContainerId, DriverError> {
        let command = self.commands.run_detached(name, image);
        let stdout = self.execute(&command).await?;
        match first_line(&stdout) {
            Some(id) => Ok(ContainerId::new(id)),
            None => EmptyOutputSnafu {
                command: command.to_string(),
            }
            .fail(),
        }
    }

    async fn stop(&self, id: &ContainerId) -> Result<(), DriverError> {
        self.execute(&self.commands.stop(id)).await.map(drop)
    }

    async fn rename(&self, id: &ContainerId, new_name: &str) -> Result<(), DriverError> {
        self.execute(&self.commands.rename(id, new_name))
            .await
            .map(drop)
    }

    async fn commit(&self, id: &ContainerId, tag: &ImageRef) -> Result<ImageId, DriverError> {
        let stdout = self.execute(&self.commands.commit(id, tag)).await?;
        // Both runtimes print the new image ID; fall back to the tag if they don't.
        Ok(first_line(&stdout)
            .map(ImageId::new)
            .unwrap_or_else(|| ImageId::new(tag.to_string())))
    }

    async fn remove_image(&self, image: &ImageId) -> Result<(), DriverError> {
        match self.execute(&self.commands.remove_image(image)).await {
            Ok(_) => Ok(()),
            Err(DriverError::Failed { stderr, .. })
                if MISSING_IMAGE_MARKERS.iter().any(|m| stderr.contains(m)) =>
            {
                Err(DriverError::ImageNotFound {
                    image: image.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn query_running(
        &self,
        name: &ContainerName,
    ) -> Result<Option<ContainerId>, DriverError> {
        let stdout = self.execute(&self.commands.query_running(name)).await?;
        Ok(first_line(&stdout).map(ContainerId::new))
    }

    async fn query_exists(&self, name: &ContainerName) -> Result<bool, DriverError> {
        let stdout = self.execute(&self.commands.query_exists(name)).await?;
        Ok(first_line(&stdout).is_some())
    }
}
