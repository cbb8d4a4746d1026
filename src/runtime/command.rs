// ABOUTME: Structured runtime command lines.
// ABOUTME: Builds argv lists for every driver operation, with optional sudo prefix.

use std::fmt;

use super::RuntimeType;
use crate::types::{ContainerId, ContainerName, ImageId, ImageRef};

/// A program and its arguments, never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeCommand {
    program: String,
    args: Vec<String>,
}

impl RuntimeCommand {
    #[cfg(test)]
    pub(crate) fn raw(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for RuntimeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Produces the command for each driver operation.
#[derive(Debug, Clone, Copy)]
pub struct CommandBuilder {
    runtime: RuntimeType,
    use_sudo: bool,
}

impl CommandBuilder {
    pub fn new(runtime: RuntimeType, use_sudo: bool) -> Self {
        Self { runtime, use_sudo }
    }

    fn build<I, S>(&self, args: I) -> RuntimeCommand
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let runtime = self.runtime.binary().to_string();
        let (program, mut argv) = if self.use_sudo {
            ("sudo".to_string(), vec![runtime])
        } else {
            (runtime, Vec::new())
        };
        argv.extend(args.into_iter().map(Into::into));
        RuntimeCommand {
            program,
            args: argv,
        }
    }

    /// `run -d --name {name} {image} sleep infinity`
    pub fn run_detached(&self, name: &ContainerName, image: &str) -> RuntimeCommand {
        self.build([
            "run",
            "-d",
            "--name",
            name.as_str(),
            image,
            "sleep",
            "infinity",
        ])
    }

    pub fn stop(&self, id: &ContainerId) -> RuntimeCommand {
        self.build(["stop", id.as_str()])
    }

    pub fn rename(&self, id: &ContainerId, new_name: &str) -> RuntimeCommand {
        self.build(["rename", id.as_str(), new_name])
    }

    pub fn commit(&self, id: &ContainerId, tag: &ImageRef) -> RuntimeCommand {
        self.build(["commit".to_string(), id.to_string(), tag.to_string()])
    }

    pub fn remove_image(&self, image: &ImageId) -> RuntimeCommand {
        self.build(["rmi", image.as_str()])
    }

    /// `ps -a -q -f name={name}`: any container, running or not.
    ///
    /// The runtime treats the filter as an unanchored pattern, so containers
    /// whose names merely contain `name` count as well.
    pub fn query_exists(&self, name: &ContainerName) -> RuntimeCommand {
        self.build([
            "ps".to_string(),
            "-a".into(),
            "-q".into(),
            "-f".into(),
            format!("name={name}"),
        ])
    }

    /// `ps -q -f name=^{name}$`: the running container with exactly this name.
    pub fn query_running(&self, name: &ContainerName) -> RuntimeCommand {
        self.build([
            "ps".to_string(),
            "-q".into(),
            "-f".into(),
            format!("name=^{name}$"),
        ])
    }
}
