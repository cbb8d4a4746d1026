// ABOUTME: In-memory RuntimeDriver that records every call.
// ABOUTME: Tracks running containers and images, with programmable failures.

use async_trait::async_trait;
use parking_lot::Mutex;
use scon::runtime::{DriverError, RuntimeDriver};
use scon::types::{ContainerId, ContainerName, ImageId, ImageRef};
use std::collections::{HashMap, HashSet};

/// A recorded driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RunDetached { name: String, image: String },
    Stop(String),
    Rename { id: String, new_name: String },
    Commit { id: String, tag: String },
    RemoveImage(String),
    QueryRunning(String),
    QueryExists(String),
}

/// Driver operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    RunDetached,
    Stop,
    Rename,
    Commit,
    RemoveImage,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    /// Runtime container name → ID, for every container that exists.
    containers: HashMap<String, String>,
    running: HashSet<String>,
    images: HashSet<String>,
    failing_ops: HashSet<Op>,
    failing_images: HashSet<String>,
    counter: u32,
}

#[derive(Default)]
pub struct MockDriver {
    state: Mutex<State>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn removed_images(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::RemoveImage(image) => Some(image),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Make every call of `op` fail until `recover` is called.
    pub fn fail(&self, op: Op) {
        self.state.lock().failing_ops.insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.state.lock().failing_ops.remove(&op);
    }

    /// Make removal of one image fail.
    pub fn fail_image(&self, image: &str) {
        self.state.lock().failing_images.insert(image.to_string());
    }

    /// Forget an image so its removal reports it as missing.
    pub fn forget_image(&self, image: &str) {
        self.state.lock().images.remove(image);
    }

    /// Pretend a container was started outside scon.
    pub fn add_foreign_container(&self, name: &str, running: bool) {
        let mut state = self.state.lock();
        let id = format!("foreign-{name}");
        state.containers.insert(name.to_string(), id.clone());
        if running {
            state.running.insert(id);
        }
    }

    /// Remove the renamed leftovers of stopped instances of `name`.
    pub fn remove_stopped_containers(&self, name: &str) {
        let prefix = format!("{name}_stopped_");
        self.state
            .lock()
            .containers
            .retain(|existing, _| !existing.starts_with(&prefix));
    }

    pub fn running_count(&self) -> usize {
        self.state.lock().running.len()
    }

    pub fn has_image(&self, image: &str) -> bool {
        self.state.lock().images.contains(image)
    }
}

fn failure(command: String) -> DriverError {
    DriverError::Failed {
        command,
        status: "exit status: 1".to_string(),
        stderr: "mock failure".to_string(),
    }
}

impl State {
    /// IDs of containers a runtime `name=` filter selects. Filters are
    /// unanchored patterns: `^web$` matches only `web`, `web` also matches
    /// `webapp` and `web_stopped_*`.
    fn matching<'a>(&'a self, filter: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        let exact = filter.strip_prefix('^').and_then(|f| f.strip_suffix('$'));
        self.containers
            .iter()
            .filter(move |(name, _)| match exact {
                Some(exact) => name.as_str() == exact,
                None => name.contains(filter),
            })
            .map(|(_, id)| id)
    }

    fn check(&self, op: Op, command: impl FnOnce() -> String) -> Result<(), DriverError> {
        if self.failing_ops.contains(&op) {
            Err(failure(command()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RuntimeDriver for MockDriver {
    async fn run_detached(
        &self,
        name: &ContainerName,
        image: &str,
    ) -> Result<ContainerId, DriverError> {
        let mut state = self.state.lock();
        state.calls.push(Call::RunDetached {
            name: name.to_string(),
            image: image.to_string(),
        });
        state.check(Op::RunDetached, || format!("mock run -d --name {name} {image}"))?;

        state.counter += 1;
        let id = format!("container{:04}", state.counter);
        state.containers.insert(name.to_string(), id.clone());
        state.running.insert(id.clone());
        Ok(ContainerId::new(id))
    }

    async fn stop(&self, id: &ContainerId) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Stop(id.to_string()));
        state.check(Op::Stop, || format!("mock stop {id}"))?;

        state.running.remove(id.as_str());
        Ok(())
    }

    async fn rename(&self, id: &ContainerId, new_name: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Rename {
            id: id.to_string(),
            new_name: new_name.to_string(),
        });
        state.check(Op::Rename, || format!("mock rename {id} {new_name}"))?;

        state.containers.retain(|_, existing| existing.as_str() != id.as_str());
        state
            .containers
            .insert(new_name.to_string(), id.to_string());
        Ok(())
    }

    async fn commit(&self, id: &ContainerId, tag: &ImageRef) -> Result<ImageId, DriverError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Commit {
            id: id.to_string(),
            tag: tag.to_string(),
        });
        state.check(Op::Commit, || format!("mock commit {id} {tag}"))?;

        state.counter += 1;
        let image = format!("sha256:{:012x}", state.counter);
        state.images.insert(image.clone());
        Ok(ImageId::new(image))
    }

    async fn remove_image(&self, image: &ImageId) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        state.calls.push(Call::RemoveImage(image.to_string()));
        state.check(Op::RemoveImage, || format!("mock rmi {image}"))?;
        if state.failing_images.contains(image.as_str()) {
            return Err(failure(format!("mock rmi {image}")));
        }

        if state.images.remove(image.as_str()) {
            Ok(())
        } else {
            Err(DriverError::ImageNotFound {
                image: image.to_string(),
            })
        }
    }

    async fn query_running(
        &self,
        name: &ContainerName,
    ) -> Result<Option<ContainerId>, DriverError> {
        let mut state = self.state.lock();
        state.calls.push(Call::QueryRunning(name.to_string()));
        let filter = format!("^{name}$");
        Ok(state
            .matching(&filter)
            .find(|id| state.running.contains(*id))
            .map(|id| ContainerId::new(id.clone())))
    }

    async fn query_exists(&self, name: &ContainerName) -> Result<bool, DriverError> {
        let mut state = self.state.lock();
        state.calls.push(Call::QueryExists(name.to_string()));
        Ok(state.matching(name.as_str()).next().is_some())
    }
}
