//! In-memory directory
//!
//! Process-local tree used for tests, dry runs and embedding. Keeps a journal
//! of every call and supports per-DN fault injection.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use crate::domain::{dn_key, ContainerEntry, DirectoryClient};
use crate::error::{DirectoryError, ErrorKind, Result};

/// A call observed by `InMemoryDirectory`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    Exists(String),
    CreateContainer { name: String, parent: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Operation {
    Exists,
    Create,
}

#[derive(Default)]
struct State {
    naming_contexts: HashSet<String>,
    containers: BTreeMap<String, ContainerEntry>,
    /// Non-container objects seeded by the caller
    objects: HashSet<String>,
    faults: HashMap<(Operation, String), ErrorKind>,
    journal: Vec<DirectoryCall>,
}

impl State {
    fn contains(&self, key: &str) -> bool {
        self.naming_contexts.contains(key)
            || self.containers.contains_key(key)
            || self.objects.contains(key)
    }

    fn fault(&self, op: Operation, key: &str) -> Option<ErrorKind> {
        self.faults.get(&(op, key.to_string())).copied()
    }
}

/// Directory tree held in memory
///
/// Cloning shares the underlying tree, so a test can keep a handle while the
/// materializer borrows another.
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<Mutex<State>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory serving a single naming context
    pub fn with_naming_context(root: &str) -> Self {
        let dir = Self::new();
        dir.add_naming_context(root);
        dir
    }

    pub fn add_naming_context(&self, root: &str) {
        self.state.lock().naming_contexts.insert(dn_key(root));
    }

    /// Seed an existing container without going through `create_container`
    pub fn seed_container(&self, name: &str, parent: &str) {
        let entry = ContainerEntry::new(name, parent);
        self.state.lock().containers.insert(dn_key(&entry.dn), entry);
    }

    /// Seed an existing non-container object (e.g. `CN=svc,OU=b,DC=x`)
    pub fn seed_object(&self, dn: &str) {
        self.state.lock().objects.insert(dn_key(dn));
    }

    /// Make `exists(dn)` fail with `kind`
    pub fn fail_exists(&self, dn: &str, kind: ErrorKind) {
        self.state
            .lock()
            .faults
            .insert((Operation::Exists, dn_key(dn)), kind);
    }

    /// Make creation of the container whose full DN is `dn` fail with `kind`
    pub fn fail_create(&self, dn: &str, kind: ErrorKind) {
        self.state
            .lock()
            .faults
            .insert((Operation::Create, dn_key(dn)), kind);
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.state.lock().journal.clone()
    }

    /// Number of `create_container` calls received so far
    pub fn create_calls(&self) -> usize {
        self.state
            .lock()
            .journal
            .iter()
            .filter(|c| matches!(c, DirectoryCall::CreateContainer { .. }))
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().journal.clear();
    }

    /// Containers ordered by DN key
    pub fn containers(&self) -> Vec<ContainerEntry> {
        self.state.lock().containers.values().cloned().collect()
    }

    pub fn contains(&self, dn: &str) -> bool {
        self.state.lock().contains(&dn_key(dn))
    }
}

fn injected(kind: ErrorKind, dn: &str) -> DirectoryError {
    DirectoryError::new(kind, format!("injected {} for {}", kind, dn))
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    async fn exists(&self, dn: &str) -> Result<bool> {
        let mut state = self.state.lock();
        state.journal.push(DirectoryCall::Exists(dn.to_string()));

        let key = dn_key(dn);
        if let Some(kind) = state.fault(Operation::Exists, &key) {
            return Err(injected(kind, dn));
        }
        Ok(state.contains(&key))
    }

    async fn create_container(&self, name: &str, parent: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.journal.push(DirectoryCall::CreateContainer {
            name: name.to_string(),
            parent: parent.to_string(),
        });

        let entry = ContainerEntry::new(name, parent);
        let key = dn_key(&entry.dn);

        if let Some(kind) = state.fault(Operation::Create, &key) {
            return Err(injected(kind, &entry.dn));
        }
        if !state.contains(&dn_key(parent)) {
            return Err(DirectoryError::no_such_parent(parent));
        }
        if state.contains(&key) {
            return Err(DirectoryError::already_exists(&entry.dn));
        }

        debug!("Created container {}", entry.dn);
        state.containers.insert(key, entry);
        Ok(())
    }
}
