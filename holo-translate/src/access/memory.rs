//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use enum_as_inner::EnumAsInner;
use serde::Serialize;
use serde_json::Value;

use crate::access::{Backend, DataStore};
use crate::diff;
use crate::error::{BackendError, BackendErrorKind};
use crate::path::InstancePath;
use crate::tree::{self, DataTree, Node};

// In-memory device session.
//
// Keeps one tree per datastore, canned replies for operational commands and
// a journal of every backend operation received. Failures can be injected
// to exercise the retry and error paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    config: DataTree,
    operational: DataTree,
    rpc_replies: HashMap<String, Node>,
    journal: Vec<JournalEntry>,
    read_failures: VecDeque<BackendErrorKind>,
    write_failures: VecDeque<BackendError>,
}

// Backend operation as received by the session.
#[derive(Clone, Debug, EnumAsInner, Eq, PartialEq)]
#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JournalEntry {
    Read(DataStore, InstancePath),
    Put(InstancePath, Node),
    Merge(InstancePath, Node),
    Delete(InstancePath),
    Rpc(String, Node),
}

// ===== impl MemoryBackend =====

impl MemoryBackend {
    pub fn new(config: DataTree) -> MemoryBackend {
        MemoryBackend {
            inner: Mutex::new(Inner {
                config,
                ..Default::default()
            }),
        }
    }

    #[must_use]
    pub fn with_operational(self, operational: DataTree) -> MemoryBackend {
        self.lock().operational = operational;
        self
    }

    pub fn set_rpc_reply(&self, operation: &str, reply: Node) {
        self.lock().rpc_replies.insert(operation.to_owned(), reply);
    }

    // Makes the next `count` reads fail with the given error kind.
    pub fn fail_next_reads(&self, count: usize, kind: BackendErrorKind) {
        let mut inner = self.lock();
        inner.read_failures.extend(std::iter::repeat_n(kind, count));
    }

    // Makes the next mutation fail with the given error.
    pub fn fail_next_write(&self, error: BackendError) {
        self.lock().write_failures.push_back(error);
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.lock().journal.clone()
    }

    // Journal entries that mutate backend state.
    pub fn writes(&self) -> Vec<JournalEntry> {
        self.lock()
            .journal
            .iter()
            .filter(|entry| entry.is_write())
            .cloned()
            .collect()
    }

    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    pub fn config(&self) -> DataTree {
        self.lock().config.clone()
    }

    // Assembled config node at the given path, bypassing the journal.
    pub fn config_node(&self, path: &InstancePath) -> Option<Node> {
        self.lock().config.subtree_node(path)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn read(
        &self,
        path: &InstancePath,
        store: DataStore,
    ) -> Result<Option<Node>, BackendError> {
        let mut inner = self.lock();
        inner.journal.push(JournalEntry::Read(store, path.clone()));
        if let Some(kind) = inner.read_failures.pop_front() {
            return Err(BackendError {
                kind,
                message: format!("injected read failure on {path}"),
            });
        }
        let tree = match store {
            DataStore::Config => &inner.config,
            DataStore::Operational => &inner.operational,
        };
        Ok(tree.subtree_node(path))
    }

    async fn put(
        &self,
        path: &InstancePath,
        node: &Node,
    ) -> Result<(), BackendError> {
        let mut inner = self.lock();
        inner
            .journal
            .push(JournalEntry::Put(path.clone(), node.clone()));
        inner.take_write_failure()?;
        replace(&mut inner.config, path, node.clone());
        Ok(())
    }

    async fn merge(
        &self,
        path: &InstancePath,
        node: &Node,
    ) -> Result<(), BackendError> {
        let mut inner = self.lock();
        inner
            .journal
            .push(JournalEntry::Merge(path.clone(), node.clone()));
        inner.take_write_failure()?;
        let merged = match inner.config.subtree_node(path) {
            Some(current) => diff::fold_forward(&current, node),
            None => node.clone(),
        };
        replace(&mut inner.config, path, merged);
        Ok(())
    }

    async fn delete(&self, path: &InstancePath) -> Result<(), BackendError> {
        let mut inner = self.lock();
        inner.journal.push(JournalEntry::Delete(path.clone()));
        inner.take_write_failure()?;
        remove(&mut inner.config, path);
        Ok(())
    }

    async fn invoke_rpc(
        &self,
        operation: &str,
        input: &Node,
    ) -> Result<Node, BackendError> {
        let mut inner = self.lock();
        inner
            .journal
            .push(JournalEntry::Rpc(operation.to_owned(), input.clone()));
        inner.rpc_replies.get(operation).cloned().ok_or_else(|| {
            BackendError::permanent(format!("unknown operation {operation}"))
        })
    }
}

// ===== impl Inner =====

impl Inner {
    fn take_write_failure(&mut self) -> Result<(), BackendError> {
        match self.write_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

// ===== impl JournalEntry =====

impl JournalEntry {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            JournalEntry::Put(..)
                | JournalEntry::Merge(..)
                | JournalEntry::Delete(..)
        )
    }

    pub fn path(&self) -> Option<&InstancePath> {
        match self {
            JournalEntry::Read(_, path)
            | JournalEntry::Put(path, _)
            | JournalEntry::Merge(path, _)
            | JournalEntry::Delete(path) => Some(path),
            JournalEntry::Rpc(..) => None,
        }
    }
}

impl std::fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JournalEntry::Read(store, path) => {
                write!(f, "read {store} {path}")
            }
            JournalEntry::Put(path, node) => write!(f, "put {path} {node}"),
            JournalEntry::Merge(path, node) => {
                write!(f, "merge {path} {node}")
            }
            JournalEntry::Delete(path) => write!(f, "delete {path}"),
            JournalEntry::Rpc(operation, input) => {
                write!(f, "rpc {operation} {input}")
            }
        }
    }
}

// ===== helper functions =====

fn replace(tree: &mut DataTree, path: &InstancePath, node: Node) {
    remove(tree, path);
    // Key fields live in the path.
    let node = match (node, path.key()) {
        (Value::Object(mut fields), Some(key)) => {
            for (name, _) in key.components() {
                fields.remove(name);
            }
            Value::Object(fields)
        }
        (node, _) => node,
    };
    tree.insert(path.clone(), node);
}

fn remove(tree: &mut DataTree, path: &InstancePath) {
    tree.remove_subtree(path);
    if let Some((ancestor, node)) = tree.stored_ancestor_mut(path) {
        if let Some(relative) = path.cut(&ancestor) {
            tree::remove_at(node, &relative);
        }
    }
}
