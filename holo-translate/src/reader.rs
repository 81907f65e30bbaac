//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;

use async_trait::async_trait;
use derive_new::new;

use crate::check::Check;
use crate::context::ReadContext;
use crate::debug::Debug;
use crate::diff;
use crate::error::Result;
use crate::path::{InstancePath, ListKey};
use crate::tree::{self, Node};

// Handler producing the attributes of one neutral node.
//
// Readers must be idempotent and free of side effects: they may be invoked
// any number of times for the same path within one request.
#[async_trait]
pub trait Reader: Send + Sync {
    async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>>;

    // Gates of the children of a composite reader.
    fn checks(&self) -> Vec<&dyn Check> {
        vec![]
    }
}

// Handler of a neutral list.
//
// `list_keys` receives the list path (last step without key) and `read`
// receives the path of one entry.
#[async_trait]
pub trait ListReader: Reader {
    async fn list_keys(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Vec<ListKey>>;

    // Attaches the entries read for this list to the parent's result.
    fn merge(&self, parent: &mut Node, list: &str, entries: Vec<(ListKey, Node)>) {
        tree::attach_list(parent, list, entries);
    }
}

// Gated child of a composite reader.
#[derive(new)]
pub struct ReaderChild<R: ?Sized> {
    check: Arc<dyn Check>,
    reader: Arc<R>,
}

// Singleton composite reader.
//
// Every applicable child contributes to the result. When two children
// produce the same field, the first one in registration order wins.
#[derive(Default)]
pub struct CompositeReader {
    children: Vec<ReaderChild<dyn Reader>>,
}

// List composite reader.
#[derive(Default)]
pub struct CompositeListReader {
    children: Vec<ReaderChild<dyn ListReader>>,
}

// ===== impl CompositeReader =====

impl CompositeReader {
    #[must_use]
    pub fn child(
        mut self,
        check: impl Check + 'static,
        reader: impl Reader + 'static,
    ) -> Self {
        let reader: Arc<dyn Reader> = Arc::new(reader);
        self.children.push(ReaderChild::new(Arc::new(check), reader));
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[async_trait]
impl Reader for CompositeReader {
    async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        let mut result: Option<Node> = None;
        for (idx, child) in self.children.iter().enumerate() {
            if !child.check.applicable(path, &*ctx) {
                Debug::CheckRejected(path, idx).log();
                continue;
            }
            let Some(node) = child.reader.read(path, ctx).await? else {
                continue;
            };
            match &mut result {
                Some(acc) => diff::fill_missing(acc, &node),
                None => result = Some(node),
            }
        }
        Ok(result)
    }

    fn checks(&self) -> Vec<&dyn Check> {
        self.children
            .iter()
            .map(|child| child.check.as_ref())
            .collect()
    }
}

// ===== impl CompositeListReader =====

impl CompositeListReader {
    #[must_use]
    pub fn child(
        mut self,
        check: impl Check + 'static,
        reader: impl ListReader + 'static,
    ) -> Self {
        let reader: Arc<dyn ListReader> = Arc::new(reader);
        self.children.push(ReaderChild::new(Arc::new(check), reader));
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[async_trait]
impl Reader for CompositeListReader {
    // The first applicable child returning non-empty attributes wins.
    async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        for (idx, child) in self.children.iter().enumerate() {
            if !child.check.applicable(path, &*ctx) {
                Debug::CheckRejected(path, idx).log();
                continue;
            }
            match child.reader.read(path, ctx).await? {
                Some(node) if !tree::is_empty(&node) => return Ok(Some(node)),
                _ => (),
            }
        }
        Ok(None)
    }

    fn checks(&self) -> Vec<&dyn Check> {
        self.children
            .iter()
            .map(|child| child.check.as_ref())
            .collect()
    }
}

#[async_trait]
impl ListReader for CompositeListReader {
    // Union of the keys of all applicable children, in child order. Keys
    // reported by more than one child keep their first position.
    async fn list_keys(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Vec<ListKey>> {
        let mut keys: Vec<ListKey> = vec![];
        for (idx, child) in self.children.iter().enumerate() {
            if !child.check.applicable(path, &*ctx) {
                Debug::CheckRejected(path, idx).log();
                continue;
            }
            for key in child.reader.list_keys(path, ctx).await? {
                // Gates keyed on the entry itself are decided here.
                let entry = path.with_key(key.clone());
                if !child.check.applicable(&entry, &*ctx) {
                    Debug::CheckRejected(&entry, idx).log();
                    continue;
                }
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }
}
