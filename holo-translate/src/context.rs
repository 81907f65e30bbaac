//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::HashMap;

use serde_json::Value;

use crate::access::{Access, DataStore};
use crate::check::CheckContext;
use crate::error::ReadError;
use crate::path::InstancePath;
use crate::tree::{DataTree, Node};

// State of a single read request.
//
// Holds the discriminators resolved so far and a cache of backend reads, so
// that gates and handlers never read the same backend node twice within one
// request. Dropped when the request completes.
#[derive(Debug, Default)]
pub struct ReadContext {
    discriminators: HashMap<(InstancePath, String), String>,
    cache: HashMap<(InstancePath, DataStore), Option<Node>>,
}

// Read-only view of the neutral snapshots of one write transaction.
#[derive(Clone, Copy, Debug)]
pub struct WriteContext<'a> {
    before: &'a DataTree,
    after: &'a DataTree,
}

// ===== impl ReadContext =====

impl ReadContext {
    pub fn new() -> ReadContext {
        ReadContext::default()
    }

    pub fn record_discriminator(
        &mut self,
        holder: &InstancePath,
        field: &str,
        value: impl Into<String>,
    ) {
        self.discriminators
            .insert((holder.clone(), field.to_owned()), value.into());
    }

    // Backend read served from the request cache when possible.
    pub async fn read_cached(
        &mut self,
        access: &Access,
        path: &InstancePath,
        store: DataStore,
    ) -> Result<Option<Node>, ReadError> {
        let key = (path.clone(), store);
        if let Some(node) = self.cache.get(&key) {
            return Ok(node.clone());
        }
        let node = access.read(path, store).await?;
        self.cache.insert(key, node.clone());
        Ok(node)
    }
}

impl CheckContext for ReadContext {
    fn discriminator(
        &self,
        holder: &InstancePath,
        field: &str,
    ) -> Option<String> {
        self.discriminators
            .get(&(holder.clone(), field.to_owned()))
            .cloned()
    }
}

// ===== impl WriteContext =====

impl<'a> WriteContext<'a> {
    pub fn new(before: &'a DataTree, after: &'a DataTree) -> Self {
        WriteContext { before, after }
    }

    pub fn read_before(&self, path: &InstancePath) -> Option<&'a Node> {
        self.before.get(path)
    }

    pub fn read_after(&self, path: &InstancePath) -> Option<&'a Node> {
        self.after.get(path)
    }

    // Assembled subtrees, for handlers owning more than one neutral node.
    pub fn subtree_before(&self, path: &InstancePath) -> Option<Node> {
        self.before.subtree_node(path)
    }

    pub fn subtree_after(&self, path: &InstancePath) -> Option<Node> {
        self.after.subtree_node(path)
    }

    pub fn descendants_after(
        &self,
        path: &'a InstancePath,
    ) -> impl Iterator<Item = (&'a InstancePath, &'a Node)> + 'a {
        self.after.descendants(path)
    }

    pub fn before(&self) -> &'a DataTree {
        self.before
    }

    pub fn after(&self) -> &'a DataTree {
        self.after
    }
}

impl CheckContext for WriteContext<'_> {
    fn discriminator(
        &self,
        holder: &InstancePath,
        field: &str,
    ) -> Option<String> {
        self.after
            .get(holder)
            .or_else(|| self.before.get(holder))
            .and_then(|node| node.get(field))
            .map(field_value)
    }
}

// ===== global functions =====

// String form of a scalar field.
pub fn field_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
