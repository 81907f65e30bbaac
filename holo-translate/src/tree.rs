//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path::{InstancePath, ListKey, PathStep};

// Tree node. Objects carry the node's own fields; scalars and arrays are
// treated as opaque values.
pub type Node = Value;

// Flat snapshot of a tree, indexed by instance path.
//
// In neutral snapshots every entry carries only its own fields, and child
// containers and list entries are separate entries. Backend snapshots may
// also store nested values, which are then navigated with `descend`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(transparent)]
pub struct DataTree(BTreeMap<InstancePath, Node>);

// Single difference between two snapshots.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Change {
    pub op: ChangeOp,
    pub path: InstancePath,
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Create,
    Update,
    Delete,
}

// ===== impl DataTree =====

impl DataTree {
    pub fn new() -> DataTree {
        DataTree::default()
    }

    pub fn get(&self, path: &InstancePath) -> Option<&Node> {
        self.0.get(path)
    }

    pub fn contains(&self, path: &InstancePath) -> bool {
        self.0.contains_key(path)
    }

    pub fn insert(&mut self, path: InstancePath, node: Node) -> Option<Node> {
        self.0.insert(path, node)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InstancePath, &Node)> {
        self.0.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &InstancePath> {
        self.0.keys()
    }

    // Removes the node at the given path and all of its descendants.
    pub fn remove_subtree(&mut self, path: &InstancePath) -> bool {
        let removed = self
            .descendants(path)
            .map(|(path, _)| path.clone())
            .collect::<Vec<_>>();
        let mut found = self.0.remove(path).is_some();
        for path in removed {
            self.0.remove(&path);
            found = true;
        }
        found
    }

    // Strict descendants of the given path, in path order.
    pub fn descendants<'a>(
        &'a self,
        path: &'a InstancePath,
    ) -> impl Iterator<Item = (&'a InstancePath, &'a Node)> + 'a {
        self.0
            .range(path.clone()..)
            .skip_while(move |(p, _)| *p == path)
            .take_while(move |(p, _)| p.descends_from(path))
    }

    // Direct children of the given path, in path order.
    pub fn children<'a>(
        &'a self,
        path: &'a InstancePath,
    ) -> impl Iterator<Item = (&'a InstancePath, &'a Node)> + 'a {
        let len = path.len() + 1;
        self.descendants(path).filter(move |(p, _)| p.len() == len)
    }

    // Entries of the list identified by a path whose last step has no key.
    pub fn list_entries<'a>(
        &'a self,
        list: &'a InstancePath,
    ) -> impl Iterator<Item = (&'a InstancePath, &'a Node)> + 'a {
        let parent = list.parent().unwrap_or_default();
        self.0
            .range(parent.clone()..)
            .take_while(move |(p, _)| p.starts_with(&parent))
            .filter(move |(p, _)| {
                p.len() == list.len() && p.key().is_some() && p.starts_with(list)
            })
    }

    // Assembles the nested node rooted at the given path.
    //
    // A path whose last step is a list without key yields an array holding
    // every entry of that list. A path that falls inside a stored nested
    // value is resolved by descending into the nearest stored ancestor.
    pub fn subtree_node(&self, path: &InstancePath) -> Option<Node> {
        if self.0.contains_key(path) || self.descendants(path).next().is_some()
        {
            return Some(self.build(path));
        }

        let is_list = path.last().is_some_and(|step| step.key.is_none());
        if is_list && !path.is_root() {
            let entries = self
                .list_entries(path)
                .map(|(p, _)| self.build_entry(p))
                .collect::<Vec<_>>();
            if !entries.is_empty() {
                return Some(Value::Array(entries));
            }
        }

        let (ancestor, node) = self.stored_ancestor(path)?;
        let relative = path.cut(&ancestor)?;
        descend(node, &relative).cloned()
    }

    // Nearest strict ancestor of the given path with a stored value.
    pub fn stored_ancestor(
        &self,
        path: &InstancePath,
    ) -> Option<(InstancePath, &Node)> {
        (0..path.len()).rev().find_map(|len| {
            let ancestor = path.truncate(len);
            self.0.get(&ancestor).map(|node| (ancestor, node))
        })
    }

    pub fn stored_ancestor_mut(
        &mut self,
        path: &InstancePath,
    ) -> Option<(InstancePath, &mut Node)> {
        let ancestor = (0..path.len())
            .rev()
            .map(|len| path.truncate(len))
            .find(|ancestor| self.0.contains_key(ancestor))?;
        let node = self.0.get_mut(&ancestor)?;
        Some((ancestor, node))
    }

    fn build(&self, path: &InstancePath) -> Node {
        let mut fields = match self.0.get(path) {
            Some(Value::Object(fields)) => fields.clone(),
            Some(other) => return other.clone(),
            None => Map::new(),
        };

        // Intermediate containers need not be stored.
        let len = path.len() + 1;
        let children = self
            .descendants(path)
            .map(|(p, _)| p.truncate(len))
            .dedup()
            .collect::<Vec<_>>();
        for child in &children {
            let Some(step) = child.last() else {
                continue;
            };
            if step.key.is_some() {
                let entry = self.build_entry(child);
                match fields
                    .entry(step.node.clone())
                    .or_insert_with(|| Value::Array(vec![]))
                {
                    Value::Array(entries) => entries.push(entry),
                    other => *other = Value::Array(vec![entry]),
                }
            } else {
                fields.insert(step.node.clone(), self.build(child));
            }
        }

        Value::Object(fields)
    }

    fn build_entry(&self, path: &InstancePath) -> Node {
        let mut entry = self.build(path);
        if let Some(key) = path.key() {
            inject_key(&mut entry, key);
        }
        entry
    }
}

impl FromIterator<(InstancePath, Node)> for DataTree {
    fn from_iter<I: IntoIterator<Item = (InstancePath, Node)>>(
        iter: I,
    ) -> DataTree {
        DataTree(iter.into_iter().collect())
    }
}

// ===== impl ChangeOp =====

impl std::fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeOp::Create => write!(f, "create"),
            ChangeOp::Update => write!(f, "update"),
            ChangeOp::Delete => write!(f, "delete"),
        }
    }
}

// ===== global functions =====

// Computes the per-node differences between two neutral snapshots.
pub fn changes(before: &DataTree, after: &DataTree) -> Vec<Change> {
    let mut changes = vec![];

    for (path, node) in before.iter() {
        match after.get(path) {
            None => changes.push(Change {
                op: ChangeOp::Delete,
                path: path.clone(),
            }),
            Some(new) if new != node => changes.push(Change {
                op: ChangeOp::Update,
                path: path.clone(),
            }),
            Some(_) => (),
        }
    }
    for path in after.paths().filter(|path| !before.contains(path)) {
        changes.push(Change {
            op: ChangeOp::Create,
            path: path.clone(),
        });
    }

    changes.sort_by(|a, b| a.path.cmp(&b.path));
    changes
}

// Navigates a nested node along a relative path.
pub fn descend<'a>(node: &'a Node, relative: &InstancePath) -> Option<&'a Node> {
    relative
        .steps()
        .iter()
        .try_fold(node, |node, step| descend_step(node, step))
}

pub fn descend_mut<'a>(
    node: &'a mut Node,
    relative: &InstancePath,
) -> Option<&'a mut Node> {
    let mut node = node;
    for step in relative.steps() {
        let child = node.get_mut(&step.node)?;
        node = match &step.key {
            Some(key) => child
                .as_array_mut()?
                .iter_mut()
                .find(|entry| key_matches(entry, key))?,
            None => child,
        };
    }
    Some(node)
}

// Removes the value located at a relative path inside a nested node.
pub fn remove_at(node: &mut Node, relative: &InstancePath) -> Option<Node> {
    let last = relative.last()?;
    let parent = descend_mut(node, &relative.truncate(relative.len() - 1))?;
    match &last.key {
        Some(key) => {
            let entries = parent.get_mut(&last.node)?.as_array_mut()?;
            let pos = entries.iter().position(|entry| key_matches(entry, key))?;
            Some(entries.remove(pos))
        }
        None => parent.as_object_mut()?.remove(&last.node),
    }
}

// Attaches a read list into its parent's in-progress result.
pub fn attach_list(parent: &mut Node, list: &str, entries: Vec<(ListKey, Node)>) {
    if entries.is_empty() {
        return;
    }
    let entries = entries
        .into_iter()
        .map(|(key, mut entry)| {
            inject_key(&mut entry, &key);
            entry
        })
        .collect();
    if !parent.is_object() {
        *parent = Value::Object(Map::new());
    }
    if let Some(fields) = parent.as_object_mut() {
        fields.insert(list.to_owned(), Value::Array(entries));
    }
}

// Copies the key components of a list entry into its fields.
pub fn inject_key(entry: &mut Node, key: &ListKey) {
    if entry.is_null() {
        *entry = Value::Object(Map::new());
    }
    if let Some(fields) = entry.as_object_mut() {
        for (name, value) in key.components() {
            fields
                .entry(name.to_owned())
                .or_insert_with(|| Value::String(value.to_owned()));
        }
    }
}

// Returns true when the given node has no fields.
pub fn is_empty(node: &Node) -> bool {
    match node {
        Value::Null => true,
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

fn descend_step<'a>(node: &'a Node, step: &PathStep) -> Option<&'a Node> {
    let child = node.get(&step.node)?;
    match &step.key {
        Some(key) => child
            .as_array()?
            .iter()
            .find(|entry| key_matches(entry, key)),
        None => Some(child),
    }
}

fn key_matches(entry: &Node, key: &ListKey) -> bool {
    key.components().all(|(name, value)| match entry.get(name) {
        Some(Value::String(s)) => s == value,
        Some(other) => other.to_string() == value,
        None => false,
    })
}

// ===== unit tests =====
