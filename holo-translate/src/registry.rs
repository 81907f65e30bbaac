//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use itertools::Itertools;
use serde_json::{Map, Value};

use crate::check::{self, AlwaysCheck, Check};
use crate::config::{RegistryConfig, UnhandledPolicy};
use crate::context::ReadContext;
use crate::debug::Debug;
use crate::error::{Error, RegistryError, Result};
use crate::path::{InstancePath, ListKey};
use crate::reader::{ListReader, Reader};
use crate::tree::{self, DataTree, Node};
use crate::writer::Writer;

// Read side of a registration.
#[derive(Clone)]
pub enum ReadHandler {
    Node(Arc<dyn Reader>),
    List(Arc<dyn ListReader>),
    Structural,
}

// Write side of a registration.
#[derive(Clone)]
pub enum WriteHandler {
    Writer(Arc<dyn Writer>),
    Noop,
    Structural,
}

// Handlers bound to one schema path by one translation unit.
#[derive(Clone)]
struct Registration {
    unit: String,
    path: InstancePath,
    reader: Option<ReadHandler>,
    writer: Option<WriteHandler>,
    check: Option<Arc<dyn Check>>,
    after: Vec<InstancePath>,
    subtree: Vec<InstancePath>,
}

pub(crate) struct ReaderEntry {
    pub(crate) handler: ReadHandler,
    pub(crate) check: Arc<dyn Check>,
}

pub(crate) struct WriterEntry {
    pub(crate) handler: WriteHandler,
    pub(crate) check: Arc<dyn Check>,
    pub(crate) subtree: bool,
    seq: usize,
}

// Handler registry of one device session.
//
// Maps schema paths (paths without keys) to handlers, routes subtree
// members to their owners, and holds the order in which writers must be
// applied. Read-only once built, so it may be shared across tasks.
pub struct Registry {
    pub(crate) config: RegistryConfig,
    registrations: Vec<Registration>,
    pub(crate) readers: BTreeMap<InstancePath, ReaderEntry>,
    pub(crate) writers: BTreeMap<InstancePath, WriterEntry>,
    subtree_readers: BTreeMap<InstancePath, InstancePath>,
    pub(crate) subtree_writers: BTreeMap<InstancePath, InstancePath>,
    order: Vec<InstancePath>,
    pub(crate) rank: HashMap<InstancePath, usize>,
}

// Registration-time surface used by translation units.
//
// Registrations are chained: `path` starts a new registration, and the calls
// that follow attach handlers and options to it.
pub struct RegistryBuilder {
    config: RegistryConfig,
    unit: String,
    units: Vec<String>,
    current: Option<Registration>,
    registrations: Vec<Registration>,
    errors: Vec<RegistryError>,
}

// ===== impl Registry =====

impl Registry {
    pub fn builder(config: RegistryConfig) -> RegistryBuilder {
        RegistryBuilder::new(config)
    }

    fn compile(
        config: RegistryConfig,
        registrations: Vec<Registration>,
    ) -> std::result::Result<Registry, RegistryError> {
        let mut readers = BTreeMap::new();
        let mut writers = BTreeMap::new();
        for (seq, reg) in registrations.iter().enumerate() {
            let check = reg
                .check
                .clone()
                .unwrap_or_else(|| Arc::new(AlwaysCheck) as Arc<dyn Check>);
            if let Some(handler) = &reg.reader {
                if readers.contains_key(&reg.path) {
                    return Err(RegistryError::DuplicateReader(reg.path.clone()));
                }
                let entry = ReaderEntry {
                    handler: handler.clone(),
                    check: check.clone(),
                };
                readers.insert(reg.path.clone(), entry);
            }
            if let Some(handler) = &reg.writer {
                if writers.contains_key(&reg.path) {
                    return Err(RegistryError::DuplicateWriter(reg.path.clone()));
                }
                let entry = WriterEntry {
                    handler: handler.clone(),
                    check,
                    subtree: !reg.subtree.is_empty(),
                    seq,
                };
                writers.insert(reg.path.clone(), entry);
            }
        }

        // Subtree members must not be owned by anything else.
        let mut subtree_readers = BTreeMap::new();
        let mut subtree_writers = BTreeMap::new();
        for reg in &registrations {
            for relative in &reg.subtree {
                let member = reg.path.join(relative);
                if reg.reader.is_some()
                    && (readers.contains_key(&member)
                        || subtree_readers
                            .insert(member.clone(), reg.path.clone())
                            .is_some())
                {
                    return Err(RegistryError::SubtreeConflict(member));
                }
                if reg.writer.is_some()
                    && (writers.contains_key(&member)
                        || subtree_writers
                            .insert(member.clone(), reg.path.clone())
                            .is_some())
                {
                    return Err(RegistryError::SubtreeConflict(member));
                }
            }
        }

        // Sibling gates of composite readers must be exclusive.
        for (path, entry) in &readers {
            match &entry.handler {
                ReadHandler::Node(reader) => {
                    check::validate_exclusive(path, reader.checks())?
                }
                ReadHandler::List(reader) => {
                    check::validate_exclusive(path, reader.checks())?
                }
                ReadHandler::Structural => (),
            }
        }

        let order =
            topological_order(&registrations, &writers, &subtree_writers)?;
        let rank = order
            .iter()
            .enumerate()
            .map(|(rank, path)| (path.clone(), rank))
            .collect();

        Debug::RegistryBuild(readers.len(), writers.len()).log();

        Ok(Registry {
            config,
            registrations,
            readers,
            writers,
            subtree_readers,
            subtree_writers,
            order,
            rank,
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // Names of the translation units with at least one registration.
    pub fn units(&self) -> Vec<&str> {
        self.registrations
            .iter()
            .map(|reg| reg.unit.as_str())
            .unique()
            .collect()
    }

    // Schema paths of all writers, in the order they are applied.
    pub fn writer_order(&self) -> &[InstancePath] {
        &self.order
    }

    pub fn has_reader(&self, path: &InstancePath) -> bool {
        let schema = path.wildcard();
        self.readers.contains_key(&schema)
            || self.subtree_readers.contains_key(&schema)
    }

    pub fn has_writer(&self, path: &InstancePath) -> bool {
        let schema = path.wildcard();
        self.writers.contains_key(&schema)
            || self.subtree_writers.contains_key(&schema)
    }

    // Removes every registration of a translation unit in one step.
    //
    // On failure the registry is left untouched.
    pub fn remove_unit(
        &mut self,
        name: &str,
    ) -> std::result::Result<(), RegistryError> {
        if !self.registrations.iter().any(|reg| reg.unit == name) {
            return Err(RegistryError::UnitNotFound(name.to_owned()));
        }
        let remaining = self
            .registrations
            .iter()
            .filter(|reg| reg.unit != name)
            .cloned()
            .collect();
        let registry = match Registry::compile(self.config.clone(), remaining)
        {
            Ok(registry) => registry,
            Err(RegistryError::UnresolvedPredecessor(path, _)) => {
                return Err(RegistryError::DependentRegistration(
                    name.to_owned(),
                    path,
                ));
            }
            Err(error) => return Err(error),
        };
        *self = registry;
        Debug::UnitUnregister(name).log();
        Ok(())
    }

    // Reads the attributes of one neutral node.
    //
    // A list path (last step without key) yields an array with every entry
    // of the list. Paths owned by a subtree registration are read through
    // their owner.
    pub async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        let schema = path.wildcard();
        if let Some(entry) = self.readers.get(&schema) {
            return self.read_entry(entry, path, ctx).await;
        }
        if let Some(owner) = self.subtree_readers.get(&schema) {
            let owner_path = path.truncate(owner.len());
            let Some(entry) = self.readers.get(owner) else {
                return Err(Error::NoHandler(path.clone()));
            };
            let node = self.read_entry(entry, &owner_path, ctx).await?;
            let relative = path.cut(&owner_path).unwrap_or_default();
            return Ok(node.and_then(|node| tree::descend(&node, &relative).cloned()));
        }
        Err(Error::NoHandler(path.clone()))
    }

    async fn read_entry(
        &self,
        entry: &ReaderEntry,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        if !entry.check.applicable(path, &*ctx) {
            return Ok(None);
        }
        match &entry.handler {
            ReadHandler::Node(reader) => reader.read(path, ctx).await,
            ReadHandler::List(reader) if path.key().is_none() => {
                let mut entries = vec![];
                for key in reader.list_keys(path, ctx).await? {
                    let entry_path = path.with_key(key.clone());
                    let mut node = reader
                        .read(&entry_path, ctx)
                        .await?
                        .unwrap_or_else(|| Value::Object(Map::new()));
                    tree::inject_key(&mut node, &key);
                    entries.push(node);
                }
                Ok((!entries.is_empty()).then_some(Value::Array(entries)))
            }
            ReadHandler::List(reader) => reader.read(path, ctx).await,
            ReadHandler::Structural => Ok(Some(Value::Object(Map::new()))),
        }
    }

    // Keys of the entries of a neutral list.
    pub async fn list_keys(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Vec<ListKey>> {
        let schema = path.wildcard();
        match self.readers.get(&schema) {
            Some(ReaderEntry {
                handler: ReadHandler::List(reader),
                check,
            }) => {
                if !check.applicable(path, &*ctx) {
                    return Ok(vec![]);
                }
                reader.list_keys(path, ctx).await
            }
            _ => Err(Error::NoHandler(path.clone())),
        }
    }

    // Reads the whole neutral subtree rooted at the given path into a flat
    // snapshot.
    //
    // Structural nodes produce empty entries. List entries are kept even
    // when none of their attributes could be read. Absent containers are not
    // descended into.
    pub async fn read_tree(
        &self,
        root: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<DataTree> {
        let mut tree = DataTree::new();
        self.walk(root.clone(), ctx, &mut tree).await?;
        Ok(tree)
    }

    fn walk<'a>(
        &'a self,
        path: InstancePath,
        ctx: &'a mut ReadContext,
        tree: &'a mut DataTree,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            let schema = path.wildcard();
            let entry = self.readers.get(&schema);

            // List level: visit every entry.
            let is_list = matches!(
                entry,
                Some(ReaderEntry {
                    handler: ReadHandler::List(_),
                    ..
                })
            );
            if is_list && path.key().is_none() {
                for key in self.list_keys(&path, &mut *ctx).await? {
                    self.walk(path.with_key(key), &mut *ctx, &mut *tree)
                        .await?;
                }
                return Ok(());
            }

            match entry {
                Some(_) => match self.read(&path, &mut *ctx).await? {
                    Some(node) => {
                        tree.insert(path.clone(), node);
                    }
                    None if path.key().is_some() => {
                        tree.insert(path.clone(), Value::Object(Map::new()));
                    }
                    None => return Ok(()),
                },
                // Subtree members are part of their owner's node.
                None if self.subtree_readers.contains_key(&schema) => {
                    return Ok(());
                }
                None => (),
            }

            for child in self.child_schemas(&schema) {
                let Some(step) = child.last() else {
                    continue;
                };
                self.walk(path.child(step.node.clone()), &mut *ctx, &mut *tree)
                    .await?;
            }
            Ok(())
        }
        .boxed()
    }

    // Next steps towards every registered reader below a schema path.
    fn child_schemas(&self, schema: &InstancePath) -> Vec<InstancePath> {
        let len = schema.len() + 1;
        self.readers
            .keys()
            .filter(|path| path.descends_from(schema))
            .map(|path| path.truncate(len))
            .dedup()
            .collect()
    }

    // Nests a flat snapshot into a single node.
    //
    // Lists are attached through the `merge` step of their reader, if any.
    pub fn assemble(&self, tree: &DataTree, root: &InstancePath) -> Option<Node> {
        let is_list = root.last().is_some_and(|step| step.key.is_none());
        if is_list && tree.list_entries(root).next().is_some() {
            let entries = tree
                .list_entries(root)
                .map(|(path, _)| {
                    let mut entry = self.assemble_node(tree, path);
                    if let Some(key) = path.key() {
                        tree::inject_key(&mut entry, key);
                    }
                    entry
                })
                .collect();
            return Some(Value::Array(entries));
        }
        if !tree.contains(root) && tree.descendants(root).next().is_none() {
            return None;
        }
        Some(self.assemble_node(tree, root))
    }

    fn assemble_node(&self, tree: &DataTree, path: &InstancePath) -> Node {
        let mut node = match tree.get(path) {
            Some(Value::Object(fields)) => Value::Object(fields.clone()),
            Some(other) => return other.clone(),
            None => Value::Object(Map::new()),
        };

        let len = path.len() + 1;
        let children = tree
            .descendants(path)
            .map(|(child, _)| child.truncate(len))
            .dedup()
            .collect::<Vec<_>>();
        let mut lists: Vec<(String, Vec<(ListKey, Node)>)> = vec![];
        for child in &children {
            let Some(step) = child.last() else {
                continue;
            };
            let child_node = self.assemble_node(tree, child);
            match &step.key {
                Some(key) => {
                    match lists.iter_mut().find(|(name, _)| *name == step.node) {
                        Some((_, entries)) => {
                            entries.push((key.clone(), child_node))
                        }
                        None => lists.push((
                            step.node.clone(),
                            vec![(key.clone(), child_node)],
                        )),
                    }
                }
                None => {
                    if let Some(fields) = node.as_object_mut() {
                        fields.insert(step.node.clone(), child_node);
                    }
                }
            }
        }

        for (name, entries) in lists {
            let schema = path.child(name.as_str()).wildcard();
            match self.readers.get(&schema).map(|entry| &entry.handler) {
                Some(ReadHandler::List(reader)) => {
                    reader.merge(&mut node, &name, entries)
                }
                _ => tree::attach_list(&mut node, &name, entries),
            }
        }

        node
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("readers", &self.readers.keys().collect::<Vec<_>>())
            .field("writers", &self.order)
            .finish()
    }
}

// ===== impl RegistryBuilder =====

impl RegistryBuilder {
    pub fn new(config: RegistryConfig) -> Self {
        RegistryBuilder {
            config,
            unit: String::new(),
            units: vec![],
            current: None,
            registrations: vec![],
            errors: vec![],
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // Policy composite writers should adopt for unhandled operations.
    pub fn unhandled_policy(&self) -> UnhandledPolicy {
        self.config.unhandled
    }

    // Attributes the registrations that follow to a translation unit.
    #[must_use]
    pub fn unit(mut self, name: &str) -> Self {
        self.flush();
        if self.units.iter().any(|unit| unit == name) {
            self.errors
                .push(RegistryError::DuplicateUnit(name.to_owned()));
        } else {
            self.units.push(name.to_owned());
        }
        self.unit = name.to_owned();
        self
    }

    // Starts a new registration. Keys in the path are ignored.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.flush();
        match InstancePath::parse(path) {
            Ok(path) => {
                self.current = Some(Registration {
                    unit: self.unit.clone(),
                    path: path.wildcard(),
                    reader: None,
                    writer: None,
                    check: None,
                    after: vec![],
                    subtree: vec![],
                });
            }
            Err(error) => {
                self.errors
                    .push(RegistryError::InvalidPath(path.to_owned(), error));
            }
        }
        self
    }

    #[must_use]
    pub fn reader(self, reader: impl Reader + 'static) -> Self {
        self.set_reader(ReadHandler::Node(Arc::new(reader)))
    }

    #[must_use]
    pub fn list_reader(self, reader: impl ListReader + 'static) -> Self {
        self.set_reader(ReadHandler::List(Arc::new(reader)))
    }

    #[must_use]
    pub fn writer(self, writer: impl Writer + 'static) -> Self {
        self.set_writer(WriteHandler::Writer(Arc::new(writer)))
    }

    // Pure container: reads synthesize an empty node and writes follow the
    // structural write policy.
    #[must_use]
    pub fn structural(self) -> Self {
        self.set_reader(ReadHandler::Structural)
            .set_writer(WriteHandler::Structural)
    }

    // Node without backend counterpart: its changes are discarded.
    #[must_use]
    pub fn noop(self) -> Self {
        self.set_writer(WriteHandler::Noop)
    }

    // Writes to this path are applied after writes to the given paths.
    #[must_use]
    pub fn after(mut self, paths: &[&str]) -> Self {
        for path in paths {
            match InstancePath::parse(path) {
                Ok(path) => self.update(|reg| {
                    reg.after.push(path.wildcard());
                    Ok(())
                }),
                Err(error) => self.errors.push(RegistryError::InvalidPath(
                    (*path).to_owned(),
                    error,
                )),
            }
        }
        self
    }

    #[must_use]
    pub fn check(mut self, check: impl Check + 'static) -> Self {
        let check: Arc<dyn Check> = Arc::new(check);
        self.update(|reg| {
            reg.check = Some(check);
            Ok(())
        });
        self
    }

    // Descendant paths, relative to this one, whose reads and writes are
    // routed to this registration's handlers.
    #[must_use]
    pub fn subtree(mut self, paths: &[&str]) -> Self {
        for path in paths {
            match InstancePath::parse(path) {
                Ok(path) => self.update(|reg| {
                    reg.subtree.push(path.wildcard());
                    Ok(())
                }),
                Err(error) => self.errors.push(RegistryError::InvalidPath(
                    (*path).to_owned(),
                    error,
                )),
            }
        }
        self
    }

    pub fn build(mut self) -> std::result::Result<Registry, RegistryError> {
        self.flush();
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        for unit in &self.units {
            Debug::UnitRegister(unit).log();
        }
        Registry::compile(self.config, self.registrations)
    }

    #[must_use]
    fn set_reader(mut self, handler: ReadHandler) -> Self {
        self.update(|reg| {
            if reg.reader.is_some() {
                return Err(RegistryError::DuplicateReader(reg.path.clone()));
            }
            reg.reader = Some(handler);
            Ok(())
        });
        self
    }

    #[must_use]
    fn set_writer(mut self, handler: WriteHandler) -> Self {
        self.update(|reg| {
            if reg.writer.is_some() {
                return Err(RegistryError::DuplicateWriter(reg.path.clone()));
            }
            reg.writer = Some(handler);
            Ok(())
        });
        self
    }

    fn update<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Registration) -> std::result::Result<(), RegistryError>,
    {
        let result = match &mut self.current {
            Some(reg) => f(reg),
            None => Err(RegistryError::MissingPath),
        };
        if let Err(error) = result {
            self.errors.push(error);
        }
    }

    fn flush(&mut self) {
        if let Some(reg) = self.current.take() {
            self.registrations.push(reg);
        }
    }
}

// ===== helper functions =====

// Orders writer paths so that every path comes after its declared
// predecessors and after its ancestors. Ties are broken by registration
// order.
fn topological_order(
    registrations: &[Registration],
    writers: &BTreeMap<InstancePath, WriterEntry>,
    subtree_writers: &BTreeMap<InstancePath, InstancePath>,
) -> std::result::Result<Vec<InstancePath>, RegistryError> {
    let mut successors: HashMap<&InstancePath, BTreeSet<&InstancePath>> =
        HashMap::new();
    let mut indegree: HashMap<&InstancePath, usize> =
        writers.keys().map(|path| (path, 0)).collect();

    fn add_edge<'a>(
        successors: &mut HashMap<&'a InstancePath, BTreeSet<&'a InstancePath>>,
        indegree: &mut HashMap<&'a InstancePath, usize>,
        from: &'a InstancePath,
        to: &'a InstancePath,
    ) {
        if !successors.entry(from).or_default().insert(to) {
            return;
        }
        if let Some(degree) = indegree.get_mut(to) {
            *degree += 1;
        }
    }

    // Declared predecessors.
    for reg in registrations.iter().filter(|reg| reg.writer.is_some()) {
        let Some((path, _)) = writers.get_key_value(&reg.path) else {
            continue;
        };
        for predecessor in &reg.after {
            let owner = subtree_writers.get(predecessor).unwrap_or(predecessor);
            let Some((predecessor, _)) = writers.get_key_value(owner) else {
                return Err(RegistryError::UnresolvedPredecessor(
                    reg.path.clone(),
                    predecessor.clone(),
                ));
            };
            add_edge(&mut successors, &mut indegree, predecessor, path);
        }
    }

    // Ancestors before descendants.
    for child in writers.keys() {
        for parent in writers.keys().filter(|parent| child.descends_from(parent))
        {
            add_edge(&mut successors, &mut indegree, parent, child);
        }
    }

    let seq = |path: &InstancePath| writers.get(path).map_or(0, |e| e.seq);
    let mut ready = indegree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(path, _)| (seq(path), *path))
        .collect::<BTreeSet<_>>();
    let mut order = Vec::with_capacity(writers.len());
    while let Some((_, path)) = ready.pop_first() {
        order.push(path.clone());
        for successor in successors.get(path).into_iter().flatten() {
            if let Some(degree) = indegree.get_mut(successor) {
                *degree -= 1;
                if *degree == 0 {
                    ready.insert((seq(successor), *successor));
                }
            }
        }
    }

    if order.len() < writers.len() {
        let cycle = indegree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(path, _)| path.clone())
            .sorted()
            .collect();
        return Err(RegistryError::Cycle(cycle));
    }

    Ok(order)
}
