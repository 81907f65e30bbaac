//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use holo_translate::access::memory::MemoryBackend;
use holo_translate::access::{Access, DataStore};
use holo_translate::config::AccessConfig;
use holo_translate::context::{ReadContext, WriteContext};
use holo_translate::error::Result;
use holo_translate::path::{InstancePath, ListKey, path};
use holo_translate::reader::{ListReader, Reader};
use holo_translate::tree::{ChangeOp, DataTree, Node};
use holo_translate::writer::{Writer, WriterChild};
use serde_json::Value;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("holo_translate=trace")
            .with_test_writer()
            .try_init();
    });
}

// In-memory device session seeded with the given config store.
pub fn session(config: DataTree) -> (Arc<MemoryBackend>, Access) {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new(config));
    let access = Access::new(backend.clone(), AccessConfig::default());
    (backend, access)
}

pub fn snapshot(entries: BTreeMap<&str, Value>) -> DataTree {
    entries
        .into_iter()
        .map(|(instance, node)| (path(instance), node))
        .collect()
}

// Ordered log shared by stub handlers.
#[derive(Clone, Debug, Default)]
pub struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    pub fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

// Writer logging every invocation as "<name> <op> <path>".
pub struct RecordingWriter {
    pub name: &'static str,
    pub events: Events,
}

#[async_trait]
impl Writer for RecordingWriter {
    async fn write(
        &self,
        path: &InstancePath,
        _after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        self.events.push(format!("{} write {}", self.name, path));
        Ok(())
    }

    async fn delete(
        &self,
        path: &InstancePath,
        _before: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        self.events.push(format!("{} delete {}", self.name, path));
        Ok(())
    }
}

// Writer mirroring neutral nodes onto the same backend paths.
pub struct MirrorWriter {
    pub access: Access,
}

#[async_trait]
impl Writer for MirrorWriter {
    async fn write(
        &self,
        path: &InstancePath,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        self.access.safe_put(path, after).await
    }

    async fn update(
        &self,
        path: &InstancePath,
        before: &Node,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        self.access.safe_merge(path, before, path, after).await
    }

    async fn delete(
        &self,
        path: &InstancePath,
        before: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        self.access.safe_delete(path, before).await
    }
}

// Writer child with a fixed answer. Only handled operations are logged.
pub struct StubChild {
    pub name: &'static str,
    pub handles: bool,
    pub events: Events,
}

impl StubChild {
    fn answer(&self, op: ChangeOp, path: &InstancePath) -> Result<bool> {
        if self.handles {
            self.events.push(format!("{} {} {}", self.name, op, path));
        }
        Ok(self.handles)
    }
}

#[async_trait]
impl WriterChild for StubChild {
    async fn try_write(
        &self,
        path: &InstancePath,
        _after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<bool> {
        self.answer(ChangeOp::Create, path)
    }

    async fn try_update(
        &self,
        path: &InstancePath,
        _before: &Node,
        _after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<bool> {
        self.answer(ChangeOp::Update, path)
    }

    async fn try_delete(
        &self,
        path: &InstancePath,
        _before: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<bool> {
        self.answer(ChangeOp::Delete, path)
    }
}

// Reader returning a fixed node.
pub struct StaticReader(pub Value);

#[async_trait]
impl Reader for StaticReader {
    async fn read(
        &self,
        _path: &InstancePath,
        _ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        Ok(Some(self.0.clone()))
    }
}

// List reader returning fixed keys and no entry attributes.
pub struct StaticListReader(pub Vec<ListKey>);

#[async_trait]
impl Reader for StaticListReader {
    async fn read(
        &self,
        _path: &InstancePath,
        _ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        Ok(None)
    }
}

#[async_trait]
impl ListReader for StaticListReader {
    async fn list_keys(
        &self,
        _path: &InstancePath,
        _ctx: &mut ReadContext,
    ) -> Result<Vec<ListKey>> {
        Ok(self.0.clone())
    }
}

// Reader returning the backend config node at the same path.
pub struct BackendReader {
    pub access: Access,
}

#[async_trait]
impl Reader for BackendReader {
    async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        Ok(ctx
            .read_cached(&self.access, path, DataStore::Config)
            .await?)
    }
}
