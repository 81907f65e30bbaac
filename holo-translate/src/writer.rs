//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::UnhandledPolicy;
use crate::context::WriteContext;
use crate::debug::Debug;
use crate::error::{Error, Result};
use crate::path::InstancePath;
use crate::tree::{ChangeOp, Node};

// Handler applying changes of one neutral node to the backend.
#[async_trait]
pub trait Writer: Send + Sync {
    async fn write(
        &self,
        path: &InstancePath,
        after: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<()>;

    // Defaults to removing the old data and writing the new one.
    async fn update(
        &self,
        path: &InstancePath,
        before: &Node,
        after: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        self.delete(path, before, ctx).await?;
        self.write(path, after, ctx).await
    }

    async fn delete(
        &self,
        path: &InstancePath,
        before: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<()>;
}

// Child of a composite writer.
//
// Each operation returns whether the child handled it. A child must derive
// its decision from the data it is given and must have no side effects when
// it declines. Hard invariant violations are reported as errors instead.
#[async_trait]
pub trait WriterChild: Send + Sync {
    async fn try_write(
        &self,
        path: &InstancePath,
        after: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<bool>;

    async fn try_update(
        &self,
        path: &InstancePath,
        before: &Node,
        after: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<bool>;

    async fn try_delete(
        &self,
        path: &InstancePath,
        before: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<bool>;
}

// Chain of writer children. The first child that handles an operation ends
// the chain.
#[derive(Default)]
pub struct CompositeWriter {
    children: Vec<Arc<dyn WriterChild>>,
    policy: UnhandledPolicy,
}

// ===== impl CompositeWriter =====

impl CompositeWriter {
    #[must_use]
    pub fn child(mut self, child: impl WriterChild + 'static) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: UnhandledPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn handled(&self, op: ChangeOp, path: &InstancePath, idx: usize) {
        Debug::WriterChildHandled(op, path, idx).log();
    }

    fn unhandled(&self, op: ChangeOp, path: &InstancePath) -> Result<()> {
        Debug::WriterUnhandled(op, path).log();
        match self.policy {
            UnhandledPolicy::Ignore => Ok(()),
            UnhandledPolicy::Reject => Err(Error::Unhandled(op, path.clone())),
        }
    }
}

#[async_trait]
impl Writer for CompositeWriter {
    async fn write(
        &self,
        path: &InstancePath,
        after: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        for (idx, child) in self.children.iter().enumerate() {
            if child.try_write(path, after, ctx).await? {
                self.handled(ChangeOp::Create, path, idx);
                return Ok(());
            }
        }
        self.unhandled(ChangeOp::Create, path)
    }

    async fn update(
        &self,
        path: &InstancePath,
        before: &Node,
        after: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        for (idx, child) in self.children.iter().enumerate() {
            if child.try_update(path, before, after, ctx).await? {
                self.handled(ChangeOp::Update, path, idx);
                return Ok(());
            }
        }
        self.unhandled(ChangeOp::Update, path)
    }

    async fn delete(
        &self,
        path: &InstancePath,
        before: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        for (idx, child) in self.children.iter().enumerate() {
            if child.try_delete(path, before, ctx).await? {
                self.handled(ChangeOp::Delete, path, idx);
                return Ok(());
            }
        }
        self.unhandled(ChangeOp::Delete, path)
    }
}
