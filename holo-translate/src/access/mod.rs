//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::AccessConfig;
use crate::debug::Debug;
use crate::diff;
use crate::error::{BackendError, ReadError, Result, RpcError, WriteError};
use crate::path::InstancePath;
use crate::tree::Node;

// Backend datastore.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataStore {
    Config,
    Operational,
}

// Backend mutation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOp {
    Put,
    Merge,
    Delete,
}

// Raw session to one managed device.
//
// Implementations perform exactly one remote operation per call. Reading an
// absent node yields `None`, and deleting an absent node succeeds.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn read(
        &self,
        path: &InstancePath,
        store: DataStore,
    ) -> std::result::Result<Option<Node>, BackendError>;

    async fn put(
        &self,
        path: &InstancePath,
        node: &Node,
    ) -> std::result::Result<(), BackendError>;

    async fn merge(
        &self,
        path: &InstancePath,
        node: &Node,
    ) -> std::result::Result<(), BackendError>;

    async fn delete(
        &self,
        path: &InstancePath,
    ) -> std::result::Result<(), BackendError>;

    async fn invoke_rpc(
        &self,
        operation: &str,
        input: &Node,
    ) -> std::result::Result<Node, BackendError>;
}

// Remote config client shared by all handlers of one device session.
#[derive(Clone)]
pub struct Access {
    backend: Arc<dyn Backend>,
    config: AccessConfig,
}

// ===== impl DataStore =====

impl std::fmt::Display for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataStore::Config => write!(f, "config"),
            DataStore::Operational => write!(f, "operational"),
        }
    }
}

// ===== impl WriteOp =====

impl std::fmt::Display for WriteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteOp::Put => write!(f, "put"),
            WriteOp::Merge => write!(f, "merge"),
            WriteOp::Delete => write!(f, "delete"),
        }
    }
}

// ===== impl Access =====

impl Access {
    pub fn new(backend: Arc<dyn Backend>, config: AccessConfig) -> Access {
        Access { backend, config }
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    // Reads a backend subtree.
    //
    // Transient failures are retried up to the configured number of
    // attempts. Permanent failures are returned immediately.
    pub async fn read(
        &self,
        path: &InstancePath,
        store: DataStore,
    ) -> std::result::Result<Option<Node>, ReadError> {
        let max_attempts = self.config.read_attempts.max(1);
        let mut attempts = 0;
        loop {
            attempts += 1;
            Debug::BackendRead(path, store).log();
            match self.backend.read(path, store).await {
                Ok(node) => return Ok(node),
                Err(error)
                    if error.is_transient() && attempts < max_attempts =>
                {
                    Debug::BackendReadRetry(path, store, attempts, &error)
                        .log();
                }
                Err(cause) => {
                    return Err(ReadError {
                        path: path.clone(),
                        store,
                        attempts,
                        cause,
                    });
                }
            }
        }
    }

    pub async fn read_config(
        &self,
        path: &InstancePath,
    ) -> std::result::Result<Option<Node>, ReadError> {
        self.read(path, DataStore::Config).await
    }

    pub async fn read_operational(
        &self,
        path: &InstancePath,
    ) -> std::result::Result<Option<Node>, ReadError> {
        self.read(path, DataStore::Operational).await
    }

    pub async fn put(
        &self,
        path: &InstancePath,
        node: &Node,
    ) -> std::result::Result<(), WriteError> {
        Debug::BackendWrite(WriteOp::Put, path, Some(node)).log();
        self.backend
            .put(path, node)
            .await
            .map_err(|cause| write_error(path, WriteOp::Put, Some(node), cause))
    }

    pub async fn merge(
        &self,
        path: &InstancePath,
        node: &Node,
    ) -> std::result::Result<(), WriteError> {
        Debug::BackendWrite(WriteOp::Merge, path, Some(node)).log();
        self.backend.merge(path, node).await.map_err(|cause| {
            write_error(path, WriteOp::Merge, Some(node), cause)
        })
    }

    pub async fn delete(
        &self,
        path: &InstancePath,
    ) -> std::result::Result<(), WriteError> {
        Debug::BackendWrite(WriteOp::Delete, path, None).log();
        self.backend
            .delete(path)
            .await
            .map_err(|cause| write_error(path, WriteOp::Delete, None, cause))
    }

    // Writes a node without regressing backend fields it does not carry.
    pub async fn safe_put(&self, path: &InstancePath, node: &Node) -> Result<()> {
        let current = self.read_config(path).await?;
        let payload = match &current {
            Some(current) => diff::fold_forward(current, node),
            None => node.clone(),
        };
        if current.as_ref() == Some(&payload) {
            Debug::SafeWriteSkipped(path).log();
            return Ok(());
        }
        self.put(path, &payload).await?;
        Ok(())
    }

    // Moves backend data from reflecting `before` to reflecting `after`.
    //
    // When both nodes map to the same backend path, only the fields that
    // `after` dropped are removed and nothing is written if the backend is
    // already up to date. Otherwise the old node is safely deleted and the
    // new one safely written.
    pub async fn safe_merge(
        &self,
        path_before: &InstancePath,
        before: &Node,
        path_after: &InstancePath,
        after: &Node,
    ) -> Result<()> {
        if path_before != path_after {
            self.safe_delete(path_before, before).await?;
            return self.safe_put(path_after, after).await;
        }

        let current = self.read_config(path_after).await?;
        let base = match (&current, diff::removed_fields(before, after)) {
            (Some(current), Some(removed)) => diff::subtract(current, &removed)
                .unwrap_or_else(|| Value::Object(Map::new())),
            (Some(current), None) => current.clone(),
            (None, _) => Value::Object(Map::new()),
        };
        let payload = diff::fold_forward(&base, after);
        if current.as_ref() == Some(&payload) {
            Debug::SafeWriteSkipped(path_after).log();
            return Ok(());
        }
        self.put(path_after, &payload).await?;
        Ok(())
    }

    // Removes only the backend fields attributable to `before`.
    //
    // The backend node itself is deleted only when nothing else remains in
    // it.
    pub async fn safe_delete(
        &self,
        path: &InstancePath,
        before: &Node,
    ) -> Result<()> {
        let Some(current) = self.read_config(path).await? else {
            Debug::SafeWriteSkipped(path).log();
            return Ok(());
        };
        match diff::subtract(&current, before) {
            None => self.delete(path).await?,
            Some(rest) if rest == current => {
                Debug::SafeWriteSkipped(path).log();
            }
            Some(rest) => self.put(path, &rest).await?,
        }
        Ok(())
    }

    // Invokes an operational command and returns its structured result.
    pub async fn invoke_rpc(
        &self,
        operation: &str,
        input: &Node,
    ) -> std::result::Result<Node, RpcError> {
        Debug::RpcInvoke(operation, input).log();
        self.backend
            .invoke_rpc(operation, input)
            .await
            .map_err(|cause| RpcError {
                operation: operation.to_owned(),
                cause,
            })
    }
}

impl std::fmt::Debug for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Access")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ===== helper functions =====

fn write_error(
    path: &InstancePath,
    op: WriteOp,
    payload: Option<&Node>,
    cause: BackendError,
) -> WriteError {
    WriteError {
        path: path.clone(),
        op,
        payload: payload.cloned(),
        cause,
    }
}
