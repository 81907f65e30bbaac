//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span, trace};

use crate::access::{DataStore, WriteOp};
use crate::error::BackendError;
use crate::path::InstancePath;
use crate::transaction::SkipReason;
use crate::tree::{ChangeOp, Node};

// Translation debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    // Backend access
    BackendRead(&'a InstancePath, DataStore),
    BackendReadRetry(&'a InstancePath, DataStore, usize, &'a BackendError),
    BackendWrite(WriteOp, &'a InstancePath, Option<&'a Node>),
    SafeWriteSkipped(&'a InstancePath),
    RpcInvoke(&'a str, &'a Node),
    // Dispatch
    CheckRejected(&'a InstancePath, usize),
    WriterChildHandled(ChangeOp, &'a InstancePath, usize),
    WriterUnhandled(ChangeOp, &'a InstancePath),
    ChangeApply(ChangeOp, &'a InstancePath),
    ChangeSkipped(ChangeOp, &'a InstancePath, SkipReason),
    // Registry
    RegistryBuild(usize, usize),
    UnitRegister(&'a str),
    UnitUnregister(&'a str),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::BackendRead(path, store) => {
                debug_span!("backend").in_scope(|| {
                    trace!(%path, %store, "{}", self);
                })
            }
            Debug::BackendReadRetry(path, store, attempt, error) => {
                debug_span!("backend").in_scope(|| {
                    debug!(%path, %store, %attempt, %error, "{}", self);
                })
            }
            Debug::BackendWrite(op, path, payload) => {
                debug_span!("backend").in_scope(|| {
                    let payload = payload
                        .map(|payload| payload.to_string())
                        .unwrap_or_default();
                    debug!(%op, %path, %payload, "{}", self);
                })
            }
            Debug::SafeWriteSkipped(path) => {
                debug_span!("backend").in_scope(|| {
                    debug!(%path, "{}", self);
                })
            }
            Debug::RpcInvoke(operation, input) => {
                debug_span!("backend").in_scope(|| {
                    let input = input.to_string();
                    debug!(%operation, %input, "{}", self);
                })
            }
            Debug::CheckRejected(path, child) => {
                trace!(%path, %child, "{}", self);
            }
            Debug::WriterChildHandled(op, path, child) => {
                debug!(%op, %path, %child, "{}", self);
            }
            Debug::WriterUnhandled(op, path) => {
                debug!(%op, %path, "{}", self);
            }
            Debug::ChangeApply(op, path) => {
                debug_span!("transaction").in_scope(|| {
                    debug!(%op, %path, "{}", self);
                })
            }
            Debug::ChangeSkipped(op, path, reason) => {
                debug_span!("transaction").in_scope(|| {
                    debug!(%op, %path, %reason, "{}", self);
                })
            }
            Debug::RegistryBuild(readers, writers) => {
                debug!(%readers, %writers, "{}", self);
            }
            Debug::UnitRegister(name) | Debug::UnitUnregister(name) => {
                debug!(%name, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::BackendRead(..) => {
                write!(f, "reading backend data")
            }
            Debug::BackendReadRetry(..) => {
                write!(f, "retrying backend read")
            }
            Debug::BackendWrite(..) => {
                write!(f, "writing backend data")
            }
            Debug::SafeWriteSkipped(..) => {
                write!(f, "backend data already up to date")
            }
            Debug::RpcInvoke(..) => {
                write!(f, "invoking operational command")
            }
            Debug::CheckRejected(..) => {
                write!(f, "check rejected reader child")
            }
            Debug::WriterChildHandled(..) => {
                write!(f, "writer child handled operation")
            }
            Debug::WriterUnhandled(..) => {
                write!(f, "no writer child handled operation")
            }
            Debug::ChangeApply(..) => {
                write!(f, "applying change")
            }
            Debug::ChangeSkipped(..) => {
                write!(f, "change has no backend effect")
            }
            Debug::RegistryBuild(..) => {
                write!(f, "handler registry built")
            }
            Debug::UnitRegister(..) => {
                write!(f, "translation unit registered")
            }
            Debug::UnitUnregister(..) => {
                write!(f, "translation unit unregistered")
            }
        }
    }
}
