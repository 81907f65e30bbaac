//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{warn, warn_span};

use crate::access::{DataStore, WriteOp};
use crate::path::{InstancePath, PathError};
use crate::tree::{ChangeOp, Node};

pub type Result<T> = std::result::Result<T, Error>;

// Translation errors.
#[derive(Debug)]
pub enum Error {
    // Backend errors
    Read(ReadError),
    Write(WriteError),
    Rpc(RpcError),
    // Handler errors
    InvariantViolation(InstancePath, String),
    Unhandled(ChangeOp, InstancePath),
    // Dispatch errors
    NoHandler(InstancePath),
    StructuralWrite(InstancePath),
    Registry(RegistryError),
    Path(PathError),
    // Error with the neutral change that caused it attached
    Change {
        op: ChangeOp,
        path: InstancePath,
        error: Box<Error>,
    },
}

// Error reported by a backend session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BackendErrorKind {
    Transient,
    Permanent,
}

// Backend read failure.
#[derive(Debug)]
pub struct ReadError {
    pub path: InstancePath,
    pub store: DataStore,
    pub attempts: usize,
    pub cause: BackendError,
}

// Backend write failure.
#[derive(Debug)]
pub struct WriteError {
    pub path: InstancePath,
    pub op: WriteOp,
    pub payload: Option<Node>,
    pub cause: BackendError,
}

// Backend operational command failure.
#[derive(Debug)]
pub struct RpcError {
    pub operation: String,
    pub cause: BackendError,
}

// Handler registration errors.
#[derive(Debug, Eq, PartialEq)]
pub enum RegistryError {
    InvalidPath(String, PathError),
    MissingPath,
    DuplicateReader(InstancePath),
    DuplicateWriter(InstancePath),
    SubtreeConflict(InstancePath),
    UnresolvedPredecessor(InstancePath, InstancePath),
    Cycle(Vec<InstancePath>),
    OverlappingChecks(InstancePath, String),
    UngatedSibling(InstancePath),
    DuplicateUnit(String),
    UnitNotFound(String),
    DependentRegistration(String, InstancePath),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::Read(error) => error.log(),
            Error::Write(error) => error.log(),
            Error::Rpc(error) => error.log(),
            Error::InvariantViolation(path, reason) => {
                warn!(%path, %reason, "{}", self);
            }
            Error::Unhandled(op, path) => {
                warn!(%op, %path, "{}", self);
            }
            Error::NoHandler(path) | Error::StructuralWrite(path) => {
                warn!(%path, "{}", self);
            }
            Error::Registry(error) => error.log(),
            Error::Path(error) => {
                warn!(%error, "{}", self);
            }
            Error::Change { op, path, error } => {
                warn_span!("change", %op, %path).in_scope(|| error.log());
            }
        }
    }

    // Innermost error, with all change context removed.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Change { error, .. } => error.root_cause(),
            _ => self,
        }
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self.root_cause(), Error::InvariantViolation(..))
    }

    pub fn is_transient(&self) -> bool {
        match self.root_cause() {
            Error::Read(error) => error.cause.is_transient(),
            Error::Write(error) => error.cause.is_transient(),
            Error::Rpc(error) => error.cause.is_transient(),
            _ => false,
        }
    }

    // Attaches the neutral change being processed.
    pub fn with_change(self, op: ChangeOp, path: &InstancePath) -> Error {
        Error::Change {
            op,
            path: path.clone(),
            error: Box::new(self),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Read(error) => error.fmt(f),
            Error::Write(error) => error.fmt(f),
            Error::Rpc(error) => error.fmt(f),
            Error::InvariantViolation(path, reason) => {
                write!(f, "invalid request for {path}: {reason}")
            }
            Error::Unhandled(op, path) => {
                write!(f, "no handler accepted {op} of {path}")
            }
            Error::NoHandler(path) => {
                write!(f, "no handler registered for {path}")
            }
            Error::StructuralWrite(path) => {
                write!(f, "{path} is a structural node and cannot be written")
            }
            Error::Registry(error) => error.fmt(f),
            Error::Path(error) => error.fmt(f),
            Error::Change { op, path, error } => {
                write!(f, "failed to {op} {path}: {error}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read(error) => Some(&error.cause),
            Error::Write(error) => Some(&error.cause),
            Error::Rpc(error) => Some(&error.cause),
            Error::Registry(error) => Some(error),
            Error::Path(error) => Some(error),
            Error::Change { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl From<ReadError> for Error {
    fn from(error: ReadError) -> Error {
        Error::Read(error)
    }
}

impl From<WriteError> for Error {
    fn from(error: WriteError) -> Error {
        Error::Write(error)
    }
}

impl From<RpcError> for Error {
    fn from(error: RpcError) -> Error {
        Error::Rpc(error)
    }
}

impl From<RegistryError> for Error {
    fn from(error: RegistryError) -> Error {
        Error::Registry(error)
    }
}

impl From<PathError> for Error {
    fn from(error: PathError) -> Error {
        Error::Path(error)
    }
}

// ===== impl BackendError =====

impl BackendError {
    pub fn transient(message: impl Into<String>) -> BackendError {
        BackendError {
            kind: BackendErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> BackendError {
        BackendError {
            kind: BackendErrorKind::Permanent,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == BackendErrorKind::Transient
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            BackendErrorKind::Transient => {
                write!(f, "transient backend error: {}", self.message)
            }
            BackendErrorKind::Permanent => {
                write!(f, "backend error: {}", self.message)
            }
        }
    }
}

impl std::error::Error for BackendError {}

// ===== impl ReadError =====

impl ReadError {
    pub(crate) fn log(&self) {
        warn!(
            path = %self.path,
            store = %self.store,
            attempts = self.attempts,
            error = %self.cause,
            "{}", self
        );
    }
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to read {} from {} store after {} attempt(s)",
            self.path, self.store, self.attempts
        )
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

// ===== impl WriteError =====

impl WriteError {
    pub(crate) fn log(&self) {
        let payload = self
            .payload
            .as_ref()
            .map(|payload| payload.to_string())
            .unwrap_or_default();
        warn!(
            path = %self.path,
            op = %self.op,
            %payload,
            error = %self.cause,
            "{}", self
        );
    }
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to {} {}", self.op, self.path)
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

// ===== impl RpcError =====

impl RpcError {
    pub(crate) fn log(&self) {
        warn!(operation = %self.operation, error = %self.cause, "{}", self);
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to invoke operation {}", self.operation)
    }
}

impl std::error::Error for RpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

// ===== impl RegistryError =====

impl RegistryError {
    pub(crate) fn log(&self) {
        match self {
            RegistryError::InvalidPath(path, error) => {
                warn!(%path, %error, "{}", self);
            }
            _ => warn!("{}", self),
        }
    }
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::InvalidPath(path, _) => {
                write!(f, "invalid registration path {path}")
            }
            RegistryError::MissingPath => {
                write!(f, "handler registered without a path")
            }
            RegistryError::DuplicateReader(path) => {
                write!(f, "duplicate reader registration for {path}")
            }
            RegistryError::DuplicateWriter(path) => {
                write!(f, "duplicate writer registration for {path}")
            }
            RegistryError::SubtreeConflict(path) => {
                write!(f, "{path} is already owned by another registration")
            }
            RegistryError::UnresolvedPredecessor(path, predecessor) => {
                write!(
                    f,
                    "{path} is ordered after {predecessor}, which has no writer"
                )
            }
            RegistryError::Cycle(paths) => {
                write!(f, "ordering cycle among")?;
                for path in paths {
                    write!(f, " {path}")?;
                }
                Ok(())
            }
            RegistryError::OverlappingChecks(path, value) => {
                write!(
                    f,
                    "more than one child of {path} claims discriminator value {value}"
                )
            }
            RegistryError::UngatedSibling(path) => {
                write!(
                    f,
                    "children of {path} mix unconditional and discriminator gates"
                )
            }
            RegistryError::DuplicateUnit(name) => {
                write!(f, "translation unit {name} is already registered")
            }
            RegistryError::UnitNotFound(name) => {
                write!(f, "translation unit {name} is not registered")
            }
            RegistryError::DependentRegistration(name, path) => {
                write!(
                    f,
                    "cannot remove translation unit {name}: {path} is ordered after one of its paths"
                )
            }
        }
    }
}

impl std::error::Error for RegistryError {}
