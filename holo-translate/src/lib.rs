//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod debug;

pub mod access;
pub mod check;
pub mod config;
pub mod context;
pub mod diff;
pub mod error;
pub mod path;
pub mod reader;
pub mod registry;
pub mod transaction;
pub mod tree;
pub mod unit;
pub mod writer;

pub use crate::access::{Access, Backend, DataStore};
pub use crate::check::{AlwaysCheck, Check, CheckContext, DiscriminatorCheck};
pub use crate::config::Config;
pub use crate::context::{ReadContext, WriteContext};
pub use crate::error::{Error, Result};
pub use crate::path::{InstancePath, ListKey};
pub use crate::reader::{
    CompositeListReader, CompositeReader, ListReader, Reader,
};
pub use crate::registry::{Registry, RegistryBuilder};
pub use crate::tree::{DataTree, Node};
pub use crate::unit::{TranslationUnit, UnitCollector};
pub use crate::writer::{CompositeWriter, Writer, WriterChild};
