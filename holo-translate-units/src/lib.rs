//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod debug;

pub mod interface;
pub mod network_instance;
pub mod node;
pub mod paths;
pub mod platform;
pub mod protocol;
pub mod types;

use std::sync::Arc;

use holo_translate::error::RegistryError;
use holo_translate::unit::{Registration, TranslationUnit, UnitCollector};

use crate::interface::InterfaceUnit;
use crate::network_instance::NetworkInstanceUnit;
use crate::platform::PlatformUnit;
use crate::protocol::ProtocolUnit;

// Reference units, in dependency order.
pub fn units() -> Vec<Arc<dyn TranslationUnit>> {
    vec![
        Arc::new(InterfaceUnit),
        Arc::new(NetworkInstanceUnit),
        Arc::new(ProtocolUnit),
        Arc::new(PlatformUnit),
    ]
}

// Loads every reference unit into the given collector.
//
// The returned handles keep the units loaded.
pub fn register(
    collector: &UnitCollector,
) -> Result<Vec<Registration>, RegistryError> {
    units()
        .into_iter()
        .map(|unit| collector.register(unit))
        .collect()
}
