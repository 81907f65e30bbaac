//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::{Arc, PoisonError, RwLock};

use crate::access::Access;
use crate::config::RegistryConfig;
use crate::debug::Debug;
use crate::error::RegistryError;
use crate::registry::{Registry, RegistryBuilder};

// Bundle of handler registrations for one device family.
pub trait TranslationUnit: Send + Sync {
    fn name(&self) -> &str;

    // Neutral models covered by this unit.
    fn schemas(&self) -> Vec<&'static str> {
        vec![]
    }

    // Backend models this unit depends on.
    fn underlay_schemas(&self) -> Vec<&'static str> {
        vec![]
    }

    // Registers the unit's handlers. Handlers needing backend access keep a
    // clone of the given client.
    fn provide_handlers(
        &self,
        builder: RegistryBuilder,
        access: &Access,
    ) -> RegistryBuilder;
}

// Set of loaded translation units.
//
// Cloning yields another handle to the same set.
#[derive(Clone, Default)]
pub struct UnitCollector {
    units: Arc<RwLock<Vec<Arc<dyn TranslationUnit>>>>,
}

// Handle keeping a translation unit loaded. The unit is unloaded when the
// handle is closed or dropped.
#[must_use]
pub struct Registration {
    collector: UnitCollector,
    name: String,
    closed: bool,
}

// ===== impl UnitCollector =====

impl UnitCollector {
    pub fn new() -> UnitCollector {
        UnitCollector::default()
    }

    pub fn register(
        &self,
        unit: Arc<dyn TranslationUnit>,
    ) -> Result<Registration, RegistryError> {
        let name = unit.name().to_owned();
        let mut units =
            self.units.write().unwrap_or_else(PoisonError::into_inner);
        if units.iter().any(|loaded| loaded.name() == name) {
            return Err(RegistryError::DuplicateUnit(name));
        }
        units.push(unit);
        Debug::UnitRegister(&name).log();

        Ok(Registration {
            collector: self.clone(),
            name,
            closed: false,
        })
    }

    pub fn units(&self) -> Vec<String> {
        self.units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|unit| unit.name().to_owned())
            .collect()
    }

    // Builds an isolated registry for one device session.
    pub fn registry(
        &self,
        access: &Access,
        config: &RegistryConfig,
    ) -> Result<Registry, RegistryError> {
        let units = self
            .units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        units
            .iter()
            .fold(Registry::builder(config.clone()), |builder, unit| {
                unit.provide_handlers(builder.unit(unit.name()), access)
            })
            .build()
    }

    fn unregister(&self, name: &str) {
        let mut units =
            self.units.write().unwrap_or_else(PoisonError::into_inner);
        units.retain(|unit| unit.name() != name);
        Debug::UnitUnregister(name).log();
    }
}

impl std::fmt::Debug for UnitCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitCollector")
            .field("units", &self.units())
            .finish()
    }
}

// ===== impl Registration =====

impl Registration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn close(mut self) {
        self.closed = true;
        self.collector.unregister(&self.name);
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if !self.closed {
            self.collector.unregister(&self.name);
        }
    }
}
