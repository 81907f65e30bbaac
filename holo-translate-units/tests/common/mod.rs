//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Once};

use holo_translate::access::Access;
use holo_translate::access::memory::MemoryBackend;
use holo_translate::config::{AccessConfig, RegistryConfig};
use holo_translate::path::path;
use holo_translate::registry::Registry;
use holo_translate::tree::DataTree;
use holo_translate::unit::UnitCollector;
use serde_json::Value;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("holo_translate=trace,holo_translate_units=trace")
            .with_test_writer()
            .try_init();
    });
}

// Device session with every reference unit loaded.
pub struct Device {
    pub backend: Arc<MemoryBackend>,
    pub registry: Registry,
}

pub fn device(backend: MemoryBackend) -> Device {
    init_tracing();
    let backend = Arc::new(backend);
    let access = Access::new(backend.clone(), AccessConfig::default());
    let collector = UnitCollector::new();
    let _units = holo_translate_units::register(&collector).unwrap();
    let registry = collector
        .registry(&access, &RegistryConfig::default())
        .unwrap();
    Device { backend, registry }
}

// Device whose config store holds the given nodes.
pub fn device_with(config: BTreeMap<&str, Value>) -> Device {
    device(MemoryBackend::new(tree(config)))
}

pub fn tree(entries: BTreeMap<&str, Value>) -> DataTree {
    entries
        .into_iter()
        .map(|(instance, node)| (path(instance), node))
        .collect()
}
