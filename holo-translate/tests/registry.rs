//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use std::sync::Arc;

use common::*;
use holo_translate::access::Access;
use holo_translate::check::{AlwaysCheck, DiscriminatorCheck};
use holo_translate::config::RegistryConfig;
use holo_translate::error::RegistryError;
use holo_translate::path::{ListKey, path};
use holo_translate::reader::{CompositeListReader, CompositeReader};
use holo_translate::registry::{Registry, RegistryBuilder};
use holo_translate::tree::DataTree;
use holo_translate::unit::{TranslationUnit, UnitCollector};
use serde_json::json;

const PROTOCOL: &str = "/network-instances/network-instance/protocols/protocol";

fn recorder(name: &'static str) -> RecordingWriter {
    RecordingWriter {
        name,
        events: Events::default(),
    }
}

fn protocol_key(identifier: &str) -> ListKey {
    ListKey::composite([("identifier", identifier), ("name", "default")])
}

// Two siblings claiming the same discriminator value are rejected when the
// registry is built.
#[test]
fn overlapping_gates_rejected() {
    let reader = CompositeListReader::default()
        .child(
            DiscriminatorCheck::key("protocol", "identifier", ["BGP"]),
            StaticListReader(vec![protocol_key("BGP")]),
        )
        .child(
            DiscriminatorCheck::key("protocol", "identifier", ["OSPF", "BGP"]),
            StaticListReader(vec![]),
        );
    let result = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path(PROTOCOL)
        .list_reader(reader)
        .build();

    assert_eq!(
        result.unwrap_err(),
        RegistryError::OverlappingChecks(path(PROTOCOL), "BGP".to_owned())
    );
}

// An unconditional gate overlaps every discriminator value of its siblings.
#[test]
fn always_gate_next_to_discriminator_rejected() {
    let reader = CompositeListReader::default()
        .child(
            DiscriminatorCheck::key("protocol", "identifier", ["BGP"]),
            StaticListReader(vec![protocol_key("BGP")]),
        )
        .child(AlwaysCheck, StaticListReader(vec![protocol_key("OSPF")]));
    let result = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path(PROTOCOL)
        .list_reader(reader)
        .build();

    assert_eq!(
        result.unwrap_err(),
        RegistryError::UngatedSibling(path(PROTOCOL))
    );
}

#[test]
fn disjoint_gates_accepted() {
    let reader = CompositeReader::default()
        .child(
            DiscriminatorCheck::key("protocol", "identifier", ["BGP"]),
            StaticReader(json!({})),
        )
        .child(
            DiscriminatorCheck::key("protocol", "identifier", ["OSPF"]),
            StaticReader(json!({})),
        );
    let registry = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path(PROTOCOL)
        .reader(reader)
        .build()
        .unwrap();

    assert!(registry.has_reader(&path(
        "/network-instances/network-instance[name='default']/protocols/protocol[identifier='BGP'][name='default']"
    )));
    assert!(!registry.has_writer(&path(PROTOCOL)));
}

// Ancestors come before descendants, declared predecessors before their
// successors, and ties keep registration order.
#[test]
fn writer_order() {
    let registry = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("/b")
        .writer(recorder("b"))
        .after(&["/a"])
        .path("/a")
        .writer(recorder("a"))
        .path("/a/child")
        .writer(recorder("a-child"))
        .path("/c")
        .writer(recorder("c"))
        .build()
        .unwrap();

    assert_eq!(
        registry.writer_order(),
        &[path("/a"), path("/b"), path("/a/child"), path("/c")]
    );
}

#[test]
fn ordering_cycle_rejected() {
    let result = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("/a")
        .writer(recorder("a"))
        .after(&["/b"])
        .path("/b")
        .writer(recorder("b"))
        .after(&["/a"])
        .path("/c")
        .writer(recorder("c"))
        .build();

    assert_eq!(
        result.unwrap_err(),
        RegistryError::Cycle(vec![path("/a"), path("/b")])
    );
}

#[test]
fn unresolved_predecessor_rejected() {
    let result = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("/a")
        .writer(recorder("a"))
        .after(&["/missing"])
        .build();

    assert_eq!(
        result.unwrap_err(),
        RegistryError::UnresolvedPredecessor(path("/a"), path("/missing"))
    );
}

#[test]
fn duplicate_writer_rejected() {
    let result = Registry::builder(RegistryConfig::default())
        .unit("first")
        .path("/a")
        .writer(recorder("a"))
        .unit("second")
        .path("/a[name='x']")
        .writer(recorder("a"))
        .build();

    assert_eq!(
        result.unwrap_err(),
        RegistryError::DuplicateWriter(path("/a"))
    );
}

#[test]
fn subtree_member_cannot_be_registered() {
    let result = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("/a")
        .writer(recorder("a"))
        .subtree(&["/config"])
        .path("/a/config")
        .writer(recorder("a-config"))
        .build();

    assert_eq!(
        result.unwrap_err(),
        RegistryError::SubtreeConflict(path("/a/config"))
    );
}

#[test]
fn handler_without_path_rejected() {
    let result = RegistryBuilder::new(RegistryConfig::default())
        .unit("test")
        .writer(recorder("a"))
        .build();

    assert_eq!(result.unwrap_err(), RegistryError::MissingPath);
}

#[test]
fn invalid_path_rejected() {
    let result = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("a/b")
        .noop()
        .build();

    assert!(matches!(
        result.unwrap_err(),
        RegistryError::InvalidPath(path, _) if path == "a/b"
    ));
}

// Removing a unit other registrations depend on leaves the registry as it
// was.
#[test]
fn remove_unit_is_atomic() {
    let mut registry = Registry::builder(RegistryConfig::default())
        .unit("base")
        .path("/a")
        .writer(recorder("a"))
        .unit("dependent")
        .path("/b")
        .writer(recorder("b"))
        .after(&["/a"])
        .build()
        .unwrap();

    assert_eq!(
        registry.remove_unit("base"),
        Err(RegistryError::DependentRegistration(
            "base".to_owned(),
            path("/b")
        ))
    );
    assert!(registry.has_writer(&path("/a")));
    assert_eq!(registry.units(), vec!["base", "dependent"]);

    registry.remove_unit("dependent").unwrap();
    assert!(!registry.has_writer(&path("/b")));
    registry.remove_unit("base").unwrap();
    assert!(registry.writer_order().is_empty());
    assert_eq!(
        registry.remove_unit("base"),
        Err(RegistryError::UnitNotFound("base".to_owned()))
    );
}

struct NoopUnit(&'static str);

impl TranslationUnit for NoopUnit {
    fn name(&self) -> &str {
        self.0
    }

    fn provide_handlers(
        &self,
        builder: RegistryBuilder,
        _access: &Access,
    ) -> RegistryBuilder {
        builder.path(&format!("/{}", self.0)).noop()
    }
}

#[test]
fn unit_collector_lifecycle() {
    let (_, access) = session(DataTree::new());
    let collector = UnitCollector::new();

    let first = collector.register(Arc::new(NoopUnit("first"))).unwrap();
    let second = collector.register(Arc::new(NoopUnit("second"))).unwrap();
    assert!(matches!(
        collector.register(Arc::new(NoopUnit("first"))),
        Err(RegistryError::DuplicateUnit(name)) if name == "first"
    ));
    assert_eq!(collector.units(), vec!["first", "second"]);

    // Every session gets its own registry.
    let registry = collector
        .registry(&access, &RegistryConfig::default())
        .unwrap();
    assert!(registry.has_writer(&path("/first")));
    assert!(registry.has_writer(&path("/second")));

    drop(second);
    assert_eq!(collector.units(), vec!["first"]);
    assert_eq!(first.name(), "first");
    first.close();
    assert!(collector.units().is_empty());

    // Registries already built are not affected.
    assert!(registry.has_writer(&path("/second")));
}
