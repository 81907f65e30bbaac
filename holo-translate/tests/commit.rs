//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use common::*;
use holo_translate::access::WriteOp;
use holo_translate::access::memory::JournalEntry;
use holo_translate::check::DiscriminatorCheck;
use holo_translate::config::{RegistryConfig, StructuralPolicy, UnhandledPolicy};
use holo_translate::error::{BackendError, Error};
use holo_translate::path::path;
use holo_translate::registry::Registry;
use holo_translate::transaction::{AppliedChange, Outcome, SkipReason};
use holo_translate::tree::{Change, ChangeOp, DataTree};
use holo_translate::writer::CompositeWriter;
use maplit::btreemap;
use serde_json::json;

fn recorder(name: &'static str, events: &Events) -> RecordingWriter {
    RecordingWriter {
        name,
        events: events.clone(),
    }
}

fn stub(name: &'static str, handles: bool, events: &Events) -> StubChild {
    StubChild {
        name,
        handles,
        events: events.clone(),
    }
}

// Among children that would all handle an operation, only the first one
// runs.
#[tokio::test]
async fn composite_writer_single_dispatch() {
    init_tracing();
    let events = Events::default();
    let writer = CompositeWriter::default()
        .child(stub("declines", false, &events))
        .child(stub("first", true, &events))
        .child(stub("second", true, &events));
    let registry = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("/a")
        .writer(writer)
        .build()
        .unwrap();

    let empty = DataTree::new();
    let v1 = snapshot(btreemap! {
        "/a" => json!({"x": 1}),
    });
    let v2 = snapshot(btreemap! {
        "/a" => json!({"x": 2}),
    });

    registry.commit(&empty, &v1).await.unwrap();
    assert_eq!(events.take(), vec!["first create /a"]);
    registry.commit(&v1, &v2).await.unwrap();
    assert_eq!(events.take(), vec!["first update /a"]);
    registry.commit(&v2, &empty).await.unwrap();
    assert_eq!(events.take(), vec!["first delete /a"]);
}

#[tokio::test]
async fn composite_writer_unhandled_policy() {
    init_tracing();
    let events = Events::default();
    let registry = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("/lenient")
        .writer(CompositeWriter::default().child(stub("no", false, &events)))
        .path("/strict")
        .writer(
            CompositeWriter::default()
                .child(stub("no", false, &events))
                .policy(UnhandledPolicy::Reject),
        )
        .build()
        .unwrap();
    let empty = DataTree::new();

    let after = snapshot(btreemap! {
        "/lenient" => json!({}),
    });
    let report = registry.commit(&empty, &after).await.unwrap();
    assert_eq!(report.applied().count(), 1);

    let after = snapshot(btreemap! {
        "/strict" => json!({}),
    });
    let error = registry.commit(&empty, &after).await.unwrap_err();
    assert!(matches!(
        error.root_cause(),
        Error::Unhandled(ChangeOp::Create, unhandled)
            if *unhandled == path("/strict")
    ));
    assert!(events.take().is_empty());
}

// Declared predecessors are written first and deleted last, whatever the
// order in which changes are given.
#[tokio::test]
async fn ordering_respected() {
    init_tracing();
    let events = Events::default();
    let registry = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("/b")
        .writer(recorder("b", &events))
        .after(&["/a"])
        .path("/a")
        .writer(recorder("a", &events))
        .build()
        .unwrap();

    let empty = DataTree::new();
    let both = snapshot(btreemap! {
        "/a" => json!({}),
        "/b" => json!({}),
    });
    let create = |instance: &str| Change {
        op: ChangeOp::Create,
        path: path(instance),
    };
    for changes in [
        vec![create("/b"), create("/a")],
        vec![create("/a"), create("/b")],
    ] {
        registry.apply(&changes, &empty, &both).await.unwrap();
        assert_eq!(events.take(), vec!["a write /a", "b write /b"]);
    }

    registry.commit(&both, &empty).await.unwrap();
    assert_eq!(events.take(), vec!["b delete /b", "a delete /a"]);

    // Deletes run before creates.
    let only_b = snapshot(btreemap! {
        "/b" => json!({}),
    });
    let only_a = snapshot(btreemap! {
        "/a" => json!({}),
    });
    registry.commit(&only_b, &only_a).await.unwrap();
    assert_eq!(events.take(), vec!["b delete /b", "a write /a"]);
}

#[tokio::test]
async fn update_defaults_to_delete_and_write() {
    init_tracing();
    let events = Events::default();
    let registry = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("/a")
        .writer(recorder("a", &events))
        .build()
        .unwrap();

    let before = snapshot(btreemap! {
        "/a" => json!({"x": 1}),
    });
    let after = snapshot(btreemap! {
        "/a" => json!({"x": 2}),
    });
    registry.commit(&before, &after).await.unwrap();
    assert_eq!(events.take(), vec!["a delete /a", "a write /a"]);
}

// A delete must undo what the write did, not repeat it.
#[tokio::test]
async fn delete_differs_from_write() {
    let (backend, access) = session(DataTree::new());
    let registry = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("/a")
        .writer(MirrorWriter { access })
        .build()
        .unwrap();

    let empty = DataTree::new();
    let after = snapshot(btreemap! {
        "/a" => json!({"x": 1}),
    });
    registry.commit(&empty, &after).await.unwrap();
    registry.commit(&after, &empty).await.unwrap();

    assert_eq!(
        backend.writes(),
        vec![
            JournalEntry::Put(path("/a"), json!({"x": 1})),
            JournalEntry::Delete(path("/a")),
        ]
    );
    assert!(backend.config().is_empty());
}

#[tokio::test]
async fn writer_gates() {
    init_tracing();
    let events = Events::default();
    let registry = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("/instances/instance")
        .writer(recorder("instance", &events))
        .check(DiscriminatorCheck::key("instance", "name", ["red"]))
        .path("/instances/instance/config")
        .writer(recorder("config", &events))
        .check(DiscriminatorCheck::field(
            "instance",
            path("/config"),
            "type",
            ["L3VRF"],
        ))
        .build()
        .unwrap();

    let empty = DataTree::new();
    let after = snapshot(btreemap! {
        "/instances/instance[name='blue']" => json!({}),
        "/instances/instance[name='blue']/config" => json!({"type": "L2"}),
        "/instances/instance[name='red']" => json!({}),
        "/instances/instance[name='red']/config" => json!({"type": "L3VRF"}),
    });
    let report = registry.commit(&empty, &after).await.unwrap();
    assert_eq!(
        events.take(),
        vec![
            "instance write /instances/instance[name='red']",
            "config write /instances/instance[name='red']/config",
        ]
    );
    assert!(report.changes.contains(&AppliedChange {
        op: ChangeOp::Create,
        path: path("/instances/instance[name='blue']/config"),
        outcome: Outcome::Skipped(SkipReason::CheckRejected),
    }));

    // Deleted nodes are gated on their last known discriminator.
    registry.commit(&after, &empty).await.unwrap();
    assert_eq!(
        events.take(),
        vec![
            "config delete /instances/instance[name='red']/config",
            "instance delete /instances/instance[name='red']",
        ]
    );
}

#[tokio::test]
async fn structural_and_noop_nodes() {
    init_tracing();
    let registry = |policy| {
        Registry::builder(RegistryConfig {
            structural_writes: policy,
            ..Default::default()
        })
        .unit("test")
        .path("/container")
        .structural()
        .path("/container/ignored")
        .noop()
        .build()
        .unwrap()
    };
    let empty = DataTree::new();
    let after = snapshot(btreemap! {
        "/container" => json!({}),
        "/container/ignored" => json!({"x": 1}),
    });

    let report = registry(StructuralPolicy::Ignore)
        .commit(&empty, &after)
        .await
        .unwrap();
    assert_eq!(
        report.changes,
        vec![
            AppliedChange {
                op: ChangeOp::Create,
                path: path("/container"),
                outcome: Outcome::Skipped(SkipReason::Structural),
            },
            AppliedChange {
                op: ChangeOp::Create,
                path: path("/container/ignored"),
                outcome: Outcome::Skipped(SkipReason::Noop),
            },
        ]
    );

    let error = registry(StructuralPolicy::Reject)
        .commit(&empty, &after)
        .await
        .unwrap_err();
    assert!(matches!(error.root_cause(), Error::StructuralWrite(_)));
}

#[tokio::test]
async fn unregistered_path_rejected() {
    init_tracing();
    let registry = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("/a")
        .noop()
        .build()
        .unwrap();

    let after = snapshot(btreemap! {
        "/b" => json!({}),
    });
    let error = registry.commit(&DataTree::new(), &after).await.unwrap_err();
    assert!(matches!(error.root_cause(), Error::NoHandler(_)));
}

// Changes to subtree members reach the owner once, with the whole subtree.
#[tokio::test]
async fn subtree_writes_folded_into_owner() {
    let (backend, access) = session(snapshot(btreemap! {
        "/a" => json!({"x": 1, "config": {"y": 1}}),
    }));
    let registry = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("/a")
        .writer(MirrorWriter { access })
        .subtree(&["/config"])
        .build()
        .unwrap();

    let before = snapshot(btreemap! {
        "/a" => json!({"x": 1}),
        "/a/config" => json!({"y": 1}),
    });
    let after = snapshot(btreemap! {
        "/a" => json!({"x": 1}),
        "/a/config" => json!({"y": 2}),
    });
    let report = registry.commit(&before, &after).await.unwrap();

    assert_eq!(
        report.changes,
        vec![
            AppliedChange {
                op: ChangeOp::Update,
                path: path("/a/config"),
                outcome: Outcome::Skipped(SkipReason::FoldedIntoSubtree),
            },
            AppliedChange {
                op: ChangeOp::Update,
                path: path("/a"),
                outcome: Outcome::Applied,
            },
        ]
    );
    assert_eq!(
        backend.writes(),
        vec![JournalEntry::Put(
            path("/a"),
            json!({"x": 1, "config": {"y": 2}})
        )]
    );
}

// Failed writes name the neutral change, the backend path and the payload.
#[tokio::test]
async fn write_failure_carries_context() {
    let (backend, access) = session(DataTree::new());
    let registry = Registry::builder(RegistryConfig::default())
        .unit("test")
        .path("/a")
        .writer(MirrorWriter {
            access: access.clone(),
        })
        .path("/b")
        .writer(MirrorWriter { access })
        .after(&["/a"])
        .build()
        .unwrap();
    backend.fail_next_write(BackendError::permanent("access denied"));

    let after = snapshot(btreemap! {
        "/a" => json!({"x": 1}),
        "/b" => json!({}),
    });
    let error = registry.commit(&DataTree::new(), &after).await.unwrap_err();

    let Error::Change { op, path: change, .. } = &error else {
        panic!("missing change context: {error:?}");
    };
    assert_eq!((*op, change), (ChangeOp::Create, &path("/a")));
    let Error::Write(write) = error.root_cause() else {
        panic!("unexpected error: {error:?}");
    };
    assert_eq!(write.path, path("/a"));
    assert_eq!(write.op, WriteOp::Put);
    assert_eq!(write.payload, Some(json!({"x": 1})));
    assert!(!error.is_transient());

    // Execution stops at the first failure.
    assert_eq!(backend.writes().len(), 1);
}
