//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use std::sync::Arc;

use common::*;
use holo_translate::access::memory::{JournalEntry, MemoryBackend};
use holo_translate::access::{Access, DataStore, WriteOp};
use holo_translate::config::AccessConfig;
use holo_translate::error::{BackendError, BackendErrorKind, Error};
use holo_translate::path::path;
use maplit::btreemap;
use serde_json::json;

const IFACE: &str = "/interfaces/interface[name='eth0']/config";

// Deleting one owner's fields leaves the fields of the other owner alone.
#[tokio::test]
async fn safe_delete_minimality() {
    let (backend, access) = session(snapshot(btreemap! {
        IFACE => json!({"mtu": 1500, "description": "uplink", "vrf": "red"}),
    }));

    access
        .safe_delete(&path(IFACE), &json!({"vrf": "red"}))
        .await
        .unwrap();
    assert_eq!(
        backend.writes(),
        vec![JournalEntry::Put(
            path(IFACE),
            json!({"mtu": 1500, "description": "uplink"})
        )]
    );
    assert_eq!(
        backend.config_node(&path(IFACE)),
        Some(json!({"mtu": 1500, "description": "uplink"}))
    );

    // The last owner takes the node with it.
    backend.clear_journal();
    access
        .safe_delete(&path(IFACE), &json!({"mtu": 1500, "description": "uplink"}))
        .await
        .unwrap();
    assert_eq!(backend.writes(), vec![JournalEntry::Delete(path(IFACE))]);
    assert_eq!(backend.config_node(&path(IFACE)), None);
}

#[tokio::test]
async fn safe_delete_keeps_foreign_values() {
    let (backend, access) = session(snapshot(btreemap! {
        IFACE => json!({"vrf": "blue"}),
    }));

    // The field was since taken over by another owner.
    access
        .safe_delete(&path(IFACE), &json!({"vrf": "red"}))
        .await
        .unwrap();
    // Absent nodes need no delete.
    access
        .safe_delete(&path("/interfaces/interface[name='eth1']/config"), &json!({}))
        .await
        .unwrap();

    assert!(backend.writes().is_empty());
    assert_eq!(backend.config_node(&path(IFACE)), Some(json!({"vrf": "blue"})));
}

#[tokio::test]
async fn safe_put_preserves_unrelated_fields() {
    let (backend, access) = session(snapshot(btreemap! {
        IFACE => json!({"mtu": 1500, "description": "uplink"}),
    }));

    // Already up to date.
    access
        .safe_put(&path(IFACE), &json!({"mtu": 1500}))
        .await
        .unwrap();
    assert!(backend.writes().is_empty());

    access
        .safe_put(&path(IFACE), &json!({"mtu": 9000}))
        .await
        .unwrap();
    assert_eq!(
        backend.writes(),
        vec![JournalEntry::Put(
            path(IFACE),
            json!({"mtu": 9000, "description": "uplink"})
        )]
    );
}

#[tokio::test]
async fn safe_merge_removes_dropped_fields() {
    let (backend, access) = session(snapshot(btreemap! {
        IFACE => json!({"mtu": 1500, "description": "uplink", "vrf": "red"}),
    }));

    let before = json!({"mtu": 1500, "description": "uplink"});
    let after = json!({"mtu": 1500});
    access
        .safe_merge(&path(IFACE), &before, &path(IFACE), &after)
        .await
        .unwrap();
    assert_eq!(
        backend.config_node(&path(IFACE)),
        Some(json!({"mtu": 1500, "vrf": "red"}))
    );

    // Nothing changes when the backend already reflects the new node.
    backend.clear_journal();
    access
        .safe_merge(&path(IFACE), &after, &path(IFACE), &after)
        .await
        .unwrap();
    assert!(backend.writes().is_empty());
}

// A node moving between backend paths is removed from the old one and
// written to the new one.
#[tokio::test]
async fn safe_merge_across_paths() {
    let old = "/bridge-domains/bridge-domain[name='bd1']";
    let new = "/xconnects/xconnect[name='bd1']";
    let (backend, access) = session(snapshot(btreemap! {
        old => json!({"mtu": 1500}),
    }));

    let node = json!({"mtu": 1500});
    access
        .safe_merge(&path(old), &node, &path(new), &node)
        .await
        .unwrap();
    assert_eq!(
        backend.writes(),
        vec![
            JournalEntry::Delete(path(old)),
            JournalEntry::Put(path(new), json!({"mtu": 1500})),
        ]
    );
}

#[tokio::test]
async fn transient_reads_retried() {
    let (backend, access) = session(snapshot(btreemap! {
        IFACE => json!({"mtu": 1500}),
    }));

    backend.fail_next_reads(2, BackendErrorKind::Transient);
    let node = access.read_config(&path(IFACE)).await.unwrap();
    assert_eq!(node, Some(json!({"mtu": 1500})));
    assert_eq!(backend.journal().len(), 3);

    backend.clear_journal();
    backend.fail_next_reads(3, BackendErrorKind::Transient);
    let error = access.read_config(&path(IFACE)).await.unwrap_err();
    assert_eq!(error.attempts, 3);
    assert_eq!(error.store, DataStore::Config);
    assert!(error.cause.is_transient());
    assert_eq!(backend.journal().len(), 3);
}

#[tokio::test]
async fn permanent_reads_not_retried() {
    let (backend, access) = session(snapshot(btreemap! {
        IFACE => json!({"mtu": 1500}),
    }));

    backend.fail_next_reads(1, BackendErrorKind::Permanent);
    let error = access.read_operational(&path(IFACE)).await.unwrap_err();
    assert_eq!(error.attempts, 1);
    assert_eq!(error.path, path(IFACE));
    assert_eq!(backend.journal().len(), 1);

    let error = Error::from(error);
    assert!(!error.is_transient());
}

#[tokio::test]
async fn read_attempts_configurable() {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new(snapshot(btreemap! {
        IFACE => json!({"mtu": 1500}),
    })));
    let access = Access::new(backend.clone(), AccessConfig { read_attempts: 1 });

    backend.fail_next_reads(1, BackendErrorKind::Transient);
    let error = access.read_config(&path(IFACE)).await.unwrap_err();
    assert_eq!(error.attempts, 1);
}

#[tokio::test]
async fn write_failure_carries_payload() {
    let (backend, access) = session(snapshot(btreemap! {}));

    backend.fail_next_write(BackendError::transient("session busy"));
    let error = access
        .merge(&path(IFACE), &json!({"mtu": 9000}))
        .await
        .unwrap_err();
    assert_eq!(error.path, path(IFACE));
    assert_eq!(error.op, WriteOp::Merge);
    assert_eq!(error.payload, Some(json!({"mtu": 9000})));
    assert!(Error::from(error).is_transient());

    backend.fail_next_write(BackendError::permanent("denied"));
    let error = access.delete(&path(IFACE)).await.unwrap_err();
    assert_eq!(error.op, WriteOp::Delete);
    assert_eq!(error.payload, None);
}

#[tokio::test]
async fn rpc_invocation() {
    let (backend, access) = session(snapshot(btreemap! {}));
    backend.set_rpc_reply(
        "get-software-information",
        json!({"version": "20.4R3"}),
    );

    let reply = access
        .invoke_rpc("get-software-information", &json!({}))
        .await
        .unwrap();
    assert_eq!(reply, json!({"version": "20.4R3"}));

    let error = access.invoke_rpc("reboot", &json!({})).await.unwrap_err();
    assert_eq!(error.operation, "reboot");
    assert_eq!(error.cause.kind, BackendErrorKind::Permanent);
    assert!(backend.writes().is_empty());
}
