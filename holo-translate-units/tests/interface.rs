//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use common::*;
use holo_translate::access::memory::{JournalEntry, MemoryBackend};
use holo_translate::context::ReadContext;
use holo_translate::path::path;
use holo_translate::tree::DataTree;
use maplit::btreemap;
use serde_json::json;

const GI0: &str = "GigabitEthernet0/0/0/0";
const GI0_CONFIG: &str = "/interfaces/interface[name='GigabitEthernet0/0/0/0']/config";
const GI0_STATE: &str = "/interfaces/interface[name='GigabitEthernet0/0/0/0']/state";
const GI0_BACKEND: &str = "/interface-configurations/interface-configuration[interface-name='GigabitEthernet0/0/0/0']";
const ETHERNET: &str = "iana-if-type:ethernetCsmacd";

// The type of an interface follows from its name and can never change. The
// request is refused before the backend is touched.
#[tokio::test]
async fn interface_type_immutable() {
    let device = device_with(btreemap! {
        GI0_BACKEND => json!({"mtu": 1500}),
    });

    let before = tree(btreemap! {
        GI0_CONFIG => json!({"name": GI0, "type": ETHERNET, "mtu": 1500}),
    });
    let after = tree(btreemap! {
        GI0_CONFIG => json!({
            "name": GI0,
            "type": "iana-if-type:ieee8023adLag",
            "mtu": 1500
        }),
    });
    let error = device.registry.commit(&before, &after).await.unwrap_err();

    assert!(error.is_invariant_violation());
    assert!(device.backend.journal().is_empty());
}

#[tokio::test]
async fn interface_config_validated() {
    let device = device_with(btreemap! {});

    // Type not matching the name.
    let after = tree(btreemap! {
        GI0_CONFIG => json!({
            "name": GI0,
            "type": "iana-if-type:softwareLoopback"
        }),
    });
    let error = device
        .registry
        .commit(&DataTree::new(), &after)
        .await
        .unwrap_err();
    assert!(error.is_invariant_violation());

    // Name not matching the key.
    let after = tree(btreemap! {
        GI0_CONFIG => json!({
            "name": "GigabitEthernet0/0/0/1",
            "type": ETHERNET
        }),
    });
    let error = device
        .registry
        .commit(&DataTree::new(), &after)
        .await
        .unwrap_err();
    assert!(error.is_invariant_violation());

    // Interface kind without backend support.
    let after = tree(btreemap! {
        "/interfaces/interface[name='Tunnel0']/config" => json!({
            "name": "Tunnel0",
            "type": ETHERNET
        }),
    });
    let error = device
        .registry
        .commit(&DataTree::new(), &after)
        .await
        .unwrap_err();
    assert!(error.is_invariant_violation());

    assert!(device.backend.writes().is_empty());
}

#[tokio::test]
async fn interface_config_lifecycle() {
    let device = device_with(btreemap! {});

    let disabled = tree(btreemap! {
        GI0_CONFIG => json!({
            "name": GI0,
            "type": ETHERNET,
            "mtu": 9000,
            "description": "uplink",
            "enabled": false
        }),
    });
    device
        .registry
        .commit(&DataTree::new(), &disabled)
        .await
        .unwrap();
    assert_eq!(
        device.backend.writes(),
        vec![JournalEntry::Put(
            path(GI0_BACKEND),
            json!({"description": "uplink", "mtu": 9000, "shutdown": true})
        )]
    );

    let node = device
        .registry
        .read(&path(GI0_CONFIG), &mut ReadContext::new())
        .await
        .unwrap();
    assert_eq!(node.as_ref(), disabled.get(&path(GI0_CONFIG)));

    // Enabling the interface removes the shutdown flag only.
    let enabled = tree(btreemap! {
        GI0_CONFIG => json!({
            "name": GI0,
            "type": ETHERNET,
            "mtu": 9000,
            "description": "uplink",
            "enabled": true
        }),
    });
    device.backend.clear_journal();
    device.registry.commit(&disabled, &enabled).await.unwrap();
    assert_eq!(
        device.backend.writes(),
        vec![JournalEntry::Put(
            path(GI0_BACKEND),
            json!({"description": "uplink", "mtu": 9000})
        )]
    );
}

// Deleting an interface keeps the fields other units own on the shared
// backend node.
#[tokio::test]
async fn interface_delete_keeps_vrf_binding() {
    let device = device_with(btreemap! {
        GI0_BACKEND => json!({"mtu": 1500, "vrf": "red"}),
    });

    let before = tree(btreemap! {
        GI0_CONFIG => json!({"name": GI0, "type": ETHERNET, "mtu": 1500}),
    });
    device
        .registry
        .commit(&before, &DataTree::new())
        .await
        .unwrap();

    assert_eq!(
        device.backend.writes(),
        vec![JournalEntry::Put(path(GI0_BACKEND), json!({"vrf": "red"}))]
    );
}

#[tokio::test]
async fn read_interfaces() {
    let config = tree(btreemap! {
        GI0_BACKEND => json!({"mtu": 1500}),
        "/interface-configurations/interface-configuration[interface-name='Loopback0']" =>
            json!({"interface-virtual": true, "description": "router-id"}),
    });
    let operational = tree(btreemap! {
        "/interface-properties/interface[interface-name='GigabitEthernet0/0/0/0']" =>
            json!({"state": "up", "line-state": "down", "mtu": 1514}),
    });
    let device = device(MemoryBackend::new(config).with_operational(operational));

    let tree = device
        .registry
        .read_tree(&path("/interfaces"), &mut ReadContext::new())
        .await
        .unwrap();
    assert_eq!(
        tree.get(&path(GI0_CONFIG)),
        Some(&json!({"name": GI0, "type": ETHERNET, "mtu": 1500, "enabled": true}))
    );
    assert_eq!(
        tree.get(&path(GI0_STATE)),
        Some(&json!({
            "name": GI0,
            "admin-status": "UP",
            "oper-status": "DOWN",
            "type": ETHERNET,
            "mtu": 1514
        }))
    );
    assert_eq!(
        tree.get(&path("/interfaces/interface[name='Loopback0']/config")),
        Some(&json!({
            "name": "Loopback0",
            "type": "iana-if-type:softwareLoopback",
            "description": "router-id",
            "enabled": true
        }))
    );
    assert_eq!(
        tree.get(&path("/interfaces/interface[name='Loopback0']/state")),
        None
    );
}
