//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod common;

use common::*;
use holo_translate::access::memory::{JournalEntry, MemoryBackend};
use holo_translate::context::ReadContext;
use holo_translate::error::Error;
use holo_translate::path::{ListKey, path};
use holo_translate::tree::DataTree;
use holo_translate_units::platform::PlatformUnit;
use maplit::btreemap;
use serde_json::json;

const OS_STATE: &str = "/components/component[name='OS']/state";

fn inventory() -> DataTree {
    tree(btreemap! {
        "/inventory/card[name='0/RP0/CPU0']" => json!({
            "description": "Route Processor",
            "serial-number": "FOC1234",
            "part-number": "A9K-RSP880"
        }),
    })
}

#[tokio::test]
async fn os_state_from_rpc() {
    let device = device(MemoryBackend::new(DataTree::new()));
    device.backend.set_rpc_reply(
        PlatformUnit::SOFTWARE_INFORMATION,
        json!({"version": "7.3.2", "model": "ASR-9901"}),
    );

    let node = device
        .registry
        .read(&path(OS_STATE), &mut ReadContext::new())
        .await
        .unwrap();
    assert_eq!(
        node,
        Some(json!({
            "id": "OS",
            "name": "OS",
            "type": "OPERATING_SYSTEM",
            "description": "ASR-9901",
            "software-version": "7.3.2"
        }))
    );
    assert_eq!(
        device.backend.journal(),
        vec![JournalEntry::Rpc(
            PlatformUnit::SOFTWARE_INFORMATION.to_owned(),
            json!({})
        )]
    );
}

#[tokio::test]
async fn os_state_rpc_failure() {
    let device = device(MemoryBackend::new(DataTree::new()));

    let error = device
        .registry
        .read(&path(OS_STATE), &mut ReadContext::new())
        .await
        .unwrap_err();
    assert!(matches!(error, Error::Rpc(_)));
}

#[tokio::test]
async fn read_components() {
    let device =
        device(MemoryBackend::new(DataTree::new()).with_operational(inventory()));
    device
        .backend
        .set_rpc_reply(PlatformUnit::SOFTWARE_INFORMATION, json!({"version": "7.3.2"}));

    let keys = device
        .registry
        .list_keys(&path("/components/component"), &mut ReadContext::new())
        .await
        .unwrap();
    assert_eq!(
        keys,
        vec![
            ListKey::new("name", PlatformUnit::OS_COMPONENT),
            ListKey::new("name", "0/RP0/CPU0"),
        ]
    );

    let tree = device
        .registry
        .read_tree(&path("/components"), &mut ReadContext::new())
        .await
        .unwrap();
    assert_eq!(
        tree.get(&path(OS_STATE)),
        Some(&json!({
            "id": "OS",
            "name": "OS",
            "type": "OPERATING_SYSTEM",
            "software-version": "7.3.2"
        }))
    );
    assert_eq!(
        tree.get(&path("/components/component[name='0/RP0/CPU0']/state")),
        Some(&json!({
            "id": "0/RP0/CPU0",
            "name": "0/RP0/CPU0",
            "type": "LINECARD",
            "description": "Route Processor",
            "serial-no": "FOC1234",
            "part-no": "A9K-RSP880"
        }))
    );

    // Read-only: nothing is ever written.
    assert!(device.backend.writes().is_empty());
}
