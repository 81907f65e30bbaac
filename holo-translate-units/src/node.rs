//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use holo_translate::error::{Error, Result};
use holo_translate::path::InstancePath;
use holo_translate::tree::Node;
use serde::Serialize;
use serde::de::DeserializeOwned;

// Decodes a neutral or backend node into its typed form.
//
// Malformed nodes are invariant violations of the node's path.
pub fn decode<T: DeserializeOwned>(path: &InstancePath, node: &Node) -> Result<T> {
    serde_json::from_value(node.clone()).map_err(|error| {
        Error::InvariantViolation(path.clone(), format!("malformed data: {error}"))
    })
}

// Encodes a typed payload into a node.
pub fn encode<T: Serialize>(path: &InstancePath, value: &T) -> Result<Node> {
    serde_json::to_value(value).map_err(|error| {
        Error::InvariantViolation(path.clone(), format!("unencodable data: {error}"))
    })
}

// Name of the network instance a neutral path belongs to.
pub fn instance_name(path: &InstancePath) -> Result<&str> {
    key_component(path, "network-instance", "name")
}

// Component of the key of the nearest entry of the given list.
pub fn key_component<'a>(
    path: &'a InstancePath,
    node: &str,
    component: &str,
) -> Result<&'a str> {
    path.steps()
        .iter()
        .rev()
        .find(|step| step.node == node)
        .and_then(|step| step.key.as_ref())
        .and_then(|key| key.get(component))
        .ok_or_else(|| {
            Error::InvariantViolation(
                path.clone(),
                format!("missing {node} key component {component}"),
            )
        })
}

// Entries of a backend list read as an array.
pub fn entries(node: Option<Node>) -> Vec<Node> {
    match node {
        Some(Node::Array(entries)) => entries,
        Some(node) if node.is_object() => vec![node],
        _ => vec![],
    }
}
