//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::LazyLock as Lazy;

use async_trait::async_trait;
use derive_new::new;
use holo_translate::access::{Access, DataStore};
use holo_translate::context::{ReadContext, WriteContext};
use holo_translate::error::{Error, Result};
use holo_translate::path::{InstancePath, ListKey};
use holo_translate::reader::{ListReader, Reader};
use holo_translate::registry::RegistryBuilder;
use holo_translate::tree::Node;
use holo_translate::unit::TranslationUnit;
use holo_translate::writer::Writer;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::node::{self, decode, encode};
use crate::paths::{backend, neutral};
use crate::types::InterfaceType;

// Subinterface names: `<interface>.<index>`.
static SUBINTERFACE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?<interface>.+)\.(?<index>[0-9]+)$").unwrap()
});

// Interface configuration and state.
#[derive(Debug, Default)]
pub struct InterfaceUnit;

// Neutral interface configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterfaceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub ifc_type: InterfaceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

// Backend interface configuration fields owned by this unit.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InterfaceConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface_virtual: Option<bool>,
}

// Backend interface operational properties.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct InterfaceProperties {
    state: String,
    line_state: String,
    mtu: Option<u16>,
}

#[derive(Debug, new)]
pub struct InterfaceListReader {
    access: Access,
}

#[derive(Debug, new)]
pub struct InterfaceConfigReader {
    access: Access,
}

#[derive(Debug, new)]
pub struct InterfaceStateReader {
    access: Access,
}

#[derive(Debug, new)]
pub struct InterfaceConfigWriter {
    access: Access,
}

// ===== impl InterfaceUnit =====

impl TranslationUnit for InterfaceUnit {
    fn name(&self) -> &str {
        "interfaces"
    }

    fn schemas(&self) -> Vec<&'static str> {
        vec!["openconfig-interfaces"]
    }

    fn underlay_schemas(&self) -> Vec<&'static str> {
        vec!["Cisco-IOS-XR-ifmgr-cfg", "Cisco-IOS-XR-pfi-im-cmd-oper"]
    }

    fn provide_handlers(
        &self,
        builder: RegistryBuilder,
        access: &Access,
    ) -> RegistryBuilder {
        builder
            .path(neutral::INTERFACES)
            .structural()
            .path(neutral::INTERFACE)
            .list_reader(InterfaceListReader::new(access.clone()))
            .noop()
            .path(neutral::INTERFACE_CONFIG)
            .reader(InterfaceConfigReader::new(access.clone()))
            .writer(InterfaceConfigWriter::new(access.clone()))
            .path(neutral::INTERFACE_STATE)
            .reader(InterfaceStateReader::new(access.clone()))
    }
}

// ===== impl InterfaceConfig =====

impl InterfaceConfig {
    // Checks the configuration against the entry it belongs to.
    fn validate(&self, path: &InstancePath) -> Result<()> {
        let name = node::key_component(path, "interface", "name")?;
        if self.name != name {
            return Err(Error::InvariantViolation(
                path.clone(),
                format!("configured name {} does not match the key", self.name),
            ));
        }
        match InterfaceType::from_name(name) {
            Some(ifc_type) if ifc_type == self.ifc_type => Ok(()),
            Some(ifc_type) => Err(Error::InvariantViolation(
                path.clone(),
                format!(
                    "type {} does not match interface name (expected {})",
                    self.ifc_type, ifc_type
                ),
            )),
            None => Err(Error::InvariantViolation(
                path.clone(),
                format!("unsupported interface {name}"),
            )),
        }
    }

    fn backend_path(&self) -> InstancePath {
        backend::interface_configuration(&self.name)
    }
}

impl From<&InterfaceConfig> for InterfaceConfiguration {
    fn from(config: &InterfaceConfig) -> InterfaceConfiguration {
        InterfaceConfiguration {
            description: config.description.clone(),
            mtu: config.mtu,
            shutdown: (!config.enabled).then_some(true),
            interface_virtual: matches!(
                config.ifc_type,
                InterfaceType::Lag | InterfaceType::Loopback
            )
            .then_some(true),
        }
    }
}

// ===== impl InterfaceListReader =====

#[async_trait]
impl Reader for InterfaceListReader {
    async fn read(
        &self,
        _path: &InstancePath,
        _ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        Ok(None)
    }
}

#[async_trait]
impl ListReader for InterfaceListReader {
    // Subinterfaces share the backend list but are not interfaces of their
    // own.
    async fn list_keys(
        &self,
        _path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Vec<ListKey>> {
        let list = backend::interface_configurations();
        let entries = ctx.read_cached(&self.access, &list, DataStore::Config).await?;
        let keys = node::entries(entries)
            .iter()
            .filter_map(|entry| entry.get("interface-name"))
            .filter_map(|name| name.as_str())
            .filter(|name| !is_subinterface(name))
            .map(|name| ListKey::new("name", name))
            .collect();
        Ok(keys)
    }
}

// ===== impl InterfaceConfigReader =====

#[async_trait]
impl Reader for InterfaceConfigReader {
    async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        let name = node::key_component(path, "interface", "name")?;
        let Some(ifc_type) = InterfaceType::from_name(name) else {
            return Ok(None);
        };
        let backend_path = backend::interface_configuration(name);
        let Some(current) = ctx
            .read_cached(&self.access, &backend_path, DataStore::Config)
            .await?
        else {
            return Ok(None);
        };

        let current: InterfaceConfiguration = decode(&backend_path, &current)?;
        let config = InterfaceConfig {
            name: name.to_owned(),
            ifc_type,
            mtu: current.mtu,
            description: current.description,
            enabled: !current.shutdown.unwrap_or(false),
        };
        encode(path, &config).map(Some)
    }
}

// ===== impl InterfaceStateReader =====

#[async_trait]
impl Reader for InterfaceStateReader {
    async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        let name = node::key_component(path, "interface", "name")?;
        let backend_path = backend::interface_properties(name);
        let Some(properties) = ctx
            .read_cached(&self.access, &backend_path, DataStore::Operational)
            .await?
        else {
            return Ok(None);
        };

        let properties: InterfaceProperties = decode(&backend_path, &properties)?;
        let status = |state: &str| match state {
            "up" => "UP",
            _ => "DOWN",
        };
        let mut state = serde_json::json!({
            "name": name,
            "admin-status": status(&properties.state),
            "oper-status": status(&properties.line_state),
        });
        if let Some(ifc_type) = InterfaceType::from_name(name) {
            state["type"] = ifc_type.as_str().into();
        }
        if let Some(mtu) = properties.mtu {
            state["mtu"] = mtu.into();
        }
        Ok(Some(state))
    }
}

// ===== impl InterfaceConfigWriter =====

#[async_trait]
impl Writer for InterfaceConfigWriter {
    async fn write(
        &self,
        path: &InstancePath,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let config: InterfaceConfig = decode(path, after)?;
        config.validate(path)?;

        let backend_path = config.backend_path();
        let payload =
            encode(&backend_path, &InterfaceConfiguration::from(&config))?;
        self.access.safe_put(&backend_path, &payload).await
    }

    async fn update(
        &self,
        path: &InstancePath,
        before: &Node,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let old: InterfaceConfig = decode(path, before)?;
        let new: InterfaceConfig = decode(path, after)?;
        if old.ifc_type != new.ifc_type {
            return Err(Error::InvariantViolation(
                path.clone(),
                format!(
                    "interface type cannot change from {} to {}",
                    old.ifc_type, new.ifc_type
                ),
            ));
        }
        new.validate(path)?;

        let backend_path = new.backend_path();
        let payload_before =
            encode(&backend_path, &InterfaceConfiguration::from(&old))?;
        let payload_after =
            encode(&backend_path, &InterfaceConfiguration::from(&new))?;
        self.access
            .safe_merge(&backend_path, &payload_before, &backend_path, &payload_after)
            .await
    }

    async fn delete(
        &self,
        path: &InstancePath,
        before: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let config: InterfaceConfig = decode(path, before)?;

        let backend_path = config.backend_path();
        let payload =
            encode(&backend_path, &InterfaceConfiguration::from(&config))?;
        self.access.safe_delete(&backend_path, &payload).await
    }
}

// ===== global functions =====

// Splits a subinterface name into its parent interface and index.
pub fn subinterface(name: &str) -> Option<(&str, u32)> {
    let captures = SUBINTERFACE_NAME.captures(name)?;
    let index = captures.name("index")?.as_str().parse().ok()?;
    Some((captures.name("interface")?.as_str(), index))
}

pub fn is_subinterface(name: &str) -> bool {
    subinterface(name).is_some()
}

// ===== helper functions =====

fn enabled_default() -> bool {
    true
}

// ===== unit tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subinterface_names() {
        assert_eq!(
            subinterface("GigabitEthernet0/0/0/0.5"),
            Some(("GigabitEthernet0/0/0/0", 5))
        );
        assert_eq!(
            subinterface("Bundle-Ether100.200"),
            Some(("Bundle-Ether100", 200))
        );
        assert_eq!(subinterface("GigabitEthernet0/0/0/0"), None);
        assert_eq!(subinterface("Loopback0."), None);
        assert!(!is_subinterface("MgmtEth0/RP0/CPU0/0"));
    }
}
