//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use async_trait::async_trait;
use derive_new::new;
use holo_translate::access::{Access, DataStore};
use holo_translate::context::ReadContext;
use holo_translate::error::Result;
use holo_translate::path::{InstancePath, ListKey};
use holo_translate::reader::{ListReader, Reader};
use holo_translate::registry::RegistryBuilder;
use holo_translate::tree::Node;
use holo_translate::unit::TranslationUnit;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::debug::Debug;
use crate::node::{self, decode, encode};
use crate::paths::{backend, neutral};

// Platform components (read-only).
#[derive(Debug, Default)]
pub struct PlatformUnit;

// Neutral component state.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ComponentState {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_no: Option<String>,
}

// Reply of the software information command.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SoftwareInformation {
    version: String,
    model: Option<String>,
}

// Backend inventory card.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Card {
    description: Option<String>,
    serial_number: Option<String>,
    part_number: Option<String>,
}

// Lists the operating system and the inventory cards.
#[derive(Debug, new)]
pub struct ComponentListReader {
    access: Access,
}

#[derive(Debug, new)]
pub struct ComponentStateReader {
    access: Access,
}

// ===== impl PlatformUnit =====

impl PlatformUnit {
    // Name of the component standing for the device operating system.
    pub const OS_COMPONENT: &'static str = "OS";
    pub const SOFTWARE_INFORMATION: &'static str = "get-software-information";
}

impl TranslationUnit for PlatformUnit {
    fn name(&self) -> &str {
        "platform"
    }

    fn schemas(&self) -> Vec<&'static str> {
        vec!["openconfig-platform"]
    }

    fn underlay_schemas(&self) -> Vec<&'static str> {
        vec!["Cisco-IOS-XR-plat-chas-invmgr-oper"]
    }

    fn provide_handlers(
        &self,
        builder: RegistryBuilder,
        access: &Access,
    ) -> RegistryBuilder {
        builder
            .path(neutral::COMPONENTS)
            .structural()
            .path(neutral::COMPONENT)
            .list_reader(ComponentListReader::new(access.clone()))
            .path(neutral::COMPONENT_STATE)
            .reader(ComponentStateReader::new(access.clone()))
    }
}

// ===== impl ComponentListReader =====

#[async_trait]
impl Reader for ComponentListReader {
    async fn read(
        &self,
        _path: &InstancePath,
        _ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        Ok(None)
    }
}

#[async_trait]
impl ListReader for ComponentListReader {
    async fn list_keys(
        &self,
        _path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Vec<ListKey>> {
        let list = backend::inventory_cards();
        let cards = ctx
            .read_cached(&self.access, &list, DataStore::Operational)
            .await?;

        let mut keys = vec![ListKey::new("name", PlatformUnit::OS_COMPONENT)];
        keys.extend(
            node::entries(cards)
                .iter()
                .filter_map(|card| card.get("name"))
                .filter_map(|name| name.as_str())
                .map(|name| ListKey::new("name", name)),
        );
        Ok(keys)
    }
}

// ===== impl ComponentStateReader =====

impl ComponentStateReader {
    async fn os_state(&self, path: &InstancePath) -> Result<ComponentState> {
        let reply = self
            .access
            .invoke_rpc(PlatformUnit::SOFTWARE_INFORMATION, &json!({}))
            .await?;
        let software: SoftwareInformation = decode(path, &reply)?;
        Ok(ComponentState {
            id: PlatformUnit::OS_COMPONENT.to_owned(),
            name: PlatformUnit::OS_COMPONENT.to_owned(),
            component_type: "OPERATING_SYSTEM".to_owned(),
            description: software.model,
            software_version: Some(software.version),
            ..Default::default()
        })
    }

    async fn card_state(
        &self,
        name: &str,
        ctx: &mut ReadContext,
    ) -> Result<Option<ComponentState>> {
        let backend_path =
            backend::inventory_cards().with_key(ListKey::new("name", name));
        let Some(card) = ctx
            .read_cached(&self.access, &backend_path, DataStore::Operational)
            .await?
        else {
            return Ok(None);
        };

        let card: Card = decode(&backend_path, &card)?;
        Ok(Some(ComponentState {
            id: name.to_owned(),
            name: name.to_owned(),
            component_type: "LINECARD".to_owned(),
            description: card.description,
            software_version: None,
            serial_no: card.serial_number,
            part_no: card.part_number,
        }))
    }
}

#[async_trait]
impl Reader for ComponentStateReader {
    async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        let name = node::key_component(path, "component", "name")?;
        Debug::ComponentRead(name).log();

        let state = if name == PlatformUnit::OS_COMPONENT {
            Some(self.os_state(path).await?)
        } else {
            self.card_state(name, ctx).await?
        };
        state.map(|state| encode(path, &state)).transpose()
    }
}
