//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use async_trait::async_trait;
use derive_new::new;
use holo_translate::access::{Access, DataStore};
use holo_translate::check::{AlwaysCheck, Check, CheckContext, DiscriminatorCheck};
use holo_translate::context::{ReadContext, WriteContext};
use holo_translate::error::{Error, Result};
use holo_translate::path::{InstancePath, ListKey};
use holo_translate::reader::{CompositeListReader, CompositeReader, ListReader, Reader};
use holo_translate::registry::RegistryBuilder;
use holo_translate::tree::Node;
use holo_translate::unit::TranslationUnit;
use holo_translate::writer::{CompositeWriter, Writer, WriterChild};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::debug::Debug;
use crate::interface::{is_subinterface, subinterface};
use crate::node::{self, decode, encode};
use crate::paths::{backend, neutral};
use crate::types::NetworkInstanceType;

// Network instances and their interface bindings.
//
// Depends on the interfaces unit, whose configuration must be in place
// before interfaces are bound to VRFs.
#[derive(Debug, Default)]
pub struct NetworkInstanceUnit;

// Neutral network instance configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkInstanceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NetworkInstanceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_distinguisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u16>,
}

// Neutral configuration of an interface bound to a network instance.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InstanceInterfaceConfig {
    pub id: String,
    pub interface: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subinterface: Option<u32>,
}

// Backend VRF.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
struct Vrf {
    #[serde(default)]
    create: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    route_distinguisher: Option<String>,
}

// Backend L2 service (point-to-point xconnect or bridge domain).
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
struct L2Service {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mtu: Option<u16>,
}

// Lists the network instances of one type.
#[derive(Debug, new)]
pub struct InstanceLister {
    access: Access,
    kind: NetworkInstanceType,
}

// Resolves the type of a network instance before dispatching to the reader
// of that type.
#[derive(new)]
pub struct NetworkInstanceConfigReader {
    access: Access,
    kinds: CompositeReader,
}

#[derive(Debug, Default)]
pub struct DefaultConfigReader;

#[derive(Debug, new)]
pub struct L3VrfConfigReader {
    access: Access,
}

#[derive(Debug, new)]
pub struct L2ConfigReader {
    access: Access,
}

// The default instance always exists on the device. It can be neither
// created under another name, retyped nor deleted.
#[derive(Debug, Default)]
pub struct DefaultConfigWriter;

#[derive(Debug, new)]
pub struct L3VrfConfigWriter {
    access: Access,
}

// Handles both L2 kinds, so that moving an instance from one kind to the
// other is a single update.
#[derive(Debug, new)]
pub struct L2ConfigWriter {
    access: Access,
}

#[derive(Debug, new)]
pub struct InstanceInterfaceListReader {
    access: Access,
}

#[derive(Debug, Default)]
pub struct InstanceInterfaceConfigReader;

// Binds interfaces to VRFs in the shared backend interface configuration.
#[derive(Debug, new)]
pub struct VrfInterfaceConfigWriter {
    access: Access,
}

// ===== impl NetworkInstanceUnit =====

impl TranslationUnit for NetworkInstanceUnit {
    fn name(&self) -> &str {
        "network-instances"
    }

    fn schemas(&self) -> Vec<&'static str> {
        vec!["openconfig-network-instance"]
    }

    fn underlay_schemas(&self) -> Vec<&'static str> {
        vec![
            "Cisco-IOS-XR-infra-rsi-cfg",
            "Cisco-IOS-XR-l2vpn-cfg",
            "Cisco-IOS-XR-ifmgr-cfg",
        ]
    }

    fn provide_handlers(
        &self,
        builder: RegistryBuilder,
        access: &Access,
    ) -> RegistryBuilder {
        let instances = [
            NetworkInstanceType::Default,
            NetworkInstanceType::L3Vrf,
            NetworkInstanceType::L2P2P,
            NetworkInstanceType::L2Vsi,
        ]
        .into_iter()
        .fold(CompositeListReader::default(), |reader, kind| {
            reader.child(AlwaysCheck, InstanceLister::new(access.clone(), kind))
        });
        let config_reader = NetworkInstanceConfigReader::new(
            access.clone(),
            CompositeReader::default()
                .child(
                    type_check(&[NetworkInstanceType::Default]),
                    DefaultConfigReader,
                )
                .child(
                    type_check(&[NetworkInstanceType::L3Vrf]),
                    L3VrfConfigReader::new(access.clone()),
                )
                .child(
                    type_check(&[
                        NetworkInstanceType::L2P2P,
                        NetworkInstanceType::L2Vsi,
                    ]),
                    L2ConfigReader::new(access.clone()),
                ),
        );
        let config_writer = CompositeWriter::default()
            .child(DefaultConfigWriter)
            .child(L3VrfConfigWriter::new(access.clone()))
            .child(L2ConfigWriter::new(access.clone()))
            .policy(builder.unhandled_policy());

        builder
            .path(neutral::NETWORK_INSTANCES)
            .structural()
            .path(neutral::NETWORK_INSTANCE)
            .list_reader(instances)
            .noop()
            .path(neutral::NETWORK_INSTANCE_CONFIG)
            .reader(config_reader)
            .writer(config_writer)
            .after(&[neutral::INTERFACE_CONFIG])
            .path(neutral::NI_INTERFACES)
            .structural()
            .path(neutral::NI_INTERFACE)
            .list_reader(InstanceInterfaceListReader::new(access.clone()))
            .noop()
            .path(neutral::NI_INTERFACE_CONFIG)
            .reader(InstanceInterfaceConfigReader)
            .writer(VrfInterfaceConfigWriter::new(access.clone()))
            .after(&[neutral::NETWORK_INSTANCE_CONFIG])
    }
}

// ===== impl NetworkInstanceConfig =====

impl NetworkInstanceConfig {
    fn vrf(&self) -> Vrf {
        Vrf {
            create: true,
            description: self.description.clone(),
            route_distinguisher: self.route_distinguisher.clone(),
        }
    }

    fn l2_service(&self) -> L2Service {
        L2Service {
            description: self.description.clone(),
            mtu: self.mtu,
        }
    }

    // Backend path of an L2 instance.
    fn l2_path(&self) -> Option<InstancePath> {
        match self.kind {
            NetworkInstanceType::L2P2P => Some(backend::xconnect(&self.name)),
            NetworkInstanceType::L2Vsi => Some(backend::bridge_domain(&self.name)),
            _ => None,
        }
    }
}

// ===== impl InstanceInterfaceConfig =====

impl InstanceInterfaceConfig {
    fn from_id(id: &str) -> InstanceInterfaceConfig {
        let (interface, index) = match subinterface(id) {
            Some((interface, index)) => (interface, Some(index)),
            None => (id, None),
        };
        InstanceInterfaceConfig {
            id: id.to_owned(),
            interface: interface.to_owned(),
            subinterface: index,
        }
    }
}

// ===== impl InstanceLister =====

impl InstanceLister {
    // Backend list holding the instances of this type, and the name of
    // its key.
    fn backend_list(&self) -> Option<(InstancePath, &'static str)> {
        match self.kind {
            NetworkInstanceType::Default => None,
            NetworkInstanceType::L3Vrf => Some((backend::vrfs(), "vrf-name")),
            NetworkInstanceType::L2P2P => Some((backend::xconnects(), "name")),
            NetworkInstanceType::L2Vsi => Some((backend::bridge_domains(), "name")),
        }
    }
}

#[async_trait]
impl Reader for InstanceLister {
    async fn read(
        &self,
        _path: &InstancePath,
        _ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        Ok(None)
    }
}

#[async_trait]
impl ListReader for InstanceLister {
    async fn list_keys(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Vec<ListKey>> {
        let names = match self.backend_list() {
            None => vec![NetworkInstanceType::DEFAULT_NAME.to_owned()],
            Some((list, key)) => {
                let entries =
                    ctx.read_cached(&self.access, &list, DataStore::Config).await?;
                node::entries(entries)
                    .iter()
                    .filter_map(|entry| entry.get(key))
                    .filter_map(|name| name.as_str())
                    .filter(|name| *name != NetworkInstanceType::DEFAULT_NAME)
                    .map(str::to_owned)
                    .collect()
            }
        };

        // The type of every listed instance is known from here on.
        let mut keys = vec![];
        for name in names {
            let key = ListKey::new("name", name);
            let config = path.with_key(key.clone()).child("config");
            ctx.record_discriminator(
                &config,
                NetworkInstanceType::FIELD,
                self.kind.as_str(),
            );
            keys.push(key);
        }
        Ok(keys)
    }
}

// ===== impl NetworkInstanceConfigReader =====

#[async_trait]
impl Reader for NetworkInstanceConfigReader {
    async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        if resolve_type(&self.access, path, ctx).await?.is_none() {
            return Ok(None);
        }
        self.kinds.read(path, ctx).await
    }

    fn checks(&self) -> Vec<&dyn Check> {
        self.kinds.checks()
    }
}

// ===== impl DefaultConfigReader =====

#[async_trait]
impl Reader for DefaultConfigReader {
    async fn read(
        &self,
        path: &InstancePath,
        _ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        let config = NetworkInstanceConfig {
            name: node::instance_name(path)?.to_owned(),
            kind: NetworkInstanceType::Default,
            description: None,
            route_distinguisher: None,
            mtu: None,
        };
        encode(path, &config).map(Some)
    }
}

// ===== impl L3VrfConfigReader =====

#[async_trait]
impl Reader for L3VrfConfigReader {
    async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        let name = node::instance_name(path)?;
        let backend_path = backend::vrf(name);
        let Some(vrf) = ctx
            .read_cached(&self.access, &backend_path, DataStore::Config)
            .await?
        else {
            return Ok(None);
        };

        let vrf: Vrf = decode(&backend_path, &vrf)?;
        let config = NetworkInstanceConfig {
            name: name.to_owned(),
            kind: NetworkInstanceType::L3Vrf,
            description: vrf.description,
            route_distinguisher: vrf.route_distinguisher,
            mtu: None,
        };
        encode(path, &config).map(Some)
    }
}

// ===== impl L2ConfigReader =====

#[async_trait]
impl Reader for L2ConfigReader {
    async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        let name = node::instance_name(path)?;
        let kind = ctx
            .discriminator(path, NetworkInstanceType::FIELD)
            .and_then(|kind| kind.parse().ok());
        let (kind, backend_path) = match kind {
            Some(kind @ NetworkInstanceType::L2P2P) => (kind, backend::xconnect(name)),
            Some(kind @ NetworkInstanceType::L2Vsi) => {
                (kind, backend::bridge_domain(name))
            }
            _ => return Ok(None),
        };
        let Some(service) = ctx
            .read_cached(&self.access, &backend_path, DataStore::Config)
            .await?
        else {
            return Ok(None);
        };

        let service: L2Service = decode(&backend_path, &service)?;
        let config = NetworkInstanceConfig {
            name: name.to_owned(),
            kind,
            description: service.description,
            route_distinguisher: None,
            mtu: service.mtu,
        };
        encode(path, &config).map(Some)
    }
}

// ===== impl DefaultConfigWriter =====

#[async_trait]
impl WriterChild for DefaultConfigWriter {
    async fn try_write(
        &self,
        path: &InstancePath,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<bool> {
        let config: NetworkInstanceConfig = decode(path, after)?;
        if config.kind != NetworkInstanceType::Default {
            return Ok(false);
        }
        if config.name != NetworkInstanceType::DEFAULT_NAME {
            return Err(Error::InvariantViolation(
                path.clone(),
                format!(
                    "default instance must be named {}",
                    NetworkInstanceType::DEFAULT_NAME
                ),
            ));
        }
        Debug::DefaultInstanceSkipped(path).log();
        Ok(true)
    }

    async fn try_update(
        &self,
        path: &InstancePath,
        before: &Node,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<bool> {
        let old: NetworkInstanceConfig = decode(path, before)?;
        let new: NetworkInstanceConfig = decode(path, after)?;
        match (old.kind, new.kind) {
            (NetworkInstanceType::Default, NetworkInstanceType::Default) => {
                Debug::DefaultInstanceSkipped(path).log();
                Ok(true)
            }
            (NetworkInstanceType::Default, _) | (_, NetworkInstanceType::Default) => {
                Err(type_change(path, old.kind, new.kind))
            }
            _ => Ok(false),
        }
    }

    async fn try_delete(
        &self,
        path: &InstancePath,
        before: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<bool> {
        let config: NetworkInstanceConfig = decode(path, before)?;
        if config.kind != NetworkInstanceType::Default {
            return Ok(false);
        }
        Err(Error::InvariantViolation(
            path.clone(),
            "default instance cannot be deleted".to_owned(),
        ))
    }
}

// ===== impl L3VrfConfigWriter =====

#[async_trait]
impl WriterChild for L3VrfConfigWriter {
    async fn try_write(
        &self,
        path: &InstancePath,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<bool> {
        let config: NetworkInstanceConfig = decode(path, after)?;
        if config.kind != NetworkInstanceType::L3Vrf {
            return Ok(false);
        }

        let backend_path = backend::vrf(&config.name);
        let payload = encode(&backend_path, &config.vrf())?;
        self.access.safe_put(&backend_path, &payload).await?;
        Ok(true)
    }

    async fn try_update(
        &self,
        path: &InstancePath,
        before: &Node,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<bool> {
        let old: NetworkInstanceConfig = decode(path, before)?;
        let new: NetworkInstanceConfig = decode(path, after)?;
        if old.kind != NetworkInstanceType::L3Vrf {
            return Ok(false);
        }
        if new.kind != NetworkInstanceType::L3Vrf {
            return Err(type_change(path, old.kind, new.kind));
        }

        let path_before = backend::vrf(&old.name);
        let path_after = backend::vrf(&new.name);
        let payload_before = encode(&path_before, &old.vrf())?;
        let payload_after = encode(&path_after, &new.vrf())?;
        self.access
            .safe_merge(&path_before, &payload_before, &path_after, &payload_after)
            .await?;
        Ok(true)
    }

    async fn try_delete(
        &self,
        path: &InstancePath,
        before: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<bool> {
        let config: NetworkInstanceConfig = decode(path, before)?;
        if config.kind != NetworkInstanceType::L3Vrf {
            return Ok(false);
        }

        let backend_path = backend::vrf(&config.name);
        let payload = encode(&backend_path, &config.vrf())?;
        self.access.safe_delete(&backend_path, &payload).await?;
        Ok(true)
    }
}

// ===== impl L2ConfigWriter =====

#[async_trait]
impl WriterChild for L2ConfigWriter {
    async fn try_write(
        &self,
        path: &InstancePath,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<bool> {
        let config: NetworkInstanceConfig = decode(path, after)?;
        let Some(backend_path) = config.l2_path() else {
            return Ok(false);
        };

        let payload = encode(&backend_path, &config.l2_service())?;
        self.access.safe_put(&backend_path, &payload).await?;
        Ok(true)
    }

    async fn try_update(
        &self,
        path: &InstancePath,
        before: &Node,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<bool> {
        let old: NetworkInstanceConfig = decode(path, before)?;
        let new: NetworkInstanceConfig = decode(path, after)?;
        let Some(path_before) = old.l2_path() else {
            return Ok(false);
        };
        let Some(path_after) = new.l2_path() else {
            return Err(type_change(path, old.kind, new.kind));
        };
        if old.kind != new.kind {
            Debug::InstanceKindSwitch(&new.name, old.kind, new.kind).log();
        }

        // Switching kinds moves the service between backend lists.
        let payload_before = encode(&path_before, &old.l2_service())?;
        let payload_after = encode(&path_after, &new.l2_service())?;
        self.access
            .safe_merge(&path_before, &payload_before, &path_after, &payload_after)
            .await?;
        Ok(true)
    }

    async fn try_delete(
        &self,
        path: &InstancePath,
        before: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<bool> {
        let config: NetworkInstanceConfig = decode(path, before)?;
        let Some(backend_path) = config.l2_path() else {
            return Ok(false);
        };

        let payload = encode(&backend_path, &config.l2_service())?;
        self.access.safe_delete(&backend_path, &payload).await?;
        Ok(true)
    }
}

// ===== impl InstanceInterfaceListReader =====

#[async_trait]
impl Reader for InstanceInterfaceListReader {
    async fn read(
        &self,
        _path: &InstancePath,
        _ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        Ok(None)
    }
}

#[async_trait]
impl ListReader for InstanceInterfaceListReader {
    // Subinterfaces bound to the VRF of the instance. Unbound interfaces
    // are not listed under the default instance.
    async fn list_keys(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Vec<ListKey>> {
        let name = node::instance_name(path)?;
        if name == NetworkInstanceType::DEFAULT_NAME {
            return Ok(vec![]);
        }

        let list = backend::interface_configurations();
        let entries = ctx.read_cached(&self.access, &list, DataStore::Config).await?;
        let keys = node::entries(entries)
            .iter()
            .filter(|entry| entry.get("vrf").and_then(|vrf| vrf.as_str()) == Some(name))
            .filter_map(|entry| entry.get("interface-name"))
            .filter_map(|interface| interface.as_str())
            .filter(|interface| is_subinterface(interface))
            .map(|interface| ListKey::new("id", interface))
            .collect();
        Ok(keys)
    }
}

// ===== impl InstanceInterfaceConfigReader =====

#[async_trait]
impl Reader for InstanceInterfaceConfigReader {
    async fn read(
        &self,
        path: &InstancePath,
        _ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        let id = node::key_component(path, "interface", "id")?;
        encode(path, &InstanceInterfaceConfig::from_id(id)).map(Some)
    }
}

// ===== impl VrfInterfaceConfigWriter =====

impl VrfInterfaceConfigWriter {
    // Whether the instance a binding belongs to is an L3 VRF.
    fn binds_vrf(
        path: &InstancePath,
        vrf: &str,
        ctx: &WriteContext<'_>,
    ) -> bool {
        if vrf == NetworkInstanceType::DEFAULT_NAME {
            Debug::DefaultInstanceSkipped(path).log();
            return false;
        }
        if !type_check(&[NetworkInstanceType::L3Vrf]).applicable(path, ctx) {
            Debug::NonVrfInstanceSkipped(path).log();
            return false;
        }
        true
    }

    // Name of the bound subinterface. Main interfaces cannot be bound.
    fn bound_subinterface<'a>(
        path: &'a InstancePath,
        data: &Node,
    ) -> Result<&'a str> {
        let id = node::key_component(path, "interface", "id")?;
        if !is_subinterface(id) {
            return Err(Error::InvariantViolation(
                path.clone(),
                format!("only subinterfaces can be bound to a VRF ({id})"),
            ));
        }
        let config: InstanceInterfaceConfig = decode(path, data)?;
        if config.id != id {
            return Err(Error::InvariantViolation(
                path.clone(),
                format!("configured id {} does not match the key", config.id),
            ));
        }
        Ok(id)
    }
}

#[async_trait]
impl Writer for VrfInterfaceConfigWriter {
    async fn write(
        &self,
        path: &InstancePath,
        after: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let vrf = node::instance_name(path)?;
        if !Self::binds_vrf(path, vrf, ctx) {
            return Ok(());
        }
        let name = Self::bound_subinterface(path, after)?;

        // The subinterface must already be configured on the device.
        let backend_path = backend::interface_configuration(name);
        if self.access.read_config(&backend_path).await?.is_none() {
            return Err(Error::InvariantViolation(
                path.clone(),
                format!("subinterface {name} does not exist"),
            ));
        }

        Debug::InterfaceBind(name, vrf).log();
        self.access.safe_put(&backend_path, &json!({"vrf": vrf})).await
    }

    async fn delete(
        &self,
        path: &InstancePath,
        before: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let vrf = node::instance_name(path)?;
        if !Self::binds_vrf(path, vrf, ctx) {
            return Ok(());
        }
        let name = Self::bound_subinterface(path, before)?;

        Debug::InterfaceUnbind(name, vrf).log();
        self.access
            .safe_delete(&backend::interface_configuration(name), &json!({"vrf": vrf}))
            .await
    }
}

// ===== global functions =====

// Resolves the type of the network instance a path belongs to and records
// it as the `type` discriminator of the instance's config.
//
// Instances absent from the backend resolve to `None`.
pub async fn resolve_type(
    access: &Access,
    path: &InstancePath,
    ctx: &mut ReadContext,
) -> Result<Option<NetworkInstanceType>> {
    let Some(instance) = path.ancestor("network-instance") else {
        return Ok(None);
    };
    let config = instance.child("config");
    if let Some(kind) = ctx.discriminator(&config, NetworkInstanceType::FIELD) {
        if let Ok(kind) = kind.parse() {
            return Ok(Some(kind));
        }
    }

    let name = node::instance_name(&instance)?;
    let kind = if name == NetworkInstanceType::DEFAULT_NAME {
        Some(NetworkInstanceType::Default)
    } else {
        let candidates = [
            (NetworkInstanceType::L3Vrf, backend::vrf(name)),
            (NetworkInstanceType::L2P2P, backend::xconnect(name)),
            (NetworkInstanceType::L2Vsi, backend::bridge_domain(name)),
        ];
        let mut found = None;
        for (kind, backend_path) in candidates {
            if ctx
                .read_cached(access, &backend_path, DataStore::Config)
                .await?
                .is_some()
            {
                found = Some(kind);
                break;
            }
        }
        found
    };

    if let Some(kind) = kind {
        Debug::InstanceTypeResolved(&config, kind).log();
        ctx.record_discriminator(&config, NetworkInstanceType::FIELD, kind.as_str());
    }
    Ok(kind)
}

// ===== helper functions =====

// Gate on the type of the enclosing network instance.
fn type_check(kinds: &[NetworkInstanceType]) -> DiscriminatorCheck {
    DiscriminatorCheck::field(
        "network-instance",
        InstancePath::root().child("config"),
        NetworkInstanceType::FIELD,
        kinds.iter().map(NetworkInstanceType::as_str),
    )
}

fn type_change(
    path: &InstancePath,
    before: NetworkInstanceType,
    after: NetworkInstanceType,
) -> Error {
    Error::InvariantViolation(
        path.clone(),
        format!("network instance type cannot change from {before} to {after}"),
    )
}
