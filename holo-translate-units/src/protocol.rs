//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use async_trait::async_trait;
use derive_new::new;
use holo_translate::access::{Access, DataStore};
use holo_translate::check::DiscriminatorCheck;
use holo_translate::context::{ReadContext, WriteContext};
use holo_translate::error::{Error, Result};
use holo_translate::path::{InstancePath, ListKey};
use holo_translate::reader::{CompositeListReader, ListReader, Reader};
use holo_translate::registry::RegistryBuilder;
use holo_translate::tree::{DataTree, Node};
use holo_translate::unit::TranslationUnit;
use holo_translate::writer::Writer;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::node::{self, decode, encode};
use crate::paths::{backend, neutral};
use crate::types::{NetworkInstanceType, ProtocolKind};

// Routing protocols of network instances.
#[derive(Debug, Default)]
pub struct ProtocolUnit;

// Neutral BGP global configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BgpGlobalConfig {
    #[serde(rename = "as")]
    pub asn: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
}

// Neutral BGP neighbor configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BgpNeighborConfig {
    pub neighbor_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_as: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

// Neutral OSPF global configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OspfGlobalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
}

// Backend BGP context: the BGP instance itself or one of its VRFs.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
struct BgpContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    create: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    router_id: Option<String>,
}

// Backend BGP neighbor.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
struct BgpNeighbor {
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_as: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shutdown: Option<bool>,
}

// Backend OSPF process.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
struct OspfProcess {
    #[serde(skip_serializing_if = "Option::is_none")]
    router_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vrf: Option<String>,
}

#[derive(Debug, new)]
pub struct BgpProtocolLister {
    access: Access,
}

#[derive(Debug, new)]
pub struct OspfProtocolLister {
    access: Access,
}

#[derive(Debug, Default)]
pub struct ProtocolConfigReader;

#[derive(Debug, new)]
pub struct BgpGlobalConfigReader {
    access: Access,
}

#[derive(Debug, new)]
pub struct BgpGlobalConfigWriter {
    access: Access,
}

#[derive(Debug, new)]
pub struct BgpNeighborListReader {
    access: Access,
}

#[derive(Debug, new)]
pub struct BgpNeighborConfigReader {
    access: Access,
}

// Writes BGP neighbors into the BGP context of their network instance.
//
// The AS number is part of the backend path and is taken from the BGP
// global configuration of the same transaction.
#[derive(Debug, new)]
pub struct BgpNeighborConfigWriter {
    access: Access,
}

#[derive(Debug, new)]
pub struct OspfGlobalConfigReader {
    access: Access,
}

#[derive(Debug, new)]
pub struct OspfGlobalConfigWriter {
    access: Access,
}

// ===== impl ProtocolUnit =====

impl TranslationUnit for ProtocolUnit {
    fn name(&self) -> &str {
        "protocols"
    }

    fn schemas(&self) -> Vec<&'static str> {
        vec!["openconfig-network-instance", "openconfig-bgp", "openconfig-ospfv2"]
    }

    fn underlay_schemas(&self) -> Vec<&'static str> {
        vec!["Cisco-IOS-XR-ipv4-bgp-cfg", "Cisco-IOS-XR-ipv4-ospf-cfg"]
    }

    fn provide_handlers(
        &self,
        builder: RegistryBuilder,
        access: &Access,
    ) -> RegistryBuilder {
        let protocols = CompositeListReader::default()
            .child(
                protocol_check(ProtocolKind::Bgp),
                BgpProtocolLister::new(access.clone()),
            )
            .child(
                protocol_check(ProtocolKind::Ospf),
                OspfProtocolLister::new(access.clone()),
            );

        builder
            .path(neutral::PROTOCOLS)
            .structural()
            .path(neutral::PROTOCOL)
            .list_reader(protocols)
            .noop()
            .path(neutral::PROTOCOL_CONFIG)
            .reader(ProtocolConfigReader)
            .noop()
            // BGP
            .path(neutral::BGP)
            .structural()
            .check(protocol_check(ProtocolKind::Bgp))
            .path(neutral::BGP_GLOBAL)
            .structural()
            .check(protocol_check(ProtocolKind::Bgp))
            .path(neutral::BGP_GLOBAL_CONFIG)
            .reader(BgpGlobalConfigReader::new(access.clone()))
            .writer(BgpGlobalConfigWriter::new(access.clone()))
            .check(protocol_check(ProtocolKind::Bgp))
            .after(&[neutral::NETWORK_INSTANCE_CONFIG])
            .path(neutral::BGP_NEIGHBORS)
            .structural()
            .check(protocol_check(ProtocolKind::Bgp))
            .path(neutral::BGP_NEIGHBOR)
            .list_reader(BgpNeighborListReader::new(access.clone()))
            .noop()
            .check(protocol_check(ProtocolKind::Bgp))
            .path(neutral::BGP_NEIGHBOR_CONFIG)
            .reader(BgpNeighborConfigReader::new(access.clone()))
            .writer(BgpNeighborConfigWriter::new(access.clone()))
            .check(protocol_check(ProtocolKind::Bgp))
            .after(&[neutral::BGP_GLOBAL_CONFIG])
            // OSPF
            .path(neutral::OSPF)
            .structural()
            .check(protocol_check(ProtocolKind::Ospf))
            .path(neutral::OSPF_GLOBAL)
            .structural()
            .check(protocol_check(ProtocolKind::Ospf))
            .path(neutral::OSPF_GLOBAL_CONFIG)
            .reader(OspfGlobalConfigReader::new(access.clone()))
            .writer(OspfGlobalConfigWriter::new(access.clone()))
            .check(protocol_check(ProtocolKind::Ospf))
            .after(&[neutral::NETWORK_INSTANCE_CONFIG])
    }
}

// ===== impl BgpGlobalConfig =====

impl BgpGlobalConfig {
    fn context(&self, vrf: Option<&str>) -> BgpContext {
        BgpContext {
            create: vrf.map(|_| true),
            router_id: self.router_id.clone(),
        }
    }
}

// ===== impl BgpNeighborConfig =====

impl BgpNeighborConfig {
    fn neighbor(&self) -> BgpNeighbor {
        BgpNeighbor {
            remote_as: self.peer_as,
            description: self.description.clone(),
            shutdown: (!self.enabled).then_some(true),
        }
    }
}

// ===== impl BgpProtocolLister =====

#[async_trait]
impl Reader for BgpProtocolLister {
    async fn read(
        &self,
        _path: &InstancePath,
        _ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        Ok(None)
    }
}

#[async_trait]
impl ListReader for BgpProtocolLister {
    // BGP runs in an instance when the backend BGP instance has a context
    // for it.
    async fn list_keys(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Vec<ListKey>> {
        let vrf = vrf_of(node::instance_name(path)?);
        let list = backend::bgp_instances();
        let instances = ctx.read_cached(&self.access, &list, DataStore::Config).await?;
        let configured = node::entries(instances).iter().any(|instance| match vrf {
            None => true,
            Some(vrf) => instance
                .pointer("/vrfs/vrf")
                .and_then(|vrfs| vrfs.as_array())
                .is_some_and(|vrfs| {
                    vrfs.iter().any(|entry| {
                        entry.get("vrf-name").and_then(|name| name.as_str())
                            == Some(vrf)
                    })
                }),
        });

        let keys = configured
            .then(|| protocol_key(ProtocolKind::Bgp, BGP_PROTOCOL_NAME))
            .into_iter()
            .collect();
        Ok(keys)
    }
}

// ===== impl OspfProtocolLister =====

#[async_trait]
impl Reader for OspfProtocolLister {
    async fn read(
        &self,
        _path: &InstancePath,
        _ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        Ok(None)
    }
}

#[async_trait]
impl ListReader for OspfProtocolLister {
    // OSPF processes bound to the instance. Processes without VRF belong to
    // the default instance.
    async fn list_keys(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Vec<ListKey>> {
        let vrf = vrf_of(node::instance_name(path)?);
        let list = backend::ospf_processes();
        let processes = ctx.read_cached(&self.access, &list, DataStore::Config).await?;
        let keys = node::entries(processes)
            .iter()
            .filter(|process| {
                process.get("vrf").and_then(|vrf| vrf.as_str()) == vrf
            })
            .filter_map(|process| process.get("name"))
            .filter_map(|name| name.as_str())
            .sorted()
            .map(|name| protocol_key(ProtocolKind::Ospf, name))
            .collect();
        Ok(keys)
    }
}

// ===== impl ProtocolConfigReader =====

#[async_trait]
impl Reader for ProtocolConfigReader {
    async fn read(
        &self,
        path: &InstancePath,
        _ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        let identifier = node::key_component(path, "protocol", ProtocolKind::KEY)?;
        let name = node::key_component(path, "protocol", "name")?;
        Ok(Some(json!({"identifier": identifier, "name": name})))
    }
}

// ===== impl BgpGlobalConfigReader =====

#[async_trait]
impl Reader for BgpGlobalConfigReader {
    async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        let vrf = vrf_of(node::instance_name(path)?);
        let Some(asn) = backend_as(&self.access, ctx).await? else {
            return Ok(None);
        };
        let backend_path = backend::bgp_context(asn, vrf);
        let Some(context) = ctx
            .read_cached(&self.access, &backend_path, DataStore::Config)
            .await?
        else {
            return Ok(None);
        };

        let context: BgpContext = decode(&backend_path, &context)?;
        let config = BgpGlobalConfig {
            asn,
            router_id: context.router_id,
        };
        encode(path, &config).map(Some)
    }
}

// ===== impl BgpGlobalConfigWriter =====

#[async_trait]
impl Writer for BgpGlobalConfigWriter {
    async fn write(
        &self,
        path: &InstancePath,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let vrf = vrf_of(node::instance_name(path)?);
        let config: BgpGlobalConfig = decode(path, after)?;

        let backend_path = backend::bgp_context(config.asn, vrf);
        let payload = encode(&backend_path, &config.context(vrf))?;
        self.access.safe_put(&backend_path, &payload).await
    }

    // A new AS number moves the context to another BGP instance.
    async fn update(
        &self,
        path: &InstancePath,
        before: &Node,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let vrf = vrf_of(node::instance_name(path)?);
        let old: BgpGlobalConfig = decode(path, before)?;
        let new: BgpGlobalConfig = decode(path, after)?;

        let path_before = backend::bgp_context(old.asn, vrf);
        let path_after = backend::bgp_context(new.asn, vrf);
        let payload_before = encode(&path_before, &old.context(vrf))?;
        let payload_after = encode(&path_after, &new.context(vrf))?;
        self.access
            .safe_merge(&path_before, &payload_before, &path_after, &payload_after)
            .await
    }

    async fn delete(
        &self,
        path: &InstancePath,
        before: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let vrf = vrf_of(node::instance_name(path)?);
        let config: BgpGlobalConfig = decode(path, before)?;

        let backend_path = backend::bgp_context(config.asn, vrf);
        let payload = encode(&backend_path, &config.context(vrf))?;
        self.access.safe_delete(&backend_path, &payload).await
    }
}

// ===== impl BgpNeighborListReader =====

#[async_trait]
impl Reader for BgpNeighborListReader {
    async fn read(
        &self,
        _path: &InstancePath,
        _ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        Ok(None)
    }
}

#[async_trait]
impl ListReader for BgpNeighborListReader {
    async fn list_keys(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Vec<ListKey>> {
        let vrf = vrf_of(node::instance_name(path)?);
        let Some(asn) = backend_as(&self.access, ctx).await? else {
            return Ok(vec![]);
        };
        let list = backend::bgp_neighbors(asn, vrf);
        let neighbors = ctx.read_cached(&self.access, &list, DataStore::Config).await?;
        let keys = node::entries(neighbors)
            .iter()
            .filter_map(|neighbor| neighbor.get("address"))
            .filter_map(|address| address.as_str())
            .map(|address| ListKey::new("neighbor-address", address))
            .collect();
        Ok(keys)
    }
}

// ===== impl BgpNeighborConfigReader =====

#[async_trait]
impl Reader for BgpNeighborConfigReader {
    async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        let vrf = vrf_of(node::instance_name(path)?);
        let address = node::key_component(path, "neighbor", "neighbor-address")?;
        let Some(asn) = backend_as(&self.access, ctx).await? else {
            return Ok(None);
        };
        let backend_path = backend::bgp_neighbor(asn, vrf, address);
        let Some(neighbor) = ctx
            .read_cached(&self.access, &backend_path, DataStore::Config)
            .await?
        else {
            return Ok(None);
        };

        let neighbor: BgpNeighbor = decode(&backend_path, &neighbor)?;
        let config = BgpNeighborConfig {
            neighbor_address: address.to_owned(),
            peer_as: neighbor.remote_as,
            description: neighbor.description,
            enabled: !neighbor.shutdown.unwrap_or(false),
        };
        encode(path, &config).map(Some)
    }
}

// ===== impl BgpNeighborConfigWriter =====

impl BgpNeighborConfigWriter {
    // Backend path and payload of a neighbor, given the snapshot holding
    // the matching BGP global configuration.
    fn backend_node(
        path: &InstancePath,
        data: &Node,
        snapshot: &DataTree,
    ) -> Result<(InstancePath, Node)> {
        let vrf = vrf_of(node::instance_name(path)?);
        let config: BgpNeighborConfig = decode(path, data)?;
        let asn = snapshot_as(path, snapshot)?;

        let backend_path = backend::bgp_neighbor(asn, vrf, &config.neighbor_address);
        let payload = encode(&backend_path, &config.neighbor())?;
        Ok((backend_path, payload))
    }
}

#[async_trait]
impl Writer for BgpNeighborConfigWriter {
    async fn write(
        &self,
        path: &InstancePath,
        after: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let (backend_path, payload) = Self::backend_node(path, after, ctx.after())?;
        self.access.safe_put(&backend_path, &payload).await
    }

    async fn update(
        &self,
        path: &InstancePath,
        before: &Node,
        after: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let (path_before, payload_before) =
            Self::backend_node(path, before, ctx.before())?;
        let (path_after, payload_after) =
            Self::backend_node(path, after, ctx.after())?;
        self.access
            .safe_merge(&path_before, &payload_before, &path_after, &payload_after)
            .await
    }

    // Removes the neighbor from the same BGP context it was written to.
    async fn delete(
        &self,
        path: &InstancePath,
        before: &Node,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let (backend_path, payload) =
            Self::backend_node(path, before, ctx.before())?;
        self.access.safe_delete(&backend_path, &payload).await
    }
}

// ===== impl OspfGlobalConfigReader =====

#[async_trait]
impl Reader for OspfGlobalConfigReader {
    async fn read(
        &self,
        path: &InstancePath,
        ctx: &mut ReadContext,
    ) -> Result<Option<Node>> {
        let name = node::key_component(path, "protocol", "name")?;
        let backend_path = backend::ospf_process(name);
        let Some(process) = ctx
            .read_cached(&self.access, &backend_path, DataStore::Config)
            .await?
        else {
            return Ok(None);
        };

        let process: OspfProcess = decode(&backend_path, &process)?;
        let config = OspfGlobalConfig {
            router_id: process.router_id,
        };
        encode(path, &config).map(Some)
    }
}

// ===== impl OspfGlobalConfigWriter =====

impl OspfGlobalConfigWriter {
    fn backend_node(path: &InstancePath, data: &Node) -> Result<(InstancePath, Node)> {
        let vrf = vrf_of(node::instance_name(path)?);
        let name = node::key_component(path, "protocol", "name")?;
        let config: OspfGlobalConfig = decode(path, data)?;

        let backend_path = backend::ospf_process(name);
        let process = OspfProcess {
            router_id: config.router_id,
            vrf: vrf.map(str::to_owned),
        };
        let payload = encode(&backend_path, &process)?;
        Ok((backend_path, payload))
    }
}

#[async_trait]
impl Writer for OspfGlobalConfigWriter {
    async fn write(
        &self,
        path: &InstancePath,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let (backend_path, payload) = Self::backend_node(path, after)?;
        self.access.safe_put(&backend_path, &payload).await
    }

    async fn update(
        &self,
        path: &InstancePath,
        before: &Node,
        after: &Node,
        _ctx: &WriteContext<'_>,
    ) -> Result<()> {
        let (backend_path, payload_before) = Self::backend_node(path, before)?;
        let (_, payload_after) = Self::backend_node(path, after)?;
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
        let (backend_path, payload) = Self::backend_node(path, before)?;
        self.access.safe_delete(&backend_path, &payload).await
    }
}

// ===== global functions =====

// Neutral name of the BGP protocol entry of every network instance.
pub const BGP_PROTOCOL_NAME: &str = "default";

pub fn protocol_key(kind: ProtocolKind, name: &str) -> ListKey {
    ListKey::composite([(ProtocolKind::KEY, kind.as_str()), ("name", name)])
}

// ===== helper functions =====

fn protocol_check(kind: ProtocolKind) -> DiscriminatorCheck {
    DiscriminatorCheck::key("protocol", ProtocolKind::KEY, [kind.as_str()])
}

// Backend VRF of a network instance.
fn vrf_of(instance: &str) -> Option<&str> {
    (instance != NetworkInstanceType::DEFAULT_NAME).then_some(instance)
}

// AS number of the configured BGP instance, if any.
async fn backend_as(access: &Access, ctx: &mut ReadContext) -> Result<Option<u32>> {
    let list = backend::bgp_instances();
    let instances = ctx.read_cached(access, &list, DataStore::Config).await?;
    let asn = node::entries(instances)
        .iter()
        .filter_map(|instance| instance.get("as"))
        .filter_map(|asn| match asn {
            Node::String(asn) => asn.parse().ok(),
            asn => asn.as_u64().and_then(|asn| u32::try_from(asn).ok()),
        })
        .next();
    Ok(asn)
}

// AS number of the BGP global configuration of the protocol a path belongs
// to, as found in the given snapshot.
fn snapshot_as(path: &InstancePath, snapshot: &DataTree) -> Result<u32> {
    let global = path.ancestor("protocol").map(|protocol| {
        protocol.child("bgp").child("global").child("config")
    });
    let config = global.as_ref().and_then(|global| snapshot.get(global));
    match (global, config) {
        (Some(global), Some(config)) => {
            let config: BgpGlobalConfig = decode(&global, config)?;
            Ok(config.asn)
        }
        _ => Err(Error::InvariantViolation(
            path.clone(),
            "BGP global AS number is not configured".to_owned(),
        )),
    }
}

fn enabled_default() -> bool {
    true
}
