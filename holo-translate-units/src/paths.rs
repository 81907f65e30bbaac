//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

// Neutral schema paths handled by the reference units.
pub mod neutral {
    pub const INTERFACES: &str = "/interfaces";
    pub const INTERFACE: &str = "/interfaces/interface";
    pub const INTERFACE_CONFIG: &str = "/interfaces/interface/config";
    pub const INTERFACE_STATE: &str = "/interfaces/interface/state";

    pub const NETWORK_INSTANCES: &str = "/network-instances";
    pub const NETWORK_INSTANCE: &str = "/network-instances/network-instance";
    pub const NETWORK_INSTANCE_CONFIG: &str =
        "/network-instances/network-instance/config";
    pub const NI_INTERFACES: &str =
        "/network-instances/network-instance/interfaces";
    pub const NI_INTERFACE: &str =
        "/network-instances/network-instance/interfaces/interface";
    pub const NI_INTERFACE_CONFIG: &str =
        "/network-instances/network-instance/interfaces/interface/config";

    pub const PROTOCOLS: &str = "/network-instances/network-instance/protocols";
    pub const PROTOCOL: &str =
        "/network-instances/network-instance/protocols/protocol";
    pub const PROTOCOL_CONFIG: &str =
        "/network-instances/network-instance/protocols/protocol/config";
    pub const BGP: &str =
        "/network-instances/network-instance/protocols/protocol/bgp";
    pub const BGP_GLOBAL: &str =
        "/network-instances/network-instance/protocols/protocol/bgp/global";
    pub const BGP_GLOBAL_CONFIG: &str = "/network-instances/network-instance/protocols/protocol/bgp/global/config";
    pub const BGP_NEIGHBORS: &str =
        "/network-instances/network-instance/protocols/protocol/bgp/neighbors";
    pub const BGP_NEIGHBOR: &str = "/network-instances/network-instance/protocols/protocol/bgp/neighbors/neighbor";
    pub const BGP_NEIGHBOR_CONFIG: &str = "/network-instances/network-instance/protocols/protocol/bgp/neighbors/neighbor/config";
    pub const OSPF: &str =
        "/network-instances/network-instance/protocols/protocol/ospfv2";
    pub const OSPF_GLOBAL: &str =
        "/network-instances/network-instance/protocols/protocol/ospfv2/global";
    pub const OSPF_GLOBAL_CONFIG: &str = "/network-instances/network-instance/protocols/protocol/ospfv2/global/config";

    pub const COMPONENTS: &str = "/components";
    pub const COMPONENT: &str = "/components/component";
    pub const COMPONENT_STATE: &str = "/components/component/state";
}

// Backend (device) paths.
pub mod backend {
    use holo_translate::path::{InstancePath, ListKey};

    pub fn interface_configurations() -> InstancePath {
        InstancePath::root()
            .child("interface-configurations")
            .child("interface-configuration")
    }

    pub fn interface_configuration(name: &str) -> InstancePath {
        interface_configurations().with_key(ListKey::new("interface-name", name))
    }

    pub fn interface_properties(name: &str) -> InstancePath {
        InstancePath::root()
            .child("interface-properties")
            .child_keyed("interface", ListKey::new("interface-name", name))
    }

    pub fn vrfs() -> InstancePath {
        InstancePath::root().child("vrfs").child("vrf")
    }

    pub fn vrf(name: &str) -> InstancePath {
        vrfs().with_key(ListKey::new("vrf-name", name))
    }

    pub fn xconnects() -> InstancePath {
        InstancePath::root()
            .child("l2vpn")
            .child("xconnects")
            .child("xconnect")
    }

    pub fn xconnect(name: &str) -> InstancePath {
        xconnects().with_key(ListKey::new("name", name))
    }

    pub fn bridge_domains() -> InstancePath {
        InstancePath::root()
            .child("l2vpn")
            .child("bridge-domains")
            .child("bridge-domain")
    }

    pub fn bridge_domain(name: &str) -> InstancePath {
        bridge_domains().with_key(ListKey::new("name", name))
    }

    pub fn bgp_instances() -> InstancePath {
        InstancePath::root().child("bgp").child("instance")
    }

    pub fn bgp_instance(asn: u32) -> InstancePath {
        bgp_instances().with_key(ListKey::new("as", asn.to_string()))
    }

    // BGP context of a network instance. The default instance maps to the
    // BGP instance itself.
    pub fn bgp_context(asn: u32, vrf: Option<&str>) -> InstancePath {
        match vrf {
            Some(vrf) => bgp_instance(asn)
                .child("vrfs")
                .child_keyed("vrf", ListKey::new("vrf-name", vrf)),
            None => bgp_instance(asn),
        }
    }

    pub fn bgp_neighbors(asn: u32, vrf: Option<&str>) -> InstancePath {
        bgp_context(asn, vrf).child("neighbors").child("neighbor")
    }

    pub fn bgp_neighbor(asn: u32, vrf: Option<&str>, address: &str) -> InstancePath {
        bgp_neighbors(asn, vrf).with_key(ListKey::new("address", address))
    }

    pub fn ospf_processes() -> InstancePath {
        InstancePath::root().child("ospf").child("process")
    }

    pub fn ospf_process(name: &str) -> InstancePath {
        ospf_processes().with_key(ListKey::new("name", name))
    }

    pub fn inventory_cards() -> InstancePath {
        InstancePath::root().child("inventory").child("card")
    }
}
