//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::str::FromStr;

use serde::{Deserialize, Serialize};

// Discriminator of a network instance.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum NetworkInstanceType {
    #[serde(rename = "DEFAULT_INSTANCE")]
    Default,
    #[serde(rename = "L3VRF")]
    L3Vrf,
    #[serde(rename = "L2P2P")]
    L2P2P,
    #[serde(rename = "L2VSI")]
    L2Vsi,
}

// Discriminator of a routing protocol, found in the `identifier` key
// component.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum ProtocolKind {
    #[serde(rename = "BGP")]
    Bgp,
    #[serde(rename = "OSPF")]
    Ospf,
}

// Interface type, implied by the interface name.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum InterfaceType {
    #[serde(rename = "iana-if-type:ethernetCsmacd")]
    Ethernet,
    #[serde(rename = "iana-if-type:ieee8023adLag")]
    Lag,
    #[serde(rename = "iana-if-type:softwareLoopback")]
    Loopback,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownValue(pub String);

// ===== impl NetworkInstanceType =====

impl NetworkInstanceType {
    pub const FIELD: &'static str = "type";
    pub const DEFAULT_NAME: &'static str = "default";

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkInstanceType::Default => "DEFAULT_INSTANCE",
            NetworkInstanceType::L3Vrf => "L3VRF",
            NetworkInstanceType::L2P2P => "L2P2P",
            NetworkInstanceType::L2Vsi => "L2VSI",
        }
    }

    pub fn is_l2(&self) -> bool {
        matches!(self, NetworkInstanceType::L2P2P | NetworkInstanceType::L2Vsi)
    }
}

impl std::fmt::Display for NetworkInstanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NetworkInstanceType {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEFAULT_INSTANCE" => Ok(NetworkInstanceType::Default),
            "L3VRF" => Ok(NetworkInstanceType::L3Vrf),
            "L2P2P" => Ok(NetworkInstanceType::L2P2P),
            "L2VSI" => Ok(NetworkInstanceType::L2Vsi),
            _ => Err(UnknownValue(s.to_owned())),
        }
    }
}

// ===== impl ProtocolKind =====

impl ProtocolKind {
    pub const KEY: &'static str = "identifier";

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolKind::Bgp => "BGP",
            ProtocolKind::Ospf => "OSPF",
        }
    }
}

impl std::fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProtocolKind {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BGP" => Ok(ProtocolKind::Bgp),
            "OSPF" => Ok(ProtocolKind::Ospf),
            _ => Err(UnknownValue(s.to_owned())),
        }
    }
}

// ===== impl InterfaceType =====

impl InterfaceType {
    // Derives the interface type from the interface name.
    pub fn from_name(name: &str) -> Option<InterfaceType> {
        const PREFIXES: [(&str, InterfaceType); 7] = [
            ("Bundle-Ether", InterfaceType::Lag),
            ("GigabitEthernet", InterfaceType::Ethernet),
            ("TenGigE", InterfaceType::Ethernet),
            ("FortyGigE", InterfaceType::Ethernet),
            ("HundredGigE", InterfaceType::Ethernet),
            ("MgmtEth", InterfaceType::Ethernet),
            ("Loopback", InterfaceType::Loopback),
        ];

        PREFIXES
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix))
            .map(|(_, ifc_type)| *ifc_type)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceType::Ethernet => "iana-if-type:ethernetCsmacd",
            InterfaceType::Lag => "iana-if-type:ieee8023adLag",
            InterfaceType::Loopback => "iana-if-type:softwareLoopback",
        }
    }
}

impl std::fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ===== impl UnknownValue =====

impl std::fmt::Display for UnknownValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown value: {}", self.0)
    }
}

impl std::error::Error for UnknownValue {}

// ===== unit tests =====
