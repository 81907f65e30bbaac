//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use holo_translate::path::InstancePath;
use tracing::{debug, debug_span, trace};

use crate::types::NetworkInstanceType;

// Reference unit debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    // Network instances
    InstanceTypeResolved(&'a InstancePath, NetworkInstanceType),
    InstanceKindSwitch(&'a str, NetworkInstanceType, NetworkInstanceType),
    // VRF interface binding
    InterfaceBind(&'a str, &'a str),
    InterfaceUnbind(&'a str, &'a str),
    DefaultInstanceSkipped(&'a InstancePath),
    NonVrfInstanceSkipped(&'a InstancePath),
    // Platform
    ComponentRead(&'a str),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::InstanceTypeResolved(path, kind) => {
                trace!(%path, %kind, "{}", self);
            }
            Debug::InstanceKindSwitch(name, before, after) => {
                debug_span!("network-instance", %name).in_scope(|| {
                    debug!(%before, %after, "{}", self);
                })
            }
            Debug::InterfaceBind(interface, vrf)
            | Debug::InterfaceUnbind(interface, vrf) => {
                debug_span!("network-instance", name = %vrf).in_scope(|| {
                    debug!(%interface, "{}", self);
                })
            }
            Debug::DefaultInstanceSkipped(path)
            | Debug::NonVrfInstanceSkipped(path) => {
                trace!(%path, "{}", self);
            }
            Debug::ComponentRead(name) => {
                debug_span!("platform").in_scope(|| {
                    trace!(%name, "{}", self);
                })
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::InstanceTypeResolved(..) => {
                write!(f, "network instance type resolved")
            }
            Debug::InstanceKindSwitch(..) => {
                write!(f, "moving network instance between L2 kinds")
            }
            Debug::InterfaceBind(..) => {
                write!(f, "binding interface to network instance")
            }
            Debug::InterfaceUnbind(..) => {
                write!(f, "unbinding interface from network instance")
            }
            Debug::DefaultInstanceSkipped(..) => {
                write!(f, "default instance needs no backend change")
            }
            Debug::NonVrfInstanceSkipped(..) => {
                write!(f, "interfaces are only bound to L3 VRF instances")
            }
            Debug::ComponentRead(..) => {
                write!(f, "reading platform component")
            }
        }
    }
}
