//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(clippy::derivable_impls)]

use serde::{Deserialize, Serialize};

// Translation engine configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub access: AccessConfig,
    pub registry: RegistryConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    // Total number of attempts for reads failing with transient errors.
    pub read_attempts: usize,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub unhandled: UnhandledPolicy,
    pub structural_writes: StructuralPolicy,
}

// What a composite writer does when none of its children handled an
// operation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnhandledPolicy {
    #[default]
    Ignore,
    Reject,
}

// What the transaction does with changes to structural nodes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StructuralPolicy {
    #[default]
    Ignore,
    Reject,
}

// ===== impl AccessConfig =====

impl AccessConfig {
    pub const DFLT_READ_ATTEMPTS: usize = 3;
}

impl Default for AccessConfig {
    fn default() -> AccessConfig {
        AccessConfig {
            read_attempts: AccessConfig::DFLT_READ_ATTEMPTS,
        }
    }
}

// ===== impl RegistryConfig =====

impl Default for RegistryConfig {
    fn default() -> RegistryConfig {
        RegistryConfig {
            unhandled: Default::default(),
            structural_writes: Default::default(),
        }
    }
}
