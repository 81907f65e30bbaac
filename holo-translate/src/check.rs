//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use crate::error::RegistryError;
use crate::path::InstancePath;

// Source of discriminator values seen by check gates.
pub trait CheckContext {
    // Value of a discriminator field of the node at `holder`, if known.
    fn discriminator(&self, holder: &InstancePath, field: &str)
    -> Option<String>;
}

// Applicability predicate evaluated before a handler is tried.
//
// Gates are pure: they may consult the context but must not alter it.
pub trait Check: Send + Sync + std::fmt::Debug {
    fn applicable(&self, path: &InstancePath, ctx: &dyn CheckContext) -> bool;

    // Discriminator values this gate claims, used to detect overlapping
    // sibling gates at registration time.
    fn claims(&self) -> Option<(&DiscriminatorSource, &[String])> {
        None
    }

    // Whether this gate accepts every path regardless of discriminators.
    fn unconditional(&self) -> bool {
        false
    }
}

// Gate of a handler that is the sole owner of its path.
//
// Siblings gated by `AlwaysCheck` partition their path by data instead of
// by discriminator (e.g. one lister per backend container), so they may be
// combined with each other but never with discriminator gates.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysCheck;

// Where a discriminator value is found.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DiscriminatorSource {
    // Component of the key of the nearest list entry of type `node`.
    Key { node: String, component: String },
    // Field of the node found at `relative` below the nearest `node`.
    Field {
        node: String,
        relative: InstancePath,
        field: String,
    },
}

// Gate applicable iff a discriminator equals one of the registered values.
#[derive(Clone, Debug)]
pub struct DiscriminatorCheck {
    source: DiscriminatorSource,
    values: Vec<String>,
}

// ===== impl AlwaysCheck =====

impl Check for AlwaysCheck {
    fn applicable(&self, _path: &InstancePath, _ctx: &dyn CheckContext) -> bool {
        true
    }

    fn unconditional(&self) -> bool {
        true
    }
}

// ===== impl DiscriminatorCheck =====

impl DiscriminatorCheck {
    pub fn key<I, V>(node: &str, component: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        DiscriminatorCheck {
            source: DiscriminatorSource::Key {
                node: node.to_owned(),
                component: component.to_owned(),
            },
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn field<I, V>(
        node: &str,
        relative: InstancePath,
        field: &str,
        values: I,
    ) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        DiscriminatorCheck {
            source: DiscriminatorSource::Field {
                node: node.to_owned(),
                relative,
                field: field.to_owned(),
            },
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn source(&self) -> &DiscriminatorSource {
        &self.source
    }

    fn accepts(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

impl Check for DiscriminatorCheck {
    fn applicable(&self, path: &InstancePath, ctx: &dyn CheckContext) -> bool {
        match &self.source {
            DiscriminatorSource::Key { node, component } => {
                let step = path.steps().iter().rev().find(|s| s.node == *node);
                match step.and_then(|step| step.key.as_ref()) {
                    Some(key) => key
                        .get(component)
                        .is_some_and(|value| self.accepts(value)),
                    // Undetermined at list level. The gate is evaluated
                    // again for every entry.
                    None => true,
                }
            }
            DiscriminatorSource::Field {
                node,
                relative,
                field,
            } => {
                let Some(holder) = path.ancestor(node) else {
                    return false;
                };
                ctx.discriminator(&holder.join(relative), field)
                    .is_some_and(|value| self.accepts(&value))
            }
        }
    }

    fn claims(&self) -> Option<(&DiscriminatorSource, &[String])> {
        Some((&self.source, &self.values))
    }
}

// ===== global functions =====

// Ensures no two sibling gates claim the same discriminator value, and that
// unconditional gates are not mixed with discriminator gates.
pub fn validate_exclusive<'a, I>(
    path: &InstancePath,
    checks: I,
) -> Result<(), RegistryError>
where
    I: IntoIterator<Item = &'a dyn Check>,
{
    let checks = checks.into_iter().collect::<Vec<_>>();
    let claims = checks
        .iter()
        .filter_map(|check| check.claims())
        .collect::<Vec<_>>();
    if !claims.is_empty() && checks.iter().any(|check| check.unconditional()) {
        return Err(RegistryError::UngatedSibling(path.clone()));
    }
    for (i, (source, values)) in claims.iter().enumerate() {
        for (other_source, other_values) in &claims[i + 1..] {
            if source != other_source {
                continue;
            }
            if let Some(value) = values.iter().find(|v| other_values.contains(v))
            {
                return Err(RegistryError::OverlappingChecks(
                    path.clone(),
                    value.clone(),
                ));
            }
        }
    }
    Ok(())
}

// ===== unit tests =====
