//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use serde_json::{Map, Value};

use crate::tree::Node;

// Folds a new node over existing backend data.
//
// Fields present only in `existing` are carried forward. Nested objects are
// folded recursively; any other value in `new` replaces the existing one.
pub fn fold_forward(existing: &Node, new: &Node) -> Node {
    match (existing, new) {
        (Value::Object(existing), Value::Object(new)) => {
            let mut result = existing.clone();
            for (field, value) in new {
                let folded = match result.get(field) {
                    Some(old @ Value::Object(_)) if value.is_object() => {
                        fold_forward(old, value)
                    }
                    _ => value.clone(),
                };
                result.insert(field.clone(), folded);
            }
            Value::Object(result)
        }
        (_, new) => new.clone(),
    }
}

// Removes from `current` the fields attributable to `owned`.
//
// A field is attributable when its current value equals the owned one. Other
// fields, including those whose value was since changed by another owner, are
// kept. Returns `None` when nothing remains.
pub fn subtract(current: &Node, owned: &Node) -> Option<Node> {
    match (current, owned) {
        (Value::Object(current), Value::Object(owned)) => {
            let mut result = Map::new();
            for (field, value) in current {
                match owned.get(field) {
                    None => {
                        result.insert(field.clone(), value.clone());
                    }
                    Some(owned) => {
                        if let Some(rest) = subtract(value, owned) {
                            result.insert(field.clone(), rest);
                        }
                    }
                }
            }
            (!result.is_empty()).then_some(Value::Object(result))
        }
        (Value::Array(current), Value::Array(owned)) => {
            let rest = current
                .iter()
                .filter(|entry| !owned.contains(entry))
                .cloned()
                .collect::<Vec<_>>();
            (!rest.is_empty()).then_some(Value::Array(rest))
        }
        (current, owned) if current == owned => None,
        (current, _) => Some(current.clone()),
    }
}

// Fields of `before` that are absent from `after`.
pub fn removed_fields(before: &Node, after: &Node) -> Option<Node> {
    match (before, after) {
        (Value::Object(before), Value::Object(after)) => {
            let mut removed = Map::new();
            for (field, value) in before {
                match after.get(field) {
                    None => {
                        removed.insert(field.clone(), value.clone());
                    }
                    Some(new) => {
                        if let Some(rest) = removed_fields(value, new) {
                            removed.insert(field.clone(), rest);
                        }
                    }
                }
            }
            (!removed.is_empty()).then_some(Value::Object(removed))
        }
        _ => None,
    }
}

// Copies into `acc` every field of `other` it does not have yet.
pub fn fill_missing(acc: &mut Node, other: &Node) {
    if acc.is_null() {
        *acc = other.clone();
        return;
    }
    let (Some(acc), Some(other)) = (acc.as_object_mut(), other.as_object())
    else {
        return;
    };
    for (field, value) in other {
        match acc.get_mut(field) {
            Some(existing) => fill_missing(existing, value),
            None => {
                acc.insert(field.clone(), value.clone());
            }
        }
    }
}

// ===== unit tests =====

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fold_keeps_backend_only_fields() {
        let existing = json!({"mtu": 1500, "ipv4": {"addr": "10.0.0.1", "mask": 24}});
        let new = json!({"description": "x", "ipv4": {"addr": "10.0.0.2"}});
        assert_eq!(
            fold_forward(&existing, &new),
            json!({
                "mtu": 1500,
                "description": "x",
                "ipv4": {"addr": "10.0.0.2", "mask": 24},
            })
        );
    }

    #[test]
    fn subtract_only_owned_values() {
        let current = json!({"vrf": "a", "mtu": 9000, "shutdown": true});
        let owned = json!({"vrf": "a", "mtu": 1500});
        assert_eq!(
            subtract(&current, &owned),
            Some(json!({"mtu": 9000, "shutdown": true}))
        );
        assert_eq!(subtract(&json!({"vrf": "a"}), &json!({"vrf": "a"})), None);
    }

    #[test]
    fn removed_nested_fields() {
        let before = json!({"a": 1, "b": {"c": 2, "d": 3}});
        let after = json!({"a": 2, "b": {"d": 3}});
        assert_eq!(removed_fields(&before, &after), Some(json!({"b": {"c": 2}})));
        assert_eq!(removed_fields(&after, &after), None);
    }

    #[test]
    fn first_value_wins() {
        let mut acc = json!({"name": "a", "nested": {"x": 1}});
        fill_missing(&mut acc, &json!({"name": "b", "type": "L3VRF", "nested": {"x": 2, "y": 3}}));
        assert_eq!(
            acc,
            json!({"name": "a", "type": "L3VRF", "nested": {"x": 1, "y": 3}})
        );
    }
}
