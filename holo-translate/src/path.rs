//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

// Key of a list entry.
//
// Keys are ordered lists of named components. Lists whose entries vary by
// kind (e.g. routing protocols) use composite keys where one component acts
// as the discriminator.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ListKey(Vec<(String, String)>);

// Single step of an instance path.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PathStep {
    pub node: String,
    pub key: Option<ListKey>,
}

// Immutable route to a node in either the neutral tree or a backend tree.
//
// String form: `/a/b[name='x']/c`. Paths are totally ordered so that a
// parent always sorts before its descendants, and the descendants of a
// given path are contiguous.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(DeserializeFromStr, SerializeDisplay)]
pub struct InstancePath(Vec<PathStep>);

// Instance path parsing errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathError {
    MissingLeadingSlash(String),
    EmptyStep(String),
    MalformedKey(String),
    UnterminatedValue(String),
}

// ===== impl ListKey =====

impl ListKey {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> ListKey {
        ListKey(vec![(name.into(), value.into())])
    }

    pub fn composite<I, N, V>(components: I) -> ListKey
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        ListKey(
            components
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(component, _)| component == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn components(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn values(&self) -> Vec<&str> {
        self.0.iter().map(|(_, value)| value.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ListKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, value) in &self.0 {
            write!(f, "[{name}='{value}']")?;
        }
        Ok(())
    }
}

// ===== impl PathStep =====

impl PathStep {
    pub fn new(node: impl Into<String>) -> PathStep {
        PathStep {
            node: node.into(),
            key: None,
        }
    }

    pub fn keyed(node: impl Into<String>, key: ListKey) -> PathStep {
        PathStep {
            node: node.into(),
            key: Some(key),
        }
    }

    // A step without a key matches every entry of the same list.
    fn matches(&self, other: &PathStep) -> bool {
        self.node == other.node
            && (self.key.is_none() || self.key == other.key)
    }
}

impl std::fmt::Display for PathStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.node)?;
        if let Some(key) = &self.key {
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

// ===== impl InstancePath =====

impl InstancePath {
    pub fn root() -> InstancePath {
        InstancePath(vec![])
    }

    pub fn parse(path: &str) -> Result<InstancePath, PathError> {
        path.parse()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&PathStep> {
        self.0.last()
    }

    // Key of the last step, if any.
    pub fn key(&self) -> Option<&ListKey> {
        self.0.last().and_then(|step| step.key.as_ref())
    }

    #[must_use]
    pub fn child(&self, node: impl Into<String>) -> InstancePath {
        let mut steps = self.0.clone();
        steps.push(PathStep::new(node));
        InstancePath(steps)
    }

    #[must_use]
    pub fn child_keyed(
        &self,
        node: impl Into<String>,
        key: ListKey,
    ) -> InstancePath {
        let mut steps = self.0.clone();
        steps.push(PathStep::keyed(node, key));
        InstancePath(steps)
    }

    // Returns a copy of this path with the key of its last step replaced.
    #[must_use]
    pub fn with_key(&self, key: ListKey) -> InstancePath {
        let mut steps = self.0.clone();
        if let Some(last) = steps.last_mut() {
            last.key = Some(key);
        }
        InstancePath(steps)
    }

    pub fn parent(&self) -> Option<InstancePath> {
        if self.0.is_empty() {
            return None;
        }
        Some(InstancePath(self.0[..self.0.len() - 1].to_vec()))
    }

    #[must_use]
    pub fn truncate(&self, len: usize) -> InstancePath {
        InstancePath(self.0.iter().take(len).cloned().collect())
    }

    // Schema form of this path (all keys removed).
    #[must_use]
    pub fn wildcard(&self) -> InstancePath {
        InstancePath(
            self.0
                .iter()
                .map(|step| PathStep::new(step.node.clone()))
                .collect(),
        )
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.iter().all(|step| step.key.is_none())
    }

    // Prefix check. Key-less steps of the prefix match any key.
    pub fn starts_with(&self, prefix: &InstancePath) -> bool {
        prefix.0.len() <= self.0.len()
            && prefix
                .0
                .iter()
                .zip(self.0.iter())
                .all(|(prefix, step)| prefix.matches(step))
    }

    // Strict descendant check. Keys must match exactly.
    pub fn descends_from(&self, ancestor: &InstancePath) -> bool {
        self.0.len() > ancestor.0.len()
            && self.0[..ancestor.0.len()] == ancestor.0[..]
    }

    // Key of the first step of the given node type.
    pub fn first_key_of(&self, node: &str) -> Option<&ListKey> {
        self.0
            .iter()
            .find(|step| step.node == node)
            .and_then(|step| step.key.as_ref())
    }

    // Nearest ancestor-or-self of the given node type.
    pub fn ancestor(&self, node: &str) -> Option<InstancePath> {
        self.0
            .iter()
            .rposition(|step| step.node == node)
            .map(|pos| self.truncate(pos + 1))
    }

    // Relativizes this path against one of its ancestors.
    pub fn cut(&self, ancestor: &InstancePath) -> Option<InstancePath> {
        self.starts_with(ancestor)
            .then(|| InstancePath(self.0[ancestor.0.len()..].to_vec()))
    }

    #[must_use]
    pub fn join(&self, relative: &InstancePath) -> InstancePath {
        let mut steps = self.0.clone();
        steps.extend(relative.0.iter().cloned());
        InstancePath(steps)
    }
}

impl std::fmt::Display for InstancePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for step in &self.0 {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

impl FromStr for InstancePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<InstancePath, PathError> {
        let Some(rest) = s.strip_prefix('/') else {
            return Err(PathError::MissingLeadingSlash(s.to_owned()));
        };
        if rest.is_empty() {
            return Ok(InstancePath::root());
        }

        let mut steps = vec![];
        let mut chars = rest.chars().peekable();
        loop {
            // Node name.
            let mut node = String::new();
            while let Some(&c) = chars.peek() {
                if c == '/' || c == '[' {
                    break;
                }
                node.push(c);
                chars.next();
            }
            if node.is_empty() {
                return Err(PathError::EmptyStep(s.to_owned()));
            }

            // Key components.
            let mut components = vec![];
            while chars.peek() == Some(&'[') {
                chars.next();
                let mut name = String::new();
                for c in chars.by_ref() {
                    if c == '=' {
                        break;
                    }
                    name.push(c);
                }
                let quote = match chars.next() {
                    Some(quote @ ('\'' | '"')) if !name.is_empty() => quote,
                    _ => return Err(PathError::MalformedKey(s.to_owned())),
                };
                let mut value = String::new();
                let mut terminated = false;
                for c in chars.by_ref() {
                    if c == quote {
                        terminated = true;
                        break;
                    }
                    value.push(c);
                }
                if !terminated {
                    return Err(PathError::UnterminatedValue(s.to_owned()));
                }
                if chars.next() != Some(']') {
                    return Err(PathError::MalformedKey(s.to_owned()));
                }
                components.push((name.trim().to_owned(), value));
            }

            let key = (!components.is_empty()).then_some(ListKey(components));
            steps.push(PathStep { node, key });

            match chars.next() {
                None => break,
                Some('/') => continue,
                Some(_) => return Err(PathError::MalformedKey(s.to_owned())),
            }
        }

        Ok(InstancePath(steps))
    }
}

// ===== impl PathError =====

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::MissingLeadingSlash(path) => {
                write!(f, "path must be absolute: {path}")
            }
            PathError::EmptyStep(path) => {
                write!(f, "path has an empty step: {path}")
            }
            PathError::MalformedKey(path) => {
                write!(f, "path has a malformed list key: {path}")
            }
            PathError::UnterminatedValue(path) => {
                write!(f, "path has an unterminated key value: {path}")
            }
        }
    }
}

impl std::error::Error for PathError {}

// ===== global functions =====

// Parses a constant path template.
//
// Panics on malformed input, so it must only be used with literals.
pub fn path(s: &str) -> InstancePath {
    match s.parse() {
        Ok(path) => path,
        Err(error) => panic!("invalid static path: {error}"),
    }
}

// ===== unit tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let p = InstancePath::parse(
            "/network-instances/network-instance[name='vrf1']/protocols/protocol[identifier='BGP'][name='default']",
        )
        .unwrap();
        assert_eq!(p.len(), 4);
        assert_eq!(
            p.first_key_of("protocol").unwrap().values(),
            vec!["BGP", "default"]
        );
        assert_eq!(p.to_string().parse::<InstancePath>().unwrap(), p);
    }

    #[test]
    fn parse_value_with_slashes() {
        let p = InstancePath::parse(
            "/interfaces/interface[name='GigabitEthernet0/0/0/1']/config",
        )
        .unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(
            p.first_key_of("interface").unwrap().get("name"),
            Some("GigabitEthernet0/0/0/1")
        );
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            InstancePath::parse("a/b"),
            Err(PathError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            InstancePath::parse("/a//b"),
            Err(PathError::EmptyStep(_))
        ));
        assert!(matches!(
            InstancePath::parse("/a[name='x"),
            Err(PathError::UnterminatedValue(_))
        ));
        assert!(matches!(
            InstancePath::parse("/a[name=x]"),
            Err(PathError::MalformedKey(_))
        ));
        assert_eq!(InstancePath::parse("/").unwrap(), InstancePath::root());
    }

    #[test]
    fn prefix_and_cut() {
        let base = path("/a/b[k='1']");
        let full = path("/a/b[k='1']/c/d");
        assert!(full.starts_with(&base));
        assert!(full.starts_with(&path("/a/b")));
        assert!(!full.starts_with(&path("/a/b[k='2']")));
        assert_eq!(full.cut(&base), Some(path("/c/d")));
        assert_eq!(full.cut(&path("/x")), None);
        assert_eq!(base.join(&path("/c/d")), full);
    }

    #[test]
    fn ancestor_lookup() {
        let p = path("/ni[name='a']/protocols/protocol[id='BGP']/config");
        assert_eq!(p.ancestor("protocols"), Some(path("/ni[name='a']/protocols")));
        assert_eq!(p.ancestor("missing"), None);
        assert_eq!(p.wildcard(), path("/ni/protocols/protocol/config"));
        assert_eq!(p.parent().unwrap().key().unwrap().get("id"), Some("BGP"));
    }

    #[test]
    fn ordering_groups_descendants() {
        let mut paths = [
            path("/a/c"),
            path("/a/b[k='2']"),
            path("/a/b[k='1']/x"),
            path("/a"),
            path("/a/b[k='1']"),
        ];
        paths.sort();
        assert_eq!(paths[0], path("/a"));
        assert_eq!(paths[1], path("/a/b[k='1']"));
        assert_eq!(paths[2], path("/a/b[k='1']/x"));
    }
}
