//! Path addressing for documentation trees.
//!
//! A [`PathAddress`] is an ordered list of steps, each either a mapping key
//! or a zero-based sequence index. The same address value is used to query
//! the [`Navigator`](crate::navigator::Navigator), to report search hits and
//! to cite evidence inside persisted rubric files, so its JSON form is a
//! plain array: `["subpages", 2, "content", "Getting Started"]`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of a [`PathAddress`].
///
/// Integers stay integers and strings stay strings across a JSON round trip;
/// `"2"` and `2` are different steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathStep {
    /// Zero-based position in a sequence.
    Index(usize),
    /// Key in a mapping.
    Key(String),
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Index(index) => write!(f, "{}", index),
            PathStep::Key(key) => f.write_str(key),
        }
    }
}

impl From<usize> for PathStep {
    fn from(index: usize) -> Self {
        PathStep::Index(index)
    }
}

impl From<&str> for PathStep {
    fn from(key: &str) -> Self {
        PathStep::Key(key.to_string())
    }
}

impl From<String> for PathStep {
    fn from(key: String) -> Self {
        PathStep::Key(key)
    }
}

/// Address of a node in a documentation tree.
///
/// Immutable: extension returns a new address. Equality is plain step-wise
/// equality, no normalization is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathAddress(Vec<PathStep>);

impl PathAddress {
    /// Create an address from a sequence of steps.
    pub fn new(steps: impl IntoIterator<Item = impl Into<PathStep>>) -> Self {
        Self(steps.into_iter().map(Into::into).collect())
    }

    /// The empty address, pointing at the tree root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Steps of this address in order.
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return a new address with `step` appended.
    pub fn append(&self, step: impl Into<PathStep>) -> Self {
        let mut steps = self.0.clone();
        steps.push(step.into());
        Self(steps)
    }

    /// Return a new address with every step of `tail` appended.
    pub fn join(&self, tail: &PathAddress) -> Self {
        let mut steps = self.0.clone();
        steps.extend(tail.0.iter().cloned());
        Self(steps)
    }

    /// Address of the enclosing node, `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// The first `len` steps of this address.
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Whether `other` is a prefix of this address.
    pub fn starts_with(&self, other: &PathAddress) -> bool {
        self.0.starts_with(&other.0)
    }

    /// Compact JSON array form, used for tool arguments and citations.
    pub fn to_json(&self) -> String {
        // A Vec of strings and integers always serializes.
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    /// Parse the JSON array form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Human-readable `a -> b -> c` rendering for messages.
    pub fn display_arrows(&self) -> String {
        self.0
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl fmt::Display for PathAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl FromStr for PathAddress {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(s)
    }
}

impl From<Vec<PathStep>> for PathAddress {
    fn from(steps: Vec<PathStep>) -> Self {
        Self(steps)
    }
}

impl FromIterator<PathStep> for PathAddress {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build a [`PathAddress`] from mixed key/index literals.
///
/// ```
/// use doc_tree_index::path;
/// let p = path!["subpages", 0, "content"];
/// assert_eq!(p.to_json(), r#"["subpages",0,"content"]"#);
/// ```
#[macro_export]
macro_rules! path {
    () => { $crate::path::PathAddress::root() };
    ($($step:expr),+ $(,)?) => {
        $crate::path::PathAddress::from(vec![$($crate::path::PathStep::from($step)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_keeps_step_types() {
        let address = PathAddress::new(vec![
            PathStep::from("subpages"),
            PathStep::from(2),
            PathStep::from("2"),
        ]);
        let json = address.to_json();
        assert_eq!(json, r#"["subpages",2,"2"]"#);

        let parsed: PathAddress = json.parse().unwrap();
        assert_eq!(parsed, address);
        assert_eq!(parsed.steps()[1], PathStep::Index(2));
        assert_eq!(parsed.steps()[2], PathStep::Key("2".to_string()));
    }

    #[test]
    fn test_append_does_not_mutate() {
        let base = PathAddress::new(["subpages"]);
        let extended = base.append(0usize);

        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);
        assert!(extended.starts_with(&base));
        assert_eq!(extended.parent(), Some(base));
    }

    #[test]
    fn test_rejects_negative_and_nested() {
        assert!(PathAddress::from_json("[-1]").is_err());
        assert!(PathAddress::from_json(r#"[["a"]]"#).is_err());
        assert!(PathAddress::from_json(r#"{"a": 1}"#).is_err());
    }

    #[test]
    fn test_root_and_macro() {
        assert!(PathAddress::root().is_empty());
        assert_eq!(PathAddress::root().to_json(), "[]");
        assert_eq!(path!["content", "Intro", 3].display_arrows(), "content -> Intro -> 3");
        assert_eq!(path![], PathAddress::root());
    }

    #[test]
    fn test_join_and_prefix() {
        let a = path!["subpages", 1];
        let b = path!["content", "Usage"];
        let joined = a.join(&b);
        assert_eq!(joined, path!["subpages", 1, "content", "Usage"]);
        assert_eq!(joined.prefix(2), a);
        assert_eq!(joined.prefix(10), joined);
    }
}
