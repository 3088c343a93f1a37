//! Dotted section indices such as `2.1.3`.

use crate::error::DocTreeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A dotted sequence of positive integers.
///
/// The length is the nesting depth and each component is the 1-based
/// position among siblings. Ordering is lexicographic over components, so
/// `2 < 2.1 < 2.2 < 10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionIndex(Vec<u32>);

impl SectionIndex {
    /// Build an index from components. Returns `None` if empty or if any
    /// component is zero.
    pub fn new(components: Vec<u32>) -> Option<Self> {
        if components.is_empty() || components.contains(&0) {
            None
        } else {
            Some(Self(components))
        }
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Nesting depth (1 for top-level sections).
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Index of the `position`-th child (1-based) of this section.
    pub fn child(&self, position: u32) -> Self {
        let mut components = self.0.clone();
        components.push(position);
        Self(components)
    }
}

impl fmt::Display for SectionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

impl FromStr for SectionIndex {
    type Err = DocTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DocTreeError::InvalidSectionIndex(s.to_string());
        let components = s
            .trim()
            .trim_end_matches('.')
            .split('.')
            .map(|part| part.trim().parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(components).ok_or_else(invalid)
    }
}

impl Serialize for SectionIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SectionIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let index: SectionIndex = "2.1.3".parse().unwrap();
        assert_eq!(index.components(), &[2, 1, 3]);
        assert_eq!(index.depth(), 3);
        assert_eq!(index.to_string(), "2.1.3");

        // Trailing dot as in "2. Setup"
        let index: SectionIndex = "2.".parse().unwrap();
        assert_eq!(index.components(), &[2]);
    }

    #[test]
    fn test_rejects_invalid() {
        assert!("".parse::<SectionIndex>().is_err());
        assert!("0".parse::<SectionIndex>().is_err());
        assert!("1.0".parse::<SectionIndex>().is_err());
        assert!("a.b".parse::<SectionIndex>().is_err());
        assert!("1..2".parse::<SectionIndex>().is_err());
        assert!("-1".parse::<SectionIndex>().is_err());
    }

    #[test]
    fn test_ordering_is_numeric() {
        let mut indices: Vec<SectionIndex> = ["10", "2.2", "2", "2.1", "1"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        indices.sort();
        let rendered: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
        assert_eq!(rendered, vec!["1", "2", "2.1", "2.2", "10"]);
    }

    #[test]
    fn test_child() {
        let parent: SectionIndex = "3".parse().unwrap();
        assert_eq!(parent.child(4).to_string(), "3.4");
    }
}
