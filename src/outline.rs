//! Outline files and index assignment.
//!
//! An outline is a nested title hierarchy, usually `module_tree.json`:
//!
//! ```json
//! {
//!   "core": {"children": {"parser": {"children": {}}, "runtime": {}}},
//!   "cli": {}
//! }
//! ```
//!
//! Entries are numbered in pre-order, children `1..N` within their parent,
//! which gives `core = 1`, `parser = 1.1`, `runtime = 1.2`, `cli = 2`.

use crate::error::{DocTreeError, Result};
use crate::section::SectionIndex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Default outline file name inside a section directory.
pub const DEFAULT_OUTLINE_FILENAME: &str = "module_tree.json";

/// One outline entry and its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub name: String,
    pub children: Vec<OutlineEntry>,
}

impl OutlineEntry {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.name == name || self.children.iter().any(|c| c.contains(name))
    }
}

/// A nested title hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub entries: Vec<OutlineEntry>,
}

impl Outline {
    pub fn new(entries: Vec<OutlineEntry>) -> Self {
        Self { entries }
    }

    /// Load an outline from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DocTreeError::io(path, e))?;
        let value: Value = serde_json::from_str(&content).map_err(|e| {
            DocTreeError::Outline(format!("{} is not valid JSON: {}", path.display(), e))
        })?;
        Self::from_value(&value)
    }

    /// Parse the `{name: {"children": {...}}}` form.
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self {
            entries: parse_entries(value)?,
        })
    }

    /// Move (or insert) the given names to the front of the top level, in order.
    pub fn with_prelude<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        for name in names.iter().rev() {
            let name = name.as_ref();
            let entry = match self.entries.iter().position(|e| e.name == name) {
                Some(pos) => self.entries.remove(pos),
                None => OutlineEntry::leaf(name),
            };
            self.entries.insert(0, entry);
        }
        self
    }

    /// Whether any entry at any depth has this name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.contains(name))
    }

    /// Append a new top-level entry.
    pub fn push_root(&mut self, name: impl Into<String>) {
        self.entries.push(OutlineEntry::leaf(name));
    }

    /// Assign a dotted index to every entry in pre-order.
    ///
    /// A name that appears more than once keeps its first position.
    pub fn assign_indices(&self) -> HashMap<String, SectionIndex> {
        fn walk(entries: &[OutlineEntry], prefix: &[u32], out: &mut HashMap<String, SectionIndex>) {
            for (position, entry) in (1u32..).zip(entries) {
                let mut components = prefix.to_vec();
                components.push(position);
                let Some(index) = SectionIndex::new(components) else {
                    continue;
                };
                if out.contains_key(&entry.name) {
                    warn!(
                        name = %entry.name,
                        index = %index,
                        "Duplicate outline entry, keeping first position"
                    );
                } else {
                    out.insert(entry.name.clone(), index.clone());
                }
                walk(&entry.children, index.components(), out);
            }
        }

        let mut out = HashMap::new();
        walk(&self.entries, &[], &mut out);
        out
    }
}

fn parse_entries(value: &Value) -> Result<Vec<OutlineEntry>> {
    let map = match value {
        Value::Object(map) => map,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(DocTreeError::Outline(format!(
                "expected a mapping of names, found {}",
                crate::tree::ValueKind::of(other).as_str()
            )));
        }
    };

    map.iter()
        .map(|(name, info)| {
            let children = match info.get("children") {
                Some(children) => parse_entries(children)?,
                None => Vec::new(),
            };
            Ok(OutlineEntry {
                name: name.clone(),
                children,
            })
        })
        .collect()
}
