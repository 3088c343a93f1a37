//! Path-addressed, depth-bounded navigation.
//!
//! [`Navigator::resolve`] walks a [`PathAddress`] down the structured tree
//! and returns what it finds with everything nested more than `depth_limit`
//! levels below the endpoint replaced by a truncation sentinel. Truncation is
//! always relative to the endpoint, never to the root, so extending the
//! same address reveals whatever a shallower call hid.

use crate::path::{PathAddress, PathStep};
use crate::persistence::DocsContext;
use crate::tree::ValueKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Default number of levels returned below the resolved node.
pub const DEFAULT_DEPTH_LIMIT: usize = 15;

/// Key of the sentinel that replaces a truncated mapping.
pub const TRUNCATED_KEY: &str = "...";

/// Why a step could not be taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotFoundReason {
    /// The mapping has no such key.
    MissingKey,
    /// The sequence is shorter than the index.
    IndexOutOfRange { len: usize },
    /// An integer step was applied to a mapping.
    IndexOnMapping,
    /// A non-numeric key was applied to a sequence.
    KeyOnSequence,
    /// The address continues past a scalar.
    Scalar { found: ValueKind },
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::MissingKey => f.write_str("key not found"),
            NotFoundReason::IndexOutOfRange { len } => {
                write!(f, "index out of range for list of {} items", len)
            }
            NotFoundReason::IndexOnMapping => f.write_str("integer step applied to a mapping"),
            NotFoundReason::KeyOnSequence => f.write_str("key applied to a list"),
            NotFoundReason::Scalar { found } => {
                write!(f, "cannot navigate into a {} value", found.as_str())
            }
        }
    }
}

/// An address that does not exist in the tree.
///
/// Carries the full address, the zero-based position of the failing step
/// and the step itself, so callers can retry with a shorter or corrected
/// address. `address.prefix(position)` is the deepest valid ancestor.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error(
    "Content not found at path {}: {} at step {} ('{}')",
    .address.display_arrows(),
    .reason,
    .position,
    .step
)]
pub struct PathNotFound {
    pub address: PathAddress,
    pub position: usize,
    pub step: PathStep,
    pub reason: NotFoundReason,
}

impl PathNotFound {
    /// Longest prefix of the address that does resolve.
    pub fn valid_prefix(&self) -> PathAddress {
        self.address.prefix(self.position)
    }
}

/// Content found at an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedContent {
    pub address: PathAddress,
    /// Depth-limited content from the structured tree.
    pub content: Value,
    /// Depth-limited skeleton node at the same address, when the skeleton
    /// has one (leaf text lists collapse in the skeleton).
    pub tree_structure: Option<Value>,
    pub content_type: ValueKind,
}

/// One child listed by [`Navigator::list_sections`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionEntry {
    Subpage {
        index: usize,
        title: String,
        has_content: bool,
        has_subpages: bool,
        path: PathAddress,
    },
    ContentSection {
        key: String,
        value_kind: ValueKind,
        has_content: bool,
        path: PathAddress,
    },
}

/// Follow `address` from `root`.
pub fn descend<'v>(root: &'v Value, address: &PathAddress) -> Result<&'v Value, PathNotFound> {
    let mut current = root;

    for (position, step) in address.steps().iter().enumerate() {
        let fail = |reason| PathNotFound {
            address: address.clone(),
            position,
            step: step.clone(),
            reason,
        };

        current = match (current, step) {
            (Value::Object(map), PathStep::Key(key)) => {
                map.get(key).ok_or_else(|| fail(NotFoundReason::MissingKey))?
            }
            (Value::Object(_), PathStep::Index(_)) => {
                return Err(fail(NotFoundReason::IndexOnMapping));
            }
            (Value::Array(items), PathStep::Index(index)) => items
                .get(*index)
                .ok_or_else(|| fail(NotFoundReason::IndexOutOfRange { len: items.len() }))?,
            // Agents sometimes quote indices; a numeric key still selects.
            (Value::Array(items), PathStep::Key(key)) => match key.trim().parse::<usize>() {
                Ok(index) => items
                    .get(index)
                    .ok_or_else(|| fail(NotFoundReason::IndexOutOfRange { len: items.len() }))?,
                Err(_) => return Err(fail(NotFoundReason::KeyOnSequence)),
            },
            (scalar, _) => {
                return Err(fail(NotFoundReason::Scalar {
                    found: ValueKind::of(scalar),
                }));
            }
        };
    }

    Ok(current)
}

/// Copy `value`, replacing containers nested more than `depth_limit` levels
/// below it with truncation sentinels. The value itself is never replaced
/// and scalars are never replaced.
pub fn limit_depth(value: &Value, depth_limit: usize) -> Value {
    limit_at(value, depth_limit, 0)
}

fn limit_at(value: &Value, depth_limit: usize, level: usize) -> Value {
    let child = |v: &Value| {
        if level + 1 > depth_limit {
            truncate(v, depth_limit)
        } else {
            limit_at(v, depth_limit, level + 1)
        }
    };

    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| (key.clone(), child(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(child).collect()),
        scalar => scalar.clone(),
    }
}

fn truncate(value: &Value, depth_limit: usize) -> Value {
    match value {
        Value::Object(map) if !map.is_empty() => {
            let mut sentinel = Map::new();
            sentinel.insert(
                TRUNCATED_KEY.to_string(),
                Value::String(format!("<content truncated at depth {}>", depth_limit)),
            );
            Value::Object(sentinel)
        }
        Value::Array(items) if !items.is_empty() => Value::Array(vec![Value::String(format!(
            "<list with {} items truncated at depth {}>",
            items.len(),
            depth_limit
        ))]),
        other => other.clone(),
    }
}

/// Whether a value is a truncation sentinel produced by [`limit_depth`].
pub fn is_truncation_sentinel(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            map.len() == 1 && map.get(TRUNCATED_KEY).is_some_and(Value::is_string)
        }
        Value::Array(items) => items.len() == 1 && items[0].as_str().is_some_and(is_truncation_text),
        Value::String(s) => is_truncation_text(s),
        _ => false,
    }
}

pub(crate) fn is_truncation_text(s: &str) -> bool {
    (s.starts_with("<content truncated at depth ") || s.starts_with("<list with "))
        && s.ends_with('>')
        && s.contains("truncated at depth")
}

/// Read-only navigator over one documentation source.
pub struct Navigator<'a> {
    docs: &'a DocsContext,
    depth_limit: usize,
}

impl<'a> Navigator<'a> {
    /// Create a navigator with the default depth limit.
    pub fn new(docs: &'a DocsContext) -> Self {
        Self {
            docs,
            depth_limit: DEFAULT_DEPTH_LIMIT,
        }
    }

    /// Set the depth limit used by [`get`](Self::get) and batch calls.
    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    /// Resolve `address` and limit the result to `depth_limit` levels below it.
    pub fn resolve(
        &self,
        address: &PathAddress,
        depth_limit: usize,
    ) -> Result<ResolvedContent, PathNotFound> {
        let node = descend(self.docs.structured_value(), address)?;
        let tree_structure = descend(self.docs.skeleton_value(), address)
            .ok()
            .map(|skeleton| limit_depth(skeleton, depth_limit));

        Ok(ResolvedContent {
            address: address.clone(),
            content: limit_depth(node, depth_limit),
            tree_structure,
            content_type: ValueKind::of(node),
        })
    }

    /// Resolve with the navigator's configured depth limit.
    pub fn get(&self, address: &PathAddress) -> Result<ResolvedContent, PathNotFound> {
        self.resolve(address, self.depth_limit)
    }

    /// Resolve several addresses independently; one failure does not affect
    /// the others.
    pub fn resolve_many(
        &self,
        addresses: &[PathAddress],
    ) -> Vec<(PathAddress, Result<ResolvedContent, PathNotFound>)> {
        addresses
            .iter()
            .map(|address| (address.clone(), self.get(address)))
            .collect()
    }

    /// List the subpages and content keys of the skeleton node at `address`.
    pub fn list_sections(&self, address: &PathAddress) -> Result<Vec<SectionEntry>, PathNotFound> {
        let node = descend(self.docs.skeleton_value(), address)?;
        let mut sections = Vec::new();

        let Value::Object(map) = node else {
            return Ok(sections);
        };

        if let Some(Value::Array(subpages)) = map.get("subpages") {
            let base = address.append("subpages");
            for (index, subpage) in subpages.iter().enumerate() {
                let non_empty = |key: &str| {
                    subpage
                        .get(key)
                        .is_some_and(|v| !crate::tree::is_empty_value(v))
                };
                sections.push(SectionEntry::Subpage {
                    index,
                    title: subpage
                        .get("title")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Section {}", index)),
                    has_content: non_empty("content"),
                    has_subpages: non_empty("subpages"),
                    path: base.append(index),
                });
            }
        }

        if let Some(Value::Object(content)) = map.get("content") {
            let base = address.append("content");
            for (key, value) in content {
                sections.push(SectionEntry::ContentSection {
                    key: key.clone(),
                    value_kind: ValueKind::of(value),
                    has_content: !value.is_null(),
                    path: base.append(key.as_str()),
                });
            }
        }

        Ok(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{SectionSource, TreeBuilder};
    use crate::path;
    use proptest::prelude::*;
    use serde_json::json;

    fn context() -> DocsContext {
        let sources = vec![
            SectionSource::new(
                "overview.md",
                "1 - Overview\n# Overview\n\n## Goals\n\nBe fast.\n\n## Scope\n\n- a\n- b\n",
            ),
            SectionSource::new("setup.md", "2.1 - Setup\n# Setup\n\nInstall it.\n"),
            SectionSource::new("usage.md", "2.2 - Usage\n# Usage\n\n## Flags\n\n### Verbose\n\nMore output.\n"),
        ];
        let output = TreeBuilder::new("demo").build_sources(sources, None).unwrap();
        DocsContext::from_docs(output.docs).unwrap()
    }

    #[test]
    fn test_descend_by_key_and_index() {
        let docs = context();
        let value = descend(docs.structured_value(), &path!["subpages", 1, "subpages", 0, "title"]).unwrap();
        assert_eq!(value, "Setup");
    }

    #[test]
    fn test_missing_key_reports_position() {
        let docs = context();
        let nav = Navigator::new(&docs);
        let address = path!["subpages", 0, "content", "Nope", "deeper"];
        let err = nav.resolve(&address, 3).unwrap_err();

        assert_eq!(err.position, 3);
        assert_eq!(err.step, PathStep::Key("Nope".to_string()));
        assert_eq!(err.reason, NotFoundReason::MissingKey);
        assert_eq!(err.valid_prefix(), path!["subpages", 0, "content"]);
        assert!(err.to_string().contains("subpages -> 0 -> content -> Nope -> deeper"));
    }

    #[test]
    fn test_other_failures() {
        let docs = context();
        let nav = Navigator::new(&docs);

        let err = nav.resolve(&path!["subpages", 9], 1).unwrap_err();
        assert_eq!(err.reason, NotFoundReason::IndexOutOfRange { len: 2 });

        let err = nav.resolve(&path![0], 1).unwrap_err();
        assert_eq!(err.reason, NotFoundReason::IndexOnMapping);

        let err = nav.resolve(&path!["subpages", "first"], 1).unwrap_err();
        assert_eq!(err.reason, NotFoundReason::KeyOnSequence);

        let err = nav.resolve(&path!["title", "x"], 1).unwrap_err();
        assert_eq!(err.reason, NotFoundReason::Scalar { found: ValueKind::String });
    }

    #[test]
    fn test_numeric_key_selects_list_item() {
        let docs = context();
        let nav = Navigator::new(&docs);
        let resolved = nav.resolve(&path!["subpages", "0", "title"], 1).unwrap();
        assert_eq!(resolved.content, "Overview");
    }

    #[test]
    fn test_depth_zero_truncates_below_endpoint() {
        let docs = context();
        let nav = Navigator::new(&docs);
        let resolved = nav.resolve(&path!["subpages", 0], 0).unwrap();

        assert_eq!(resolved.content_type, ValueKind::Mapping);
        assert_eq!(resolved.content["title"], "Overview");
        assert!(is_truncation_sentinel(&resolved.content["content"]));
        assert_eq!(
            resolved.content["content"][TRUNCATED_KEY],
            "<content truncated at depth 0>"
        );
        // Empty containers have nothing to hide.
        assert_eq!(resolved.content["subpages"], json!([]));
    }

    #[test]
    fn test_deeper_address_reveals_truncated_content() {
        let docs = context();
        let nav = Navigator::new(&docs);

        let shallow = nav.resolve(&path!["subpages", 0], 1).unwrap();
        let scope = &shallow.content["content"]["Scope"];
        assert_eq!(scope, &json!(["<list with 2 items truncated at depth 1>"]));
        assert!(is_truncation_sentinel(scope));

        let deep = nav.resolve(&path!["subpages", 0, "content", "Scope"], 1).unwrap();
        assert_eq!(deep.content, json!(["a", "b"]));
        assert_eq!(deep.content_type, ValueKind::Sequence);
    }

    #[test]
    fn test_skeleton_alongside_content() {
        let docs = context();
        let nav = Navigator::new(&docs);
        let resolved = nav.resolve(&path!["subpages", 0, "content"], 5).unwrap();

        assert_eq!(resolved.content["Goals"], "Be fast.");
        let skeleton = resolved.tree_structure.unwrap();
        assert_eq!(skeleton["Goals"], crate::tree::DETAIL_CONTENT);

        // Inside a collapsed text list the skeleton has no node.
        let resolved = nav.resolve(&path!["subpages", 0, "content", "Scope", 0], 5).unwrap();
        assert_eq!(resolved.content, "a");
        assert!(resolved.tree_structure.is_none());
    }

    #[test]
    fn test_resolve_many_is_independent() {
        let docs = context();
        let nav = Navigator::new(&docs).with_depth_limit(2);
        let results = nav.resolve_many(&[
            path!["subpages", 7],
            path!["subpages", 1, "subpages", 1, "title"],
        ]);

        assert!(results[0].1.is_err());
        assert_eq!(results[1].1.as_ref().unwrap().content, "Usage");
    }

    #[test]
    fn test_list_sections() {
        let docs = context();
        let nav = Navigator::new(&docs);

        let top = nav.list_sections(&PathAddress::root()).unwrap();
        assert_eq!(top.len(), 2);
        match &top[1] {
            SectionEntry::Subpage {
                title,
                has_subpages,
                path,
                ..
            } => {
                assert_eq!(title, crate::tree::UNTITLED_SECTION);
                assert!(*has_subpages);
                assert_eq!(path, &path!["subpages", 1]);
            }
            other => panic!("unexpected entry {:?}", other),
        }

        let overview = nav.list_sections(&path!["subpages", 0]).unwrap();
        let keys: Vec<&str> = overview
            .iter()
            .filter_map(|entry| match entry {
                SectionEntry::ContentSection { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(keys, vec!["Goals", "Scope"]);
    }

    #[test]
    fn test_limit_depth_keeps_scalars() {
        let value = json!({"a": 1, "b": {"c": {"d": 2}}, "e": [[1], []]});
        let limited = limit_depth(&value, 1);
        assert_eq!(
            limited,
            json!({
                "a": 1,
                "b": {"c": {"...": "<content truncated at depth 1>"}},
                "e": [["<list with 1 items truncated at depth 1>"], []]
            })
        );
        assert_eq!(limit_depth(&json!("text"), 0), json!("text"));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z ]{0,8}".prop_map(Value::from),
        ];
        leaf.prop_recursive(5, 48, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    fn sentinels(value: &Value, address: PathAddress, out: &mut Vec<PathAddress>) {
        if value.is_object() || value.is_array() {
            if is_truncation_sentinel(value) {
                out.push(address);
                return;
            }
        }
        match value {
            Value::Object(map) => {
                for (key, v) in map {
                    sentinels(v, address.append(key.as_str()), out);
                }
            }
            Value::Array(items) => {
                for (index, v) in items.iter().enumerate() {
                    sentinels(v, address.append(index), out);
                }
            }
            _ => {}
        }
    }

    proptest! {
        #[test]
        fn prop_truncation_only_hides(value in arb_value(), depth in 0usize..4) {
            let limited = limit_depth(&value, depth);
            let mut hidden = Vec::new();
            sentinels(&limited, PathAddress::root(), &mut hidden);

            for address in hidden {
                // Sentinels sit exactly one level past the limit.
                prop_assert_eq!(address.len(), depth + 1);

                // Extending the address reaches the real data.
                let original = descend(&value, &address).unwrap();
                let shown = descend(&limited, &address).unwrap();
                match original {
                    Value::Object(map) => {
                        prop_assert!(!map.is_empty());
                        prop_assert!(shown.is_object());
                    }
                    Value::Array(items) => {
                        let expected = format!("<list with {} items", items.len());
                        prop_assert!(shown[0].as_str().unwrap().starts_with(&expected));
                    }
                    other => prop_assert!(false, "scalar {:?} was truncated", other),
                }
            }
        }
    }
}
