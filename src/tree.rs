//! Documentation tree structures.
//!
//! This module holds both representations of a documentation source:
//! - [`StructuredDocs`]: the full-fidelity [`Page`] hierarchy with all text.
//! - [`DocTree`]: the skeleton projection that keeps titles, descriptions,
//!   page addresses and the shape of the content, with leaf text replaced by
//!   markers. Agents scan the skeleton cheaply and then fetch real content
//!   from the structured tree by address.

use crate::path::PathAddress;
use crate::section::SectionIndex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker replacing leaf text in the skeleton.
pub const DETAIL_CONTENT: &str = "<detail_content>";

/// Navigational chrome emitted by some markdown sources.
pub const ON_THIS_PAGE: &str = "On this page";

/// Title given to pages that only exist to hold subpages.
pub const UNTITLED_SECTION: &str = "Untitled Section";

/// Shape of a JSON node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Mapping,
    Sequence,
    String,
    Number,
    Bool,
    Null,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => ValueKind::Mapping,
            Value::Array(_) => ValueKind::Sequence,
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Bool,
            Value::Null => ValueKind::Null,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Mapping => "mapping",
            ValueKind::Sequence => "sequence",
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Bool => "bool",
            ValueKind::Null => "null",
        }
    }
}

/// A page in the documentation tree.
///
/// A page with subpages is a section node; a page without subpages but with
/// content is a leaf section. Ownership is strictly parent to child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page title.
    #[serde(default)]
    pub title: Option<String>,

    /// Optional short description.
    #[serde(default)]
    pub description: Option<String>,

    /// Parsed content, usually a mapping from heading to body.
    #[serde(default = "empty_content")]
    pub content: Value,

    /// Build provenance (source, dotted index, file name).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    /// Child pages in ascending index order.
    #[serde(default)]
    pub subpages: Vec<Page>,
}

fn empty_content() -> Value {
    Value::Object(Map::new())
}

impl Default for Page {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            content: empty_content(),
            metadata: Map::new(),
            subpages: Vec::new(),
        }
    }
}

impl Page {
    /// Create a page with a title and empty content.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the content.
    pub fn with_content(mut self, content: Value) -> Self {
        self.content = content;
        self
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Add a child page.
    pub fn add_subpage(&mut self, page: Page) {
        self.subpages.push(page);
    }

    /// Whether this page is an internal section node.
    pub fn is_section(&self) -> bool {
        !self.subpages.is_empty()
    }

    /// Whether this page is a leaf carrying content.
    pub fn is_leaf(&self) -> bool {
        self.subpages.is_empty() && !is_empty_value(&self.content)
    }

    /// Title for display purposes.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED_SECTION)
    }

    /// Dotted index recorded at build time, if any.
    pub fn section_index(&self) -> Option<SectionIndex> {
        self.metadata
            .get("index")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// Recursively count all pages in this subtree (including self).
    pub fn page_count(&self) -> usize {
        1 + self.subpages.iter().map(Page::page_count).sum::<usize>()
    }

    /// Depth of this subtree (1 for a page without subpages).
    pub fn depth(&self) -> usize {
        1 + self.subpages.iter().map(Page::depth).max().unwrap_or(0)
    }

    /// Find a page by title (case-insensitive).
    pub fn find_by_title(&self, title: &str) -> Option<&Page> {
        let title_lower = title.to_lowercase();
        if self
            .title
            .as_ref()
            .is_some_and(|t| t.to_lowercase() == title_lower)
        {
            return Some(self);
        }
        self.subpages
            .iter()
            .find_map(|child| child.find_by_title(title))
    }

    /// Format the subtree as an indented outline.
    pub fn format_tree(&self, indent: usize) -> String {
        let prefix = "  ".repeat(indent);
        let index_str = self
            .section_index()
            .map(|i| format!("{} ", i))
            .unwrap_or_default();

        let mut result = format!("{}{}{}\n", prefix, index_str, self.display_title());

        for child in &self.subpages {
            result.push_str(&child.format_tree(indent + 1));
        }

        result
    }
}

/// The full-fidelity documentation tree, rooted at a project page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredDocs {
    pub root: Page,
}

impl StructuredDocs {
    /// Wrap an already built root page.
    pub fn new(root: Page) -> Self {
        Self { root }
    }

    /// Create an empty root page for a project.
    pub fn for_project(name: &str, source: &str, input_path: &str) -> Self {
        let root = Page::new(name)
            .with_description(format!("Documentation for {}", name))
            .with_metadata("type", "root")
            .with_metadata("path", input_path)
            .with_metadata("source", source);
        Self { root }
    }

    /// Total pages including the root.
    pub fn page_count(&self) -> usize {
        self.root.page_count()
    }

    /// Depth of the section hierarchy below the root.
    pub fn max_depth(&self) -> usize {
        self.root.depth() - 1
    }

    /// Find a page by title.
    pub fn find_by_title(&self, title: &str) -> Option<&Page> {
        self.root.find_by_title(title)
    }

    /// Dotted indices of every built section, in tree order.
    ///
    /// Building and then flattening reproduces the index assignment of the
    /// build, sorted ascending.
    pub fn flatten_indices(&self) -> Vec<(SectionIndex, String)> {
        fn walk(page: &Page, out: &mut Vec<(SectionIndex, String)>) {
            for child in &page.subpages {
                if let Some(index) = child.section_index() {
                    out.push((index, child.display_title().to_string()));
                }
                walk(child, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }

    /// Derive the skeleton projection.
    pub fn skeleton(&self) -> DocTree {
        DocTree(skeleton_page(&self.root, &PathAddress::root()))
    }

    /// Format the entire tree for display.
    pub fn format(&self) -> String {
        let mut result = format!(
            "Documentation: {} ({} pages, depth {})\n",
            self.root.display_title(),
            self.page_count(),
            self.max_depth()
        );
        result.push_str(&"─".repeat(50));
        result.push('\n');

        for page in &self.root.subpages {
            result.push_str(&page.format_tree(0));
        }

        result
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Structured tree as a JSON value, the form addresses are resolved in.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Skeleton projection of a [`StructuredDocs`] tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocTree(Value);

impl DocTree {
    /// Wrap a skeleton loaded from storage.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.0)
    }
}

fn skeleton_page(page: &Page, path: &PathAddress) -> Value {
    let mut result = Map::new();

    if let Some(title) = page.title.as_ref().filter(|t| !t.is_empty()) {
        result.insert("title".to_string(), Value::String(title.clone()));
    }
    if let Some(description) = page.description.as_ref().filter(|d| !d.is_empty()) {
        result.insert("description".to_string(), Value::String(description.clone()));
    }
    if !path.is_empty() {
        result.insert("path".to_string(), Value::String(path.to_json()));
    }
    if !is_empty_value(&page.content) {
        result.insert("content".to_string(), skeleton_value(&page.content));
    }
    if !page.subpages.is_empty() {
        let base = path.append("subpages");
        let subpages = page
            .subpages
            .iter()
            .enumerate()
            .map(|(i, child)| skeleton_page(child, &base.append(i)))
            .collect();
        result.insert("subpages".to_string(), Value::Array(subpages));
    }

    Value::Object(result)
}

fn skeleton_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != ON_THIS_PAGE)
                .map(|(key, v)| (key.clone(), skeleton_value(v)))
                .collect(),
        ),
        // Lists of text collapse to a single marker.
        Value::Array(items) => match items.first() {
            None => Value::Array(Vec::new()),
            Some(Value::String(_)) => Value::String(DETAIL_CONTENT.to_string()),
            Some(_) => Value::Array(items.iter().map(skeleton_value).collect()),
        },
        Value::String(_) => Value::String(DETAIL_CONTENT.to_string()),
        Value::Number(n) if n.is_f64() => Value::String("<float>".to_string()),
        Value::Number(_) => Value::String("<int>".to_string()),
        Value::Bool(_) => Value::String("<bool>".to_string()),
        Value::Null => Value::Null,
    }
}

/// Empty in the sense used for omitting keys: null, "", {} or [].
pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Number(_) | Value::Bool(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_docs() -> StructuredDocs {
        let mut docs = StructuredDocs::for_project("demo", "deepwiki", "/tmp/demo");

        let overview = Page::new("Overview")
            .with_content(json!({"Purpose": "Explains things.", "Version": 3}))
            .with_metadata("index", "1");

        let mut guide = Page::new(UNTITLED_SECTION).with_metadata("index", "2");
        guide.add_subpage(
            Page::new("Setup")
                .with_content(json!({"Steps": ["a", "b"], "On this page": ["x"]}))
                .with_metadata("index", "2.1"),
        );
        guide.add_subpage(
            Page::new("Usage")
                .with_content(json!({"Flags": {"verbose": true, "ratio": 0.5, "none": null}}))
                .with_metadata("index", "2.2"),
        );

        docs.root.add_subpage(overview);
        docs.root.add_subpage(guide);
        docs
    }

    #[test]
    fn test_page_creation() {
        let page = Page::new("Intro").with_description("Start here");
        assert_eq!(page.title.as_deref(), Some("Intro"));
        assert_eq!(page.description.as_deref(), Some("Start here"));
        assert!(!page.is_section());
        assert!(!page.is_leaf());
    }

    #[test]
    fn test_section_and_leaf() {
        let docs = sample_docs();
        let guide = &docs.root.subpages[1];
        assert!(guide.is_section());
        assert!(!guide.is_leaf());
        assert!(guide.subpages[0].is_leaf());
    }

    #[test]
    fn test_counts_and_depth() {
        let docs = sample_docs();
        assert_eq!(docs.page_count(), 5);
        assert_eq!(docs.max_depth(), 2);
    }

    #[test]
    fn test_find_by_title() {
        let docs = sample_docs();
        assert!(docs.find_by_title("setup").is_some());
        assert!(docs.find_by_title("Missing").is_none());
    }

    #[test]
    fn test_flatten_indices() {
        let docs = sample_docs();
        let indices: Vec<String> = docs
            .flatten_indices()
            .into_iter()
            .map(|(i, _)| i.to_string())
            .collect();
        assert_eq!(indices, vec!["1", "2", "2.1", "2.2"]);
    }

    #[test]
    fn test_skeleton_shape() {
        let skeleton = sample_docs().skeleton();
        let root = skeleton.as_value();

        assert_eq!(root["title"], "demo");
        assert_eq!(root["description"], "Documentation for demo");
        assert!(root.get("path").is_none());
        assert!(root.get("content").is_none());

        let overview = &root["subpages"][0];
        assert_eq!(overview["path"], r#"["subpages",0]"#);
        assert_eq!(overview["content"]["Purpose"], DETAIL_CONTENT);
        assert_eq!(overview["content"]["Version"], "<int>");

        let setup = &root["subpages"][1]["subpages"][0];
        assert_eq!(setup["path"], r#"["subpages",1,"subpages",0]"#);
        assert_eq!(setup["content"]["Steps"], DETAIL_CONTENT);
        assert!(setup["content"].get(ON_THIS_PAGE).is_none());

        let flags = &root["subpages"][1]["subpages"][1]["content"]["Flags"];
        assert_eq!(flags["verbose"], "<bool>");
        assert_eq!(flags["ratio"], "<float>");
        assert_eq!(flags["none"], Value::Null);
    }

    #[test]
    fn test_structured_json_roundtrip() {
        let docs = sample_docs();
        let json = docs.to_json().unwrap();
        let parsed = StructuredDocs::from_json(&json).unwrap();
        assert_eq!(parsed, docs);

        // Content key order survives the round trip.
        let keys: Vec<&String> = parsed.root.subpages[0]
            .content
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, vec!["Purpose", "Version"]);
    }

    #[test]
    fn test_format_tree() {
        let formatted = sample_docs().format();
        assert!(formatted.contains("1 Overview"));
        assert!(formatted.contains("  2.1 Setup"));
    }
}
