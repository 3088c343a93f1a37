//! Tree builder - turns a directory of section files into a documentation tree.
//!
//! The build runs in four steps:
//! 1. Assign each file a dotted [`SectionIndex`], either from an outline
//!    (`module_tree.json`) or from the file's first line (`"2.1 - Setup"`).
//! 2. Parse each body into a nested mapping with [`markdown_to_value`],
//!    unwrap a single heading that repeats the title and drop `"On this page"`.
//! 3. Place every section into a scratch tree keyed by index component.
//! 4. Convert the scratch tree into [`Page`]s, siblings sorted ascending,
//!    and derive the skeleton.
//!
//! Malformed files are skipped with a warning; they never abort the build.

use crate::error::{DocTreeError, Result};
use crate::markdown::markdown_to_value;
use crate::outline::{DEFAULT_OUTLINE_FILENAME, Outline};
use crate::section::SectionIndex;
use crate::tree::{DocTree, ON_THIS_PAGE, Page, StructuredDocs, UNTITLED_SECTION};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Options for tree building.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Name of the documented project, used as the root page title.
    pub project_name: String,
    /// Label of the documentation source (e.g. "deepwiki").
    pub source: String,
    /// Explicit outline file. When unset, `module_tree.json` in the input
    /// directory is used if present.
    pub outline_path: Option<PathBuf>,
    /// Entries placed first in a loaded outline.
    pub outline_prelude: Vec<String>,
    /// Fail the build on an index collision instead of keeping the first file.
    pub strict_collisions: bool,
}

impl BuildOptions {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            ..Default::default()
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            project_name: "docs".to_string(),
            source: "deepwiki".to_string(),
            outline_path: None,
            outline_prelude: vec!["overview".to_string()],
            strict_collisions: false,
        }
    }
}

/// A section file's name and raw text.
#[derive(Debug, Clone)]
pub struct SectionSource {
    pub path: PathBuf,
    pub text: String,
}

impl SectionSource {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// File name without the `.md` extension.
    fn stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    }
}

/// A file left out of the tree.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Two files that resolved to the same index; `kept` is in the tree.
#[derive(Debug, Clone, Serialize)]
pub struct CollisionRecord {
    pub index: SectionIndex,
    pub kept: PathBuf,
    pub dropped: PathBuf,
}

/// What happened during a build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub files_seen: usize,
    pub sections_built: usize,
    pub skipped: Vec<SkippedFile>,
    pub collisions: Vec<CollisionRecord>,
}

impl BuildReport {
    fn skip(&mut self, path: &Path, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(path = %path.display(), %reason, "Skipping section file");
        self.skipped.push(SkippedFile {
            path: path.to_path_buf(),
            reason,
        });
    }

    /// Whether the build saw any malformed input or collisions.
    pub fn has_warnings(&self) -> bool {
        !self.skipped.is_empty() || !self.collisions.is_empty()
    }
}

/// Result of a build: both tree representations plus the report.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub docs: StructuredDocs,
    pub tree: DocTree,
    pub report: BuildReport,
}

/// A section ready to be placed in the tree.
#[derive(Debug, Clone)]
struct ParsedSection {
    index: SectionIndex,
    title: String,
    content: Value,
    file: PathBuf,
}

/// Builds documentation trees from section files.
pub struct TreeBuilder {
    options: BuildOptions,
}

impl TreeBuilder {
    /// Create a builder with default options for a project.
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            options: BuildOptions::new(project_name),
        }
    }

    /// Create with custom options.
    pub fn with_options(options: BuildOptions) -> Self {
        Self { options }
    }

    /// Build from the `.md` files directly inside `dir`.
    pub fn build_dir(&self, dir: &Path) -> Result<BuildOutput> {
        if !dir.is_dir() {
            return Err(DocTreeError::InvalidInputDir(dir.to_path_buf()));
        }

        let outline = self.load_outline(dir)?;
        let mut report = BuildReport::default();
        let mut sources = Vec::new();

        for path in list_section_files(dir)? {
            report.files_seen += 1;
            match std::fs::read(&path) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => sources.push(SectionSource { path, text }),
                    Err(e) => report.skip(&path, format!("not valid UTF-8: {}", e)),
                },
                Err(e) => report.skip(&path, format!("unreadable: {}", e)),
            }
        }

        self.assemble(sources, outline, &dir.display().to_string(), report)
    }

    /// Build from in-memory sources.
    pub fn build_sources(
        &self,
        sources: Vec<SectionSource>,
        outline: Option<Outline>,
    ) -> Result<BuildOutput> {
        let report = BuildReport {
            files_seen: sources.len(),
            ..Default::default()
        };
        let outline = outline.map(|o| o.with_prelude(&self.options.outline_prelude));
        self.assemble(sources, outline, "", report)
    }

    fn load_outline(&self, dir: &Path) -> Result<Option<Outline>> {
        let path = match &self.options.outline_path {
            Some(path) => path.clone(),
            None => {
                let candidate = dir.join(DEFAULT_OUTLINE_FILENAME);
                if !candidate.is_file() {
                    return Ok(None);
                }
                candidate
            }
        };
        debug!(path = %path.display(), "Loading outline");
        let outline = Outline::load(&path)?;
        Ok(Some(outline.with_prelude(&self.options.outline_prelude)))
    }

    fn assemble(
        &self,
        sources: Vec<SectionSource>,
        outline: Option<Outline>,
        input_label: &str,
        mut report: BuildReport,
    ) -> Result<BuildOutput> {
        let sections = match outline {
            Some(outline) => sections_from_outline(sources, outline),
            None => sections_from_headers(sources, &mut report),
        };

        let mut scratch = ScratchNode::default();
        for section in sections {
            let index = section.index.clone();
            let file = section.file.clone();
            if let Err(existing) = scratch.insert(section) {
                if self.options.strict_collisions {
                    return Err(DocTreeError::IndexCollision {
                        index,
                        existing,
                        incoming: file,
                    });
                }
                warn!(
                    index = %index,
                    kept = %existing.display(),
                    dropped = %file.display(),
                    "Index collision, keeping the first file"
                );
                report.collisions.push(CollisionRecord {
                    index,
                    kept: existing,
                    dropped: file,
                });
            } else {
                report.sections_built += 1;
            }
        }

        let mut docs = StructuredDocs::for_project(
            &self.options.project_name,
            &self.options.source,
            input_label,
        );
        docs.root.subpages = scratch.into_pages(&[], &self.options.source);
        let tree = docs.skeleton();

        info!(
            project = %self.options.project_name,
            sections = report.sections_built,
            skipped = report.skipped.len(),
            collisions = report.collisions.len(),
            "Built documentation tree"
        );

        Ok(BuildOutput { docs, tree, report })
    }
}

/// Sorted `.md` files directly inside `dir`.
fn list_section_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            match e.into_io_error() {
                Some(io) => DocTreeError::io(path, io),
                None => DocTreeError::InvalidInputDir(path),
            }
        })?;
        let is_markdown = entry.path().extension().and_then(|e| e.to_str()) == Some("md");
        if entry.file_type().is_file() && is_markdown {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Outline mode: file stems are looked up in the outline; unknown stems
/// become new top-level entries.
fn sections_from_outline(sources: Vec<SectionSource>, mut outline: Outline) -> Vec<ParsedSection> {
    for source in &sources {
        let stem = source.stem();
        if !outline.contains(&stem) {
            debug!(title = %stem, "Section not in outline, appending as top-level entry");
            outline.push_root(stem);
        }
    }
    let indices = outline.assign_indices();

    sources
        .into_iter()
        .filter_map(|source| {
            let title = source.stem();
            // Every stem was added to the outline above.
            let index = indices.get(&title)?.clone();
            let content = parse_body(&source.text, &title);
            debug!(path = %source.path.display(), %index, "Parsed section");
            Some(ParsedSection {
                index,
                title,
                content,
                file: source.path,
            })
        })
        .collect()
}

/// Header mode: the first line carries `"<index> - <title>"`.
fn sections_from_headers(
    sources: Vec<SectionSource>,
    report: &mut BuildReport,
) -> Vec<ParsedSection> {
    sources
        .into_iter()
        .filter_map(|source| {
            let (first_line, body) = match source.text.split_once('\n') {
                Some((first, rest)) => (first, rest),
                None => (source.text.as_str(), ""),
            };
            let (index, title) = match parse_header_line(first_line) {
                Ok(parsed) => parsed,
                Err(reason) => {
                    report.skip(&source.path, reason);
                    return None;
                }
            };
            let content = parse_body(body, &title);
            debug!(path = %source.path.display(), %index, "Parsed section");
            Some(ParsedSection {
                index,
                title,
                content,
                file: source.path,
            })
        })
        .collect()
}

/// Parse `"<index> - <title>"`. For URL-style first lines such as
/// `https://host/org/repo/2.1-setup` only the last path segment is used.
pub fn parse_header_line(line: &str) -> std::result::Result<(SectionIndex, String), String> {
    let segment = if line.contains("://") {
        line.trim().rsplit('/').next().unwrap_or(line)
    } else {
        line
    };
    let segment = segment.trim().trim_start_matches('#').trim();

    let Some((index_part, title_part)) = segment.split_once('-') else {
        return Err(format!("first line '{}' has no '<index> - <title>' header", line.trim()));
    };
    let index: SectionIndex = index_part
        .trim()
        .parse()
        .map_err(|_| format!("invalid index '{}' in header '{}'", index_part.trim(), line.trim()))?;

    Ok((index, title_part.trim().to_string()))
}

/// Parse a section body and strip the wrapper heading and navigation chrome.
pub fn parse_body(body: &str, title: &str) -> Value {
    let content = drop_on_this_page(markdown_to_value(body));
    let content = unwrap_title(content, title);
    match content {
        Value::Null => Value::Object(Map::new()),
        other => other,
    }
}

/// `{"Installation": {...}}` in a file titled "Installation" becomes `{...}`.
fn unwrap_title(content: Value, title: &str) -> Value {
    let map = match content {
        Value::Object(map) => map,
        other => return other,
    };
    let matches_title = map.len() == 1
        && map
            .keys()
            .next()
            .is_some_and(|key| title_matches(key, title));
    if !matches_title {
        return Value::Object(map);
    }
    map.into_iter()
        .next()
        .map(|(_, inner)| inner)
        .unwrap_or_else(|| Value::Object(Map::new()))
}

fn title_matches(key: &str, title: &str) -> bool {
    let key = key.trim().to_lowercase();
    let title = title.trim().to_lowercase();
    key == title || key == title.replace('-', " ")
}

/// Remove `"On this page"` keys at every depth.
fn drop_on_this_page(content: Value) -> Value {
    match content {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| key != ON_THIS_PAGE)
                .map(|(key, value)| (key, drop_on_this_page(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(drop_on_this_page).collect()),
        other => other,
    }
}

/// Nested-by-index scratch structure. `BTreeMap` keeps siblings sorted by
/// index component regardless of insertion order.
#[derive(Debug, Default)]
struct ScratchNode {
    section: Option<ParsedSection>,
    children: BTreeMap<u32, ScratchNode>,
}

impl ScratchNode {
    /// Place a section. Returns the already-placed file on collision.
    fn insert(&mut self, section: ParsedSection) -> std::result::Result<(), PathBuf> {
        let mut node = self;
        for component in section.index.components() {
            node = node.children.entry(*component).or_default();
        }
        if let Some(existing) = &node.section {
            return Err(existing.file.clone());
        }
        node.section = Some(section);
        Ok(())
    }

    fn into_pages(self, prefix: &[u32], source: &str) -> Vec<Page> {
        self.children
            .into_iter()
            .map(|(component, child)| {
                let mut components = prefix.to_vec();
                components.push(component);
                child.into_page(components, source)
            })
            .collect()
    }

    fn into_page(self, components: Vec<u32>, source: &str) -> Page {
        let ScratchNode { section, children } = self;
        let index = components
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(".");

        let mut page = match section {
            Some(section) => {
                let file = section
                    .file
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string();
                Page::new(section.title)
                    .with_content(section.content)
                    .with_metadata("source", source)
                    .with_metadata("index", index)
                    .with_metadata("file", file)
            }
            None => Page::new(UNTITLED_SECTION)
                .with_metadata("source", source)
                .with_metadata("index", index),
        };

        let rest = ScratchNode {
            section: None,
            children,
        };
        page.subpages = rest.into_pages(&components, source);
        page
    }
}
