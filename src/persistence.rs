//! Persistence of the artifact pair and the loaded read-only context.
//!
//! A documentation source is stored as two JSON files side by side:
//! `docs_tree.json` (skeleton) and `structured_docs.json` (full content).
//! Both are written once by a build and only read afterwards.

use crate::error::{DocTreeError, Result};
use crate::tree::{DocTree, StructuredDocs};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the skeleton artifact.
pub const DOCS_TREE_FILENAME: &str = "docs_tree.json";

/// File name of the full-content artifact.
pub const STRUCTURED_DOCS_FILENAME: &str = "structured_docs.json";

/// Documentation sources tried first, in order, when detecting a source.
pub const PREFERRED_SOURCES: &[&str] = &["codewiki", "deepwiki", "original"];

/// Write both artifacts into `dir`, creating it if needed.
pub fn save_artifacts(dir: &Path, docs: &StructuredDocs, tree: &DocTree) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| DocTreeError::io(dir, e))?;
    }

    let tree_path = dir.join(DOCS_TREE_FILENAME);
    fs::write(&tree_path, tree.to_json()?).map_err(|e| DocTreeError::io(&tree_path, e))?;

    let docs_path = dir.join(STRUCTURED_DOCS_FILENAME);
    fs::write(&docs_path, docs.to_json()?).map_err(|e| DocTreeError::io(&docs_path, e))?;

    debug!(dir = %dir.display(), "Saved documentation artifacts");
    Ok(())
}

/// Check whether a directory holds both artifacts.
pub fn artifacts_exist(dir: &Path) -> bool {
    dir.join(DOCS_TREE_FILENAME).is_file() && dir.join(STRUCTURED_DOCS_FILENAME).is_file()
}

/// Pick the documentation source directory for a repository.
///
/// Prefers the well-known source names, then falls back to the first
/// subdirectory (by name) that holds a skeleton artifact.
pub fn detect_docs_source(repo_dir: &Path) -> Result<PathBuf> {
    for name in PREFERRED_SOURCES {
        let candidate = repo_dir.join(name);
        if candidate.join(DOCS_TREE_FILENAME).is_file() {
            return Ok(candidate);
        }
    }

    if !repo_dir.is_dir() {
        return Err(DocTreeError::NoDocsSource(repo_dir.to_path_buf()));
    }

    let entries = fs::read_dir(repo_dir).map_err(|e| DocTreeError::io(repo_dir, e))?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir() && path.join(DOCS_TREE_FILENAME).is_file())
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| DocTreeError::NoDocsSource(repo_dir.to_path_buf()))
}

fn read_artifact(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Err(DocTreeError::ArtifactNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|e| DocTreeError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| DocTreeError::invalid_artifact(path, e))
}

/// Immutable, loaded documentation source.
///
/// Built once per source and passed by reference to
/// [`Navigator`](crate::navigator::Navigator) and
/// [`SearchIndex`](crate::search::SearchIndex).
#[derive(Debug, Clone)]
pub struct DocsContext {
    dir: Option<PathBuf>,
    docs: StructuredDocs,
    structured: Value,
    skeleton: DocTree,
}

impl DocsContext {
    /// Load both artifacts from a directory.
    pub fn load(dir: &Path) -> Result<Self> {
        let docs_path = dir.join(STRUCTURED_DOCS_FILENAME);
        let structured = read_artifact(&docs_path)?;
        let docs: StructuredDocs = serde_json::from_value(structured.clone())
            .map_err(|e| DocTreeError::invalid_artifact(&docs_path, e))?;

        let tree_path = dir.join(DOCS_TREE_FILENAME);
        let skeleton = read_artifact(&tree_path)?;
        if !skeleton.is_object() {
            return Err(DocTreeError::invalid_artifact(
                &tree_path,
                "expected a mapping at the top level",
            ));
        }

        debug!(
            dir = %dir.display(),
            pages = docs.page_count(),
            "Loaded documentation artifacts"
        );

        Ok(Self {
            dir: Some(dir.to_path_buf()),
            docs,
            structured,
            skeleton: DocTree::from_value(skeleton),
        })
    }

    /// Detect the source for `repo` under `data_dir` and load it.
    pub fn load_repo(data_dir: &Path, repo: &str) -> Result<Self> {
        let source = detect_docs_source(&data_dir.join(repo))?;
        Self::load(&source)
    }

    /// Wrap an in-memory tree, deriving its skeleton.
    pub fn from_docs(docs: StructuredDocs) -> Result<Self> {
        let structured = docs.to_value()?;
        let skeleton = docs.skeleton();
        Ok(Self {
            dir: None,
            docs,
            structured,
            skeleton,
        })
    }

    /// Directory the artifacts were loaded from.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn docs(&self) -> &StructuredDocs {
        &self.docs
    }

    pub fn skeleton(&self) -> &DocTree {
        &self.skeleton
    }

    /// The structured tree in the form addresses resolve against.
    pub fn structured_value(&self) -> &Value {
        &self.structured
    }

    pub fn skeleton_value(&self) -> &Value {
        self.skeleton.as_value()
    }
}
