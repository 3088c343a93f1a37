//! Doc Tree Index - hierarchical documentation trees for agent navigation.
//!
//! Generated documentation arrives as a directory of markdown section files,
//! each starting with a dotted index header such as `2.1 - Setup`. This
//! library assembles them into a page hierarchy, persists it as a pair of
//! JSON artifacts and lets a reasoning agent explore it by address without
//! ever loading the whole tree into its context.
//!
//! # Overview
//!
//! 1. [`TreeBuilder`] parses section files into a [`StructuredDocs`] tree and
//!    derives its [`DocTree`] skeleton (titles and shape, no text).
//! 2. [`persistence::save_artifacts`] writes both; [`DocsContext::load`]
//!    reads them back as an immutable context.
//! 3. [`Navigator`] resolves a [`PathAddress`] with a depth limit relative to
//!    the endpoint, so deeper addresses reveal what shallower ones truncated.
//! 4. [`SearchIndex`] yields substring hits whose addresses feed straight
//!    back into the navigator.
//!
//! # Quick Start
//!
//! ```no_run
//! use doc_tree_index::{
//!     path, persistence::save_artifacts, DocsContext, Navigator, SearchIndex, TreeBuilder,
//! };
//! use std::path::Path;
//!
//! fn main() -> doc_tree_index::Result<()> {
//!     let output = TreeBuilder::new("my-repo").build_dir(Path::new("docs/sections"))?;
//!     save_artifacts(Path::new("data/my-repo/deepwiki"), &output.docs, &output.tree)?;
//!
//!     let docs = DocsContext::load(Path::new("data/my-repo/deepwiki"))?;
//!     let overview = Navigator::new(&docs).resolve(&path!["subpages", 0], 1)?;
//!     println!("{}", overview.content);
//!
//!     for hit in SearchIndex::new(&docs).search("install", true, true) {
//!         println!("{} ({:?})", hit.address, hit.match_kind);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **PathAddress**: ordered key/index steps from the root
//! - **TreeBuilder**: section files to page hierarchy
//! - **StructuredDocs / DocTree**: full tree and its skeleton
//! - **DocsContext**: loaded, read-only artifact pair
//! - **Navigator**: depth-bounded resolution by address
//! - **SearchIndex**: lazy substring search
//! - **Relay**: delimited, token-bounded text for agent transcripts

pub mod path;

pub mod builder;
pub mod config;
pub mod error;
pub mod markdown;
pub mod navigator;
pub mod outline;
pub mod persistence;
pub mod relay;
pub mod search;
pub mod section;
pub mod tree;

// Re-export commonly used types
pub use builder::{BuildOptions, BuildOutput, BuildReport, TreeBuilder};
pub use config::Config;
pub use error::{DocTreeError, Result};
pub use navigator::{Navigator, PathNotFound, ResolvedContent};
pub use path::{PathAddress, PathStep};
pub use persistence::DocsContext;
pub use relay::Relay;
pub use search::{MatchKind, SearchHit, SearchIndex};
pub use section::SectionIndex;
pub use tree::{DocTree, Page, StructuredDocs};
