//! Substring search over the structured tree.
//!
//! The search walks pages depth-first: a page's own title and description
//! first, then its content, then its subpages in order. Every hit carries the
//! address that [`Navigator`](crate::navigator::Navigator) resolves, so an
//! agent can go from a hit straight to the surrounding content.

use crate::navigator::is_truncation_text;
use crate::path::PathAddress;
use crate::persistence::DocsContext;
use crate::tree::DETAIL_CONTENT;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::VecDeque;

/// Keys checked as titles and descriptions on any mapping, not searched as text.
const LABEL_KEYS: [&str; 2] = ["title", "description"];

/// Default maximum number of characters in a content excerpt.
pub const DEFAULT_EXCERPT_CHARS: usize = 500;

/// Where the query matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Title,
    Description,
    Content,
}

/// A single search match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Address of the matched string.
    pub address: PathAddress,
    pub match_kind: MatchKind,
    /// Matched text, capped for content matches.
    pub excerpt: String,
    /// Title of the page containing the match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
}

/// Search over one loaded documentation source.
pub struct SearchIndex<'a> {
    docs: &'a DocsContext,
    excerpt_chars: usize,
}

impl<'a> SearchIndex<'a> {
    pub fn new(docs: &'a DocsContext) -> Self {
        Self {
            docs,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }

    /// Set the excerpt length for content matches.
    pub fn with_excerpt_chars(mut self, excerpt_chars: usize) -> Self {
        self.excerpt_chars = excerpt_chars;
        self
    }

    /// Case-insensitive substring search.
    ///
    /// The query is matched as given, surrounding whitespace included.
    /// Returns a lazy iterator; an empty query matches nothing.
    pub fn search(&self, query: &str, in_titles: bool, in_descriptions: bool) -> SearchMatches<'a> {
        let query = query.to_lowercase();
        let mut stack = Vec::new();
        if !query.is_empty() {
            stack.push(Frame {
                value: self.docs.structured_value(),
                address: PathAddress::root(),
                page_title: None,
                is_page: true,
            });
        }

        SearchMatches {
            query,
            in_titles,
            in_descriptions,
            excerpt_chars: self.excerpt_chars,
            stack,
            pending: VecDeque::new(),
        }
    }
}

struct Frame<'a> {
    value: &'a Value,
    address: PathAddress,
    page_title: Option<String>,
    is_page: bool,
}

/// Lazy iterator over search hits in traversal order.
pub struct SearchMatches<'a> {
    query: String,
    in_titles: bool,
    in_descriptions: bool,
    excerpt_chars: usize,
    stack: Vec<Frame<'a>>,
    pending: VecDeque<SearchHit>,
}

impl SearchMatches<'_> {
    fn matches(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.query)
    }

    fn excerpt(&self, text: &str) -> String {
        match text.char_indices().nth(self.excerpt_chars) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.to_string(),
        }
    }
}

impl<'a> SearchMatches<'a> {
    /// Queue title and description hits of a mapping, per the flags.
    fn check_labels(
        &mut self,
        map: &Map<String, Value>,
        address: &PathAddress,
        page_title: Option<&str>,
    ) {
        for (key, kind, enabled) in [
            ("title", MatchKind::Title, self.in_titles),
            ("description", MatchKind::Description, self.in_descriptions),
        ] {
            if !enabled {
                continue;
            }
            if let Some(text) = map.get(key).and_then(Value::as_str) {
                if self.matches(text) {
                    self.pending.push_back(SearchHit {
                        address: address.append(key),
                        match_kind: kind,
                        excerpt: text.to_string(),
                        page_title: page_title.map(str::to_string),
                    });
                }
            }
        }
    }

    fn visit_page(&mut self, frame: Frame<'a>) {
        let Value::Object(page) = frame.value else {
            return;
        };
        let title = page.get("title").and_then(Value::as_str);
        self.check_labels(page, &frame.address, title);

        // Pushed in reverse so content is visited before subpages.
        if let Some(Value::Array(subpages)) = page.get("subpages") {
            let base = frame.address.append("subpages");
            for (index, subpage) in subpages.iter().enumerate().rev() {
                self.stack.push(Frame {
                    value: subpage,
                    address: base.append(index),
                    page_title: None,
                    is_page: true,
                });
            }
        }
        if let Some(content) = page.get("content") {
            self.stack.push(Frame {
                value: content,
                address: frame.address.append("content"),
                page_title: title.map(str::to_string),
                is_page: false,
            });
        }
    }

    fn visit_content(&mut self, frame: Frame<'a>) {
        match frame.value {
            Value::Object(map) => {
                self.check_labels(map, &frame.address, frame.page_title.as_deref());
                let rest = map
                    .iter()
                    .filter(|(key, _)| !LABEL_KEYS.contains(&key.as_str()));
                for (key, value) in rest.rev() {
                    self.stack.push(Frame {
                        value,
                        address: frame.address.append(key.as_str()),
                        page_title: frame.page_title.clone(),
                        is_page: false,
                    });
                }
            }
            Value::Array(items) => {
                for (index, value) in items.iter().enumerate().rev() {
                    self.stack.push(Frame {
                        value,
                        address: frame.address.append(index),
                        page_title: frame.page_title.clone(),
                        is_page: false,
                    });
                }
            }
            Value::String(text) => {
                if text == DETAIL_CONTENT || is_truncation_text(text) {
                    return;
                }
                if self.matches(text) {
                    self.pending.push_back(SearchHit {
                        address: frame.address,
                        match_kind: MatchKind::Content,
                        excerpt: self.excerpt(text),
                        page_title: frame.page_title,
                    });
                }
            }
            _ => {}
        }
    }
}

impl Iterator for SearchMatches<'_> {
    type Item = SearchHit;

    fn next(&mut self) -> Option<SearchHit> {
        loop {
            if let Some(hit) = self.pending.pop_front() {
                return Some(hit);
            }
            let frame = self.stack.pop()?;
            if frame.is_page {
                self.visit_page(frame);
            } else {
                self.visit_content(frame);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{SectionSource, TreeBuilder};
    use crate::navigator::Navigator;
    use crate::path;
    use crate::tree::{Page, StructuredDocs};
    use serde_json::json;

    fn context() -> DocsContext {
        let sources = vec![
            SectionSource::new("overview.md", "1 - Overview\n# Overview\n\nWhat it is.\n"),
            SectionSource::new("setup.md", "2.1 - Setup\n# Setup\n\nInstall it.\n"),
            SectionSource::new("usage.md", "2.2 - Usage\n# Usage\n\nRun it after install.\n"),
        ];
        let output = TreeBuilder::new("demo").build_sources(sources, None).unwrap();
        DocsContext::from_docs(output.docs).unwrap()
    }

    #[test]
    fn test_single_title_match() {
        let docs = context();
        let hits: Vec<SearchHit> = SearchIndex::new(&docs).search("setup", true, true).collect();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].match_kind, MatchKind::Title);
        assert_eq!(hits[0].address, path!["subpages", 1, "subpages", 0, "title"]);
        assert_eq!(hits[0].excerpt, "Setup");
    }

    #[test]
    fn test_content_matches_in_traversal_order() {
        let docs = context();
        let hits: Vec<SearchHit> = SearchIndex::new(&docs)
            .search("INSTALL", false, false)
            .collect();

        let addresses: Vec<PathAddress> = hits.iter().map(|h| h.address.clone()).collect();
        assert_eq!(
            addresses,
            vec![
                path!["subpages", 1, "subpages", 0, "content"],
                path!["subpages", 1, "subpages", 1, "content"],
            ]
        );
        assert!(hits.iter().all(|h| h.match_kind == MatchKind::Content));
        assert_eq!(hits[1].page_title.as_deref(), Some("Usage"));
    }

    #[test]
    fn test_hit_address_resolves() {
        let docs = context();
        let hit = SearchIndex::new(&docs)
            .search("run it", true, true)
            .next()
            .unwrap();

        let resolved = Navigator::new(&docs).resolve(&hit.address, 0).unwrap();
        assert_eq!(resolved.content, "Run it after install.");
    }

    #[test]
    fn test_flags_and_description() {
        let docs = context();
        // Root description is "Documentation for demo".
        let with: Vec<_> = SearchIndex::new(&docs).search("documentation for", true, true).collect();
        assert_eq!(with.len(), 1);
        assert_eq!(with[0].match_kind, MatchKind::Description);
        assert_eq!(with[0].address, path!["description"]);

        let without: Vec<_> = SearchIndex::new(&docs).search("documentation for", true, false).collect();
        assert!(without.is_empty());

        let titles_off: Vec<_> = SearchIndex::new(&docs).search("setup", false, true).collect();
        assert!(titles_off.is_empty());
    }

    #[test]
    fn test_no_match_is_empty() {
        let docs = context();
        assert_eq!(SearchIndex::new(&docs).search("kubernetes", true, true).count(), 0);
        assert_eq!(SearchIndex::new(&docs).search("", true, true).count(), 0);
    }

    #[test]
    fn test_excerpt_and_markers() {
        let mut docs = StructuredDocs::for_project("demo", "deepwiki", "/tmp");
        docs.root.add_subpage(Page::new("Long").with_content(json!({
            "Body": "needle ".repeat(10),
            "Marker": DETAIL_CONTENT,
            "List": ["x", {"inner": "a needle here"}],
        })));
        let context = DocsContext::from_docs(docs).unwrap();

        let hits: Vec<SearchHit> = SearchIndex::new(&context)
            .with_excerpt_chars(6)
            .search("needle", false, false)
            .collect();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].excerpt, "needle...");
        assert_eq!(hits[1].address, path!["subpages", 0, "content", "List", 1, "inner"]);

        // Detail markers never match.
        assert_eq!(SearchIndex::new(&context).search("detail_content", true, true).count(), 0);
    }

    fn single_page(content: Value) -> DocsContext {
        let mut docs = StructuredDocs::for_project("demo", "deepwiki", "/tmp");
        docs.root.add_subpage(Page::new("Page").with_content(content));
        DocsContext::from_docs(docs).unwrap()
    }

    #[test]
    fn test_query_whitespace_is_significant() {
        let context = single_page(json!({"A": "running fast", "B": "run it"}));
        let hits: Vec<PathAddress> = SearchIndex::new(&context)
            .search("run ", true, true)
            .map(|hit| hit.address)
            .collect();
        assert_eq!(hits, vec![path!["subpages", 0, "content", "B"]]);
    }

    #[test]
    fn test_labels_inside_content_follow_flags() {
        let context = single_page(json!({
            "Nested": {"title": "Widget API", "description": "widget helpers", "body": "no match"}
        }));
        let index = SearchIndex::new(&context);

        let hits: Vec<SearchHit> = index.search("widget", true, true).collect();
        let found: Vec<(PathAddress, MatchKind)> = hits
            .iter()
            .map(|hit| (hit.address.clone(), hit.match_kind))
            .collect();
        assert_eq!(
            found,
            vec![
                (path!["subpages", 0, "content", "Nested", "title"], MatchKind::Title),
                (
                    path!["subpages", 0, "content", "Nested", "description"],
                    MatchKind::Description
                ),
            ]
        );
        assert_eq!(hits[0].page_title.as_deref(), Some("Page"));

        let titles_only: Vec<MatchKind> =
            index.search("widget", true, false).map(|hit| hit.match_kind).collect();
        assert_eq!(titles_only, vec![MatchKind::Title]);

        assert_eq!(index.search("widget", false, false).count(), 0);
    }

    #[test]
    fn test_metadata_is_not_searched() {
        let docs = context();
        // Every section carries metadata source "deepwiki".
        assert_eq!(SearchIndex::new(&docs).search("deepwiki", true, true).count(), 0);
    }
}
