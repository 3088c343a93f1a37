//! Text framing for results relayed into a conversational context.
//!
//! Each result becomes a delimited block:
//!
//! ```text
//! --------------------------------
//! Path: ["subpages",0]
//! Content:
//! {...}
//! --------------------------------
//! ```
//!
//! The concatenated output is cut to a token budget, with a trailing notice
//! pointing the caller at narrower addresses.

use crate::navigator::{PathNotFound, ResolvedContent};
use crate::path::PathAddress;
use crate::search::SearchHit;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

/// Default token budget for one relayed response.
pub const DEFAULT_MAX_TOKENS: usize = 36_000;

pub const DELIMITER: &str = "--------------------------------";

/// Appended when output is cut to the token budget.
pub const TRUNCATION_NOTICE: &str =
    "\n... [truncated because it exceeds the max tokens limit, try deeper paths]";

/// Estimate token count from text (rough approximation: words / 0.75).
pub fn estimate_tokens(text: &str) -> usize {
    let word_count = text.split_whitespace().count();
    (word_count as f64 / 0.75) as usize
}

/// Formats results and enforces the token budget.
#[derive(Debug, Clone, Copy)]
pub struct Relay {
    max_tokens: usize,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKENS)
    }
}

impl Relay {
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    /// Frame one payload.
    pub fn block<T: Serialize>(&self, address: &PathAddress, payload: &T) -> String {
        let body = serde_json::to_string_pretty(payload)
            .unwrap_or_else(|e| json!({"error": e.to_string()}).to_string());
        format!(
            "{DELIMITER}\nPath: {}\nContent: \n{}\n{DELIMITER}\n",
            address.to_json(),
            body
        )
    }

    /// Frame a batch of navigation results. Failures become error payloads.
    pub fn format_resolved(
        &self,
        results: &[(PathAddress, Result<ResolvedContent, PathNotFound>)],
    ) -> String {
        let text: String = results
            .iter()
            .map(|(address, result)| match result {
                Ok(resolved) => self.block(address, &resolved.content),
                Err(err) => self.block(address, &error_payload(err)),
            })
            .collect();
        self.truncate(&text)
    }

    /// Frame search hits, one block per hit.
    pub fn format_hits(&self, hits: &[SearchHit]) -> String {
        let text: String = hits
            .iter()
            .map(|hit| {
                let payload = json!({
                    "match_kind": hit.match_kind,
                    "page_title": hit.page_title,
                    "excerpt": hit.excerpt,
                });
                self.block(&hit.address, &payload)
            })
            .collect();
        self.truncate(&text)
    }

    /// Cut `text` to the token budget, appending the truncation notice.
    pub fn truncate(&self, text: &str) -> String {
        let tokens = estimate_tokens(text);
        if tokens <= self.max_tokens {
            return text.to_string();
        }

        // Largest word count whose estimate stays within budget.
        let keep_words = (self.max_tokens as f64 * 0.75).floor() as usize;
        let cut = word_boundary(text, keep_words);
        debug!(
            tokens,
            max_tokens = self.max_tokens,
            kept_bytes = cut,
            "Truncating relayed output"
        );
        format!("{}{}", &text[..cut], TRUNCATION_NOTICE)
    }
}

fn error_payload(err: &PathNotFound) -> serde_json::Value {
    json!({
        "error": err.to_string(),
        "failed_step": err.position,
        "valid_prefix": err.valid_prefix(),
    })
}

/// Byte offset just past the `words`-th whitespace-separated word.
fn word_boundary(text: &str, words: usize) -> usize {
    if words == 0 {
        return 0;
    }
    let mut seen = 0;
    let mut in_word = false;
    for (offset, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if in_word {
                seen += 1;
                if seen == words {
                    return offset;
                }
            }
            in_word = false;
        } else {
            in_word = true;
        }
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{SectionSource, TreeBuilder};
    use crate::navigator::Navigator;
    use crate::path;
    use crate::persistence::DocsContext;
    use crate::search::SearchIndex;

    fn context() -> DocsContext {
        let sources = vec![
            SectionSource::new("overview.md", "1 - Overview\n# Overview\n\nWhat it is.\n"),
            SectionSource::new("setup.md", "2 - Setup\n# Setup\n\nInstall it.\n"),
        ];
        let output = TreeBuilder::new("demo").build_sources(sources, None).unwrap();
        DocsContext::from_docs(output.docs).unwrap()
    }

    #[test]
    fn test_estimate_tokens() {
        let text = "The quick brown fox jumps over the lazy dog";
        // 9 words / 0.75 = 12
        assert_eq!(estimate_tokens(text), 12);
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_block_framing() {
        let relay = Relay::default();
        let block = relay.block(&path!["subpages", 0], &"hello");
        assert_eq!(
            block,
            format!("{DELIMITER}\nPath: [\"subpages\",0]\nContent: \n\"hello\"\n{DELIMITER}\n")
        );
    }

    #[test]
    fn test_format_resolved_mixes_errors() {
        let docs = context();
        let results = Navigator::new(&docs).resolve_many(&[
            path!["subpages", 1, "content"],
            path!["subpages", 5],
        ]);
        let text = Relay::default().format_resolved(&results);

        assert!(text.contains("Path: [\"subpages\",1,\"content\"]\nContent: \n\"Install it.\""));
        assert!(text.contains("Path: [\"subpages\",5]"));
        assert!(text.contains("\"valid_prefix\": [\n    \"subpages\"\n  ]"));
        assert_eq!(text.matches(DELIMITER).count(), 4);
    }

    #[test]
    fn test_format_hits() {
        let docs = context();
        let hits: Vec<SearchHit> = SearchIndex::new(&docs).search("setup", true, true).collect();
        let text = Relay::default().format_hits(&hits);
        assert!(text.contains("Path: [\"subpages\",1,\"title\"]"));
        assert!(text.contains("\"match_kind\": \"title\""));
    }

    #[test]
    fn test_truncate_to_budget() {
        let relay = Relay::new(6);
        let text = "one two three four five six seven eight nine ten";
        let cut = relay.truncate(text);

        // 6 tokens keep 4 words.
        assert_eq!(cut, format!("one two three four{}", TRUNCATION_NOTICE));
        assert!(estimate_tokens(cut.trim_end_matches(TRUNCATION_NOTICE)) <= 6);

        let short = "one two";
        assert_eq!(relay.truncate(short), short);
    }

    #[test]
    fn test_word_boundary() {
        assert_eq!(word_boundary("a  bb ccc", 2), 5);
        assert_eq!(word_boundary("a bb", 5), 4);
        assert_eq!(word_boundary("a bb", 0), 0);
    }
}
