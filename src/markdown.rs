//! Markdown to nested mapping conversion.
//!
//! Headings become keys and the blocks under a heading become its value.
//! Deeper headings nest. A heading whose body is a single paragraph maps to
//! a string, several blocks map to a sequence, and bullet or numbered
//! lists map to sequences (nested lists become nested sequences).
//!
//! ```text
//! # Setup                      {"Setup": {
//! Intro text.                    "_text": "Intro text.",
//! ## Install          ==>        "Install": ["pip", "cargo"]
//! - pip                        }}
//! - cargo
//! ```

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Key holding text that precedes the first heading at a nesting level.
pub const INTRO_KEY: &str = "_text";

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)(?:\s+#+)?\s*$").expect("heading pattern"));

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)(?:[-*+]|\d+[.)])\s+(.*)$").expect("list item pattern")
});

/// A top-level markdown block.
#[derive(Debug, Clone, PartialEq)]
enum Block {
    Heading { level: usize, text: String },
    Text(String),
    List(Vec<ListItem>),
}

#[derive(Debug, Clone, PartialEq)]
struct ListItem {
    indent: usize,
    text: String,
}

/// Convert a markdown document into a nested JSON value.
pub fn markdown_to_value(markdown: &str) -> Value {
    let blocks = tokenize(markdown);
    nest(&blocks)
}

fn tokenize(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut list: Vec<ListItem> = Vec::new();
    let mut fence: Option<(String, Vec<&str>)> = None;

    fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<Block>) {
        if !paragraph.is_empty() {
            blocks.push(Block::Text(paragraph.join("\n")));
            paragraph.clear();
        }
    }

    fn flush_list(list: &mut Vec<ListItem>, blocks: &mut Vec<Block>) {
        if !list.is_empty() {
            blocks.push(Block::List(std::mem::take(list)));
        }
    }

    for line in markdown.lines() {
        let trimmed = line.trim_start();

        if let Some((marker, body)) = fence.as_mut() {
            body.push(line);
            if trimmed.starts_with(marker.as_str()) {
                blocks.push(Block::Text(body.join("\n")));
                fence = None;
            }
            continue;
        }

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            flush_paragraph(&mut paragraph, &mut blocks);
            flush_list(&mut list, &mut blocks);
            fence = Some((trimmed[..3].to_string(), vec![line]));
            continue;
        }

        if trimmed.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            flush_list(&mut list, &mut blocks);
            continue;
        }

        if let Some(caps) = HEADING.captures(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            flush_list(&mut list, &mut blocks);
            blocks.push(Block::Heading {
                level: caps[1].len(),
                text: caps[2].trim().to_string(),
            });
            continue;
        }

        if let Some(caps) = LIST_ITEM.captures(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            list.push(ListItem {
                indent: caps[1].len(),
                text: caps[2].trim_end().to_string(),
            });
            continue;
        }

        // Indented lines continue the last list item.
        if !list.is_empty() && line.starts_with(char::is_whitespace) {
            if let Some(last) = list.last_mut() {
                last.text.push(' ');
                last.text.push_str(line.trim());
            }
            continue;
        }

        flush_list(&mut list, &mut blocks);
        paragraph.push(line.trim_end());
    }

    // Unterminated fence keeps its body.
    if let Some((_, body)) = fence {
        blocks.push(Block::Text(body.join("\n")));
    }
    flush_paragraph(&mut paragraph, &mut blocks);
    flush_list(&mut list, &mut blocks);

    blocks
}

fn nest(blocks: &[Block]) -> Value {
    let min_level = blocks
        .iter()
        .filter_map(|b| match b {
            Block::Heading { level, .. } => Some(*level),
            _ => None,
        })
        .min();

    let Some(level) = min_level else {
        return text_value(blocks);
    };

    let mut map = Map::new();
    let mut current: Option<String> = None;
    let mut start = 0;

    for (i, block) in blocks.iter().enumerate() {
        if let Block::Heading { level: l, text } = block {
            if *l == level {
                close_section(&mut map, current.take(), &blocks[start..i]);
                current = Some(text.clone());
                start = i + 1;
            }
        }
    }
    close_section(&mut map, current, &blocks[start..]);

    Value::Object(map)
}

fn close_section(map: &mut Map<String, Value>, heading: Option<String>, body: &[Block]) {
    match heading {
        Some(text) => {
            let key = unique_key(map, text);
            map.insert(key, nest(body));
        }
        None if !body.is_empty() => {
            map.insert(INTRO_KEY.to_string(), nest(body));
        }
        None => {}
    }
}

/// Repeated headings at one level get a numeric suffix instead of
/// overwriting the earlier section.
fn unique_key(map: &Map<String, Value>, text: String) -> String {
    if !map.contains_key(&text) {
        return text;
    }
    (2..)
        .map(|n| format!("{} ({})", text, n))
        .find(|candidate| !map.contains_key(candidate))
        .unwrap_or(text)
}

fn text_value(blocks: &[Block]) -> Value {
    let mut values: Vec<Value> = blocks.iter().map(block_value).collect();
    match values.len() {
        0 => Value::Null,
        1 => values.remove(0),
        _ => Value::Array(values),
    }
}

fn block_value(block: &Block) -> Value {
    match block {
        Block::Text(text) => Value::String(text.clone()),
        Block::List(items) => list_value(items),
        Block::Heading { text, .. } => Value::String(text.clone()),
    }
}

/// Items indented deeper than the first item form a nested sequence placed
/// right after their parent item.
fn list_value(items: &[ListItem]) -> Value {
    let Some(first) = items.first() else {
        return Value::Array(Vec::new());
    };
    let base = first.indent;
    let mut values = Vec::new();
    let mut i = 0;

    while i < items.len() {
        if items[i].indent <= base {
            values.push(Value::String(items[i].text.clone()));
            i += 1;
        } else {
            let end = items[i..]
                .iter()
                .position(|item| item.indent <= base)
                .map(|offset| i + offset)
                .unwrap_or(items.len());
            values.push(list_value(&items[i..end]));
            i = end;
        }
    }

    Value::Array(values)
}
