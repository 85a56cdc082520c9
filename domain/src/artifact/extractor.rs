//! Code block extraction from model responses.
//!
//! Model replies are free-form text in which source files appear as fenced
//! blocks:
//!
//! ````text
//! Here is the page:
//!
//! ```html
//! <h1>Clock</h1>
//! ```
//! ````
//!
//! [`extract_code_blocks`] splits a reply into the ordered list of
//! `(filename, content)` pairs it contains plus the remaining prose. The
//! function is pure; applying the result to an artifact store is the
//! caller's job. Blocks are returned in fence order, duplicates included, so
//! applying them one after another gives last-wins semantics.

use super::file_kind::{MARKUP_FILE, SCRIPT_FILE, STYLESHEET_FILE};
use std::collections::BTreeMap;

/// File name used for fenced blocks that carry no hint at all
pub const DEFAULT_FILENAME: &str = "snippet.txt";

/// One fenced block resolved to a target file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Target file name
    pub filename: String,
    /// Info string on the opening fence, if any
    pub hint: Option<String>,
    /// Block body with surrounding blank lines removed
    pub content: String,
}

/// Result of splitting a message into code and prose
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extraction {
    pub blocks: Vec<CodeBlock>,
    pub prose: String,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// `(filename, content)` pairs in fence order
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.blocks
            .iter()
            .map(|b| (b.filename.as_str(), b.content.as_str()))
            .collect()
    }

    /// Final content per file after applying every block in order
    pub fn files(&self) -> BTreeMap<String, String> {
        let mut files = BTreeMap::new();
        for block in &self.blocks {
            files.insert(block.filename.clone(), block.content.clone());
        }
        files
    }
}

#[derive(Debug)]
struct Fence {
    marker: char,
    len: usize,
    info: Option<String>,
}

/// Split `text` into fenced code blocks and prose.
///
/// An unterminated fence makes the whole message prose: nothing is
/// extracted and the text is passed through verbatim.
pub fn extract_code_blocks(text: &str) -> Extraction {
    let mut blocks = Vec::new();
    let mut prose_lines: Vec<&str> = Vec::new();
    let mut open: Option<(Fence, Vec<&str>)> = None;
    let mut saw_fence = false;

    for line in text.lines() {
        match open.take() {
            Some((fence, mut body)) => {
                if is_closing_fence(line, &fence) {
                    if let Some(block) = finish_block(&fence, &body) {
                        blocks.push(block);
                    }
                } else {
                    body.push(line);
                    open = Some((fence, body));
                }
            }
            None => match opening_fence(line) {
                Some(fence) => {
                    saw_fence = true;
                    open = Some((fence, Vec::new()));
                }
                None => prose_lines.push(line),
            },
        }
    }

    if open.is_some() || !saw_fence {
        return Extraction {
            blocks: Vec::new(),
            prose: text.to_string(),
        };
    }

    Extraction {
        blocks,
        prose: trim_blank_lines(&prose_lines),
    }
}

/// Map a fence hint to a target file name.
///
/// Language names for the three previewable kinds map to their canonical
/// files; any other hint is used literally; no hint gives
/// [`DEFAULT_FILENAME`].
pub fn resolve_filename(hint: Option<&str>) -> String {
    let Some(info) = hint.map(str::trim).filter(|h| !h.is_empty()) else {
        return DEFAULT_FILENAME.to_string();
    };

    // `title="app.js"` style attributes carry the name after the `=`
    let tokens = || {
        info.split_whitespace().map(|t| {
            t.rsplit_once('=')
                .map_or(t, |(_, value)| value)
                .trim_matches(|c| c == '"' || c == '\'')
        })
    };
    let token = tokens()
        .find(|t| looks_like_filename(t))
        .or_else(|| tokens().next())
        .unwrap_or(info);

    match token.to_ascii_lowercase().as_str() {
        "html" | "htm" => MARKUP_FILE.to_string(),
        "css" => STYLESHEET_FILE.to_string(),
        "js" | "javascript" => SCRIPT_FILE.to_string(),
        _ => token.to_string(),
    }
}

fn looks_like_filename(token: &str) -> bool {
    match token.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && !ext.is_empty(),
        None => false,
    }
}

fn opening_fence(line: &str) -> Option<Fence> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }

    let info = trimmed[len * marker.len_utf8()..].trim();
    // A backtick fence cannot carry backticks in its info string
    if marker == '`' && info.contains('`') {
        return None;
    }

    Some(Fence {
        marker,
        len,
        info: (!info.is_empty()).then(|| info.to_string()),
    })
}

fn is_closing_fence(line: &str, fence: &Fence) -> bool {
    let trimmed = line.trim();
    let len = trimmed.chars().take_while(|c| *c == fence.marker).count();
    len >= fence.len && trimmed.chars().all(|c| c == fence.marker)
}

fn finish_block(fence: &Fence, body: &[&str]) -> Option<CodeBlock> {
    let content = trim_blank_lines(body);
    if content.trim().is_empty() {
        return None;
    }
    Some(CodeBlock {
        filename: resolve_filename(fence.info.as_deref()),
        hint: fence.info.clone(),
        content,
    })
}

fn trim_blank_lines(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}
