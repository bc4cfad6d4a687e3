//! Block parser.
//!
//! A file is split into candidate sections: the whole (trimmed) file first,
//! then every numbered section starting at a `## <digits>.` line and running
//! up to the next such line or the end of the file. A candidate becomes a
//! [`Block`] when it has a header line and at least one body line.

use crate::types::Block;
use regex::Regex;
use std::sync::OnceLock;

fn section_pattern() -> &'static Regex {
    static SECTION: OnceLock<Regex> = OnceLock::new();
    SECTION.get_or_init(|| Regex::new(r"(?m)^## \d+\.").expect("section pattern is valid"))
}

/// `{{name}}`, whitespace allowed inside the braces.
pub(crate) fn placeholder_pattern() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([a-zA-Z]\w*)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Parse file content into its blocks.
///
/// Never fails; content with fewer than two lines yields no blocks.
///
/// # Example
/// ```
/// use tabula_template::parse_blocks;
///
/// let blocks = parse_blocks("# Plan\n## 1. Outline\nSummarize {{notes}}\n## 2. Draft\nWrite it");
/// assert_eq!(blocks.len(), 3);
/// assert_eq!(blocks[1].header, "## 1. Outline");
/// assert_eq!(blocks[1].parameter_names, vec!["notes"]);
/// ```
pub fn parse_blocks(content: &str) -> Vec<Block> {
    let content = content.trim();

    let starts: Vec<usize> = section_pattern()
        .find_iter(content)
        .map(|m| m.start())
        .collect();

    let mut candidates = Vec::with_capacity(starts.len() + 1);
    candidates.push(content);
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(content.len());
        candidates.push(content[start..end].trim());
    }

    let blocks: Vec<Block> = candidates.into_iter().filter_map(parse_section).collect();
    tracing::trace!(
        sections = starts.len(),
        blocks = blocks.len(),
        "Parsed template blocks"
    );
    blocks
}

fn parse_section(section: &str) -> Option<Block> {
    let mut lines = section.trim().lines();
    let header = lines.next()?.trim();
    let rest: Vec<&str> = lines.collect();
    if rest.is_empty() {
        return None;
    }

    let body = rest.join("\n").trim().to_string();
    let parameter_names = extract_parameters(&body);

    Some(Block {
        header: header.to_string(),
        body,
        parameter_names,
    })
}

/// Placeholder names in `text`, in order of appearance, duplicates kept.
pub fn extract_parameters(text: &str) -> Vec<String> {
    placeholder_pattern()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}
