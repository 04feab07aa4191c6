//! Text Normalization
//!
//! Strips markdown markup and collapses whitespace before text is spoken
//! or cached.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Ordered (pattern, replacement) rules; each one only removes characters
    static ref MARKDOWN_RULES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"<[^>]+>").unwrap(), ""),
        (Regex::new(r"```[A-Za-z0-9_+-]*").unwrap(), ""),
        (Regex::new(r"`([^`]*)`").unwrap(), "${1}"),
        (Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap(), "${1}"),
        (Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap(), "${1}"),
        (Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]+").unwrap(), ""),
        (Regex::new(r"(?m)^[ \t]*(?:[-*_=][ \t]*){3,}$").unwrap(), ""),
        (Regex::new(r"(?m)^[ \t]*>+[ \t]?").unwrap(), ""),
        (Regex::new(r"(?m)^[ \t]*(?:[-*+]|\d+\.)[ \t]+").unwrap(), ""),
        (Regex::new(r"\*\*(.+?)\*\*").unwrap(), "${1}"),
        (Regex::new(r"__(.+?)__").unwrap(), "${1}"),
        (Regex::new(r"~~(.+?)~~").unwrap(), "${1}"),
        (Regex::new(r"\*([^*\n]+)\*").unwrap(), "${1}"),
        (Regex::new(r"\b_([^_\n]+)_\b").unwrap(), "${1}"),
        // Unpaired emphasis runs left outside words
        (Regex::new(r"(?:^|\s)[*_~]{2,}(?:\s|$)").unwrap(), " "),
        (Regex::new(r"^[\s*_~]+$").unwrap(), ""),
    ];
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// One stripping pass: markdown rules, whitespace collapse, trim
fn strip_once(text: &str) -> String {
    let mut result = text.to_string();
    for (pattern, replacement) in MARKDOWN_RULES.iter() {
        result = pattern.replace_all(&result, *replacement).into_owned();
    }
    WHITESPACE.replace_all(&result, " ").trim().to_string()
}

/// Normalize text for speech and caching
///
/// Passes repeat until the text stops changing, so the output is a fixed
/// point: `normalize(&normalize(x)) == normalize(x)`. Every pass either
/// removes characters or turns non-space whitespace into spaces, so the
/// loop terminates.
pub fn normalize(text: &str) -> String {
    let mut current = strip_once(text);
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Like [`normalize`], but absent input yields an empty string
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}
