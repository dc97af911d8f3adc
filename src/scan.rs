//! Naive prefix/terminator token scanning for resource references.
//!
//! This is plain text scanning, not CSS or HTML parsing: a `url(` inside a
//! comment or a string literal is reported like any other occurrence.

/// Prefix introducing a resource reference in CSS text
pub const CSS_URL_PREFIX: &str = "url(";
/// Characters ending a CSS `url(` value
pub const CSS_URL_TERMINATORS: &[char] = &[')'];

/// Prefix introducing a resource reference in HTML text
pub const HTML_SRC_PREFIX: &str = "src=";
/// Characters ending an HTML `src=` value
pub const HTML_SRC_TERMINATORS: &[char] = &[' ', '>', '\t'];

/// A single value found between a prefix and the next terminator.
///
/// `start` is the byte offset of the prefix, `end` the byte offset one past the
/// last character of `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    pub start: usize,
    pub end: usize,
    pub value: String,
}

/// Scan `text` left to right for `prefix` and collect the text up to the first
/// terminator character (or end of input) after each occurrence.
///
/// Matches never overlap: each search resumes right after the previous value.
pub fn scan_tokens(text: &str, prefix: &str, terminators: &[char]) -> Vec<TokenMatch> {
    let mut found = Vec::new();
    if prefix.is_empty() {
        return found;
    }

    let mut cursor = 0;
    while let Some(rel) = text[cursor..].find(prefix) {
        let start = cursor + rel;
        let value_start = start + prefix.len();
        let rest = &text[value_start..];
        let value_len = rest.find(terminators).unwrap_or(rest.len());
        let end = value_start + value_len;

        found.push(TokenMatch {
            start,
            end,
            value: rest[..value_len].to_string(),
        });
        cursor = end;
    }

    found
}

/// Remove every single and double quote character.
pub fn strip_quotes(value: &str) -> String {
    value.chars().filter(|c| *c != '"' && *c != '\'').collect()
}

/// URLs referenced through `url(...)` in CSS text, quotes stripped.
pub fn css_urls(css: &str) -> Vec<String> {
    scan_tokens(css, CSS_URL_PREFIX, CSS_URL_TERMINATORS)
        .iter()
        .map(|m| strip_quotes(&m.value))
        .collect()
}

/// URLs referenced through `src=` in HTML text, quotes stripped.
pub fn html_srcs(html: &str) -> Vec<String> {
    scan_tokens(html, HTML_SRC_PREFIX, HTML_SRC_TERMINATORS)
        .iter()
        .map(|m| strip_quotes(&m.value))
        .collect()
}
