//! Minimal HTML-to-text helpers for the web tools.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|head)\b[^>]*>.*?</(script|style|noscript|head)>")
        .unwrap()
});
static BLOCK_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|li|h[1-6]|tr|section|article|pre)>").unwrap()
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

/// Decode the handful of entities that matter for readability.
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Strip markup, keeping one line per block element and dropping blank lines.
pub fn to_text(html: &str) -> String {
    let without_code = SCRIPT_STYLE.replace_all(html, " ");
    let with_breaks = BLOCK_END.replace_all(&without_code, "\n");
    let stripped = TAG.replace_all(&with_breaks, "");
    decode_entities(&stripped)
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
