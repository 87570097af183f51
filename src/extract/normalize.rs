// src/extract/normalize.rs
//! Page text normalization: HTML → visible text → a flat string the field
//! patterns can run against.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Elements whose text content never renders.
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Bidirectional control characters (LRM/RLM, embeddings, isolates, ALM).
fn is_bidi_control(c: char) -> bool {
    matches!(
        c,
        '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}' | '\u{061C}'
    )
}

/// Visible text of an HTML document, text nodes joined by single spaces.
pub fn visible_text(doc: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if hidden {
            continue;
        }
        let t = text.trim();
        if !t.is_empty() {
            parts.push(t);
        }
    }
    parts.join(" ")
}

/// Normalize already-extracted page text.
///
/// Order matters: direction marks go first so they cannot split a
/// whitespace run, and the period→comma swap runs last. Pages in this
/// locale use `.` as a thousands separator, and the numeric patterns
/// only know `,`.
pub fn normalize_text(s: &str) -> String {
    // 1) Direction marks
    let out: String = s.chars().filter(|c| !is_bidi_control(*c)).collect();

    // 2) Collapse whitespace (Unicode-aware, covers NBSP)
    let out = RE_WS.replace_all(&out, " ");
    let out = out.trim();

    // 3) Gershayim/geresh and typographic quotes to ASCII
    let out = out
        .replace(['\u{05F4}', '\u{201C}', '\u{201D}', '\u{201E}'], "\"")
        .replace(['\u{05F3}', '\u{2018}', '\u{2019}'], "'");

    // 4) Periods are digit-group separators here
    out.replace('.', ",")
}

/// Full normalizer: raw HTML in, normalized text out. Never fails; broken
/// markup just yields less text.
pub fn normalize_html(html: &str) -> String {
    let doc = Html::parse_document(html);
    normalize_text(&visible_text(&doc))
}
