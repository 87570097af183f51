// src/extract/mod.rs
//! Field extraction: normalized listing text → per-field resolutions.
//!
//! Each field is resolved on its own from the pattern table. The first
//! matching pattern wins, its capture is stripped of group separators and
//! parsed, and a value outside the field's bounds is dropped (it does not
//! fall through to later patterns).

pub mod classify;
pub mod fetch;
pub mod normalize;
pub mod patterns;

use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::listing::FieldName;
use crate::extract::normalize::{normalize_text, visible_text};
use crate::extract::patterns::{FieldRules, PatternTable};

/// Rule id recorded for values taken from the DOM class fallback.
pub const DOM_CLASS_RULE: &str = "dom_class";
/// Rule id recorded for an assumed ownership count.
pub const DEFAULT_RULE: &str = "default";

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Found in the listing.
    Matched,
    /// Filled in by the table's default policy (hand only).
    Assumed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub value: u64,
    pub rule_id: String,
    pub provenance: Provenance,
}

/// Outcome of running every field's rules over one listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldResolutions {
    slots: BTreeMap<FieldName, Resolved>,
}

impl FieldResolutions {
    pub fn get(&self, field: FieldName) -> Option<&Resolved> {
        self.slots.get(&field)
    }

    /// Value found in the listing itself (assumed values excluded).
    pub fn matched(&self, field: FieldName) -> Option<u64> {
        self.slots
            .get(&field)
            .filter(|r| r.provenance == Provenance::Matched)
            .map(|r| r.value)
    }

    /// Value including any assumed default.
    pub fn value(&self, field: FieldName) -> Option<u64> {
        self.slots.get(&field).map(|r| r.value)
    }

    pub fn matched_count(&self) -> usize {
        self.slots
            .values()
            .filter(|r| r.provenance == Provenance::Matched)
            .count()
    }

    /// `field:rule` markers for every resolved field, for logs and debugging.
    pub fn trace(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|(f, r)| format!("{}:{}", f, r.rule_id))
            .collect()
    }

    fn insert(&mut self, field: FieldName, r: Resolved) {
        self.slots.insert(field, r);
    }
}

/// Strip group separators and parse. Anything that is not a plain
/// non-negative integer after stripping is unresolved.
pub fn parse_grouped(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok()
}

/// Digits of the first element whose class attribute contains `keyword`.
fn dom_class_digits(doc: &Html, keyword: &str) -> Option<String> {
    let sel = Selector::parse("[class]").ok()?;
    let kw = keyword.to_lowercase();
    let el = doc.select(&sel).find(|el| {
        el.value()
            .attr("class")
            .is_some_and(|c| c.to_lowercase().contains(&kw))
    })?;
    let digits: String = el
        .text()
        .flat_map(str::chars)
        .filter(char::is_ascii_digit)
        .collect();
    (!digits.is_empty()).then_some(digits)
}

/// Applies a compiled `PatternTable` to listing pages.
#[derive(Debug)]
pub struct FieldExtractor {
    table: PatternTable,
}

impl FieldExtractor {
    pub fn new(table: PatternTable) -> Self {
        Self { table }
    }

    /// Extractor over the table compiled into the binary.
    pub fn with_embedded_table() -> anyhow::Result<Self> {
        Ok(Self::new(PatternTable::embedded()?))
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Full page path: HTML → visible text → normalize → extract, with the DOM
    /// class fallback available.
    pub fn extract_html(&self, html: &str) -> FieldResolutions {
        let doc = Html::parse_document(html);
        let text = normalize_text(&visible_text(&doc));
        self.extract_normalized(&text, Some(&doc))
    }

    /// Plain listing text (no markup). Normalizes first; no DOM fallback.
    pub fn extract_text(&self, text: &str) -> FieldResolutions {
        self.extract_normalized(&normalize_text(text), None)
    }

    fn extract_normalized(&self, text: &str, doc: Option<&Html>) -> FieldResolutions {
        let mut out = FieldResolutions::default();
        for field in FieldName::ALL {
            if let Some(r) = resolve_field(self.table.rules(field), text, doc) {
                debug!(field = %field, rule = %r.rule_id, value = r.value, "field resolved");
                out.insert(field, r);
            }
        }

        if out.get(FieldName::Hand).is_none() {
            if let Some(d) = self.table.hand_default {
                debug!(field = "hand", value = d, "hand not found; assuming default");
                out.insert(
                    FieldName::Hand,
                    Resolved {
                        value: u64::from(d),
                        rule_id: DEFAULT_RULE.to_string(),
                        provenance: Provenance::Assumed,
                    },
                );
            }
        }
        out
    }
}

fn resolve_field(rules: &FieldRules, text: &str, doc: Option<&Html>) -> Option<Resolved> {
    let (rule_id, raw) = match rules.first_match(text) {
        Some(hit) => (hit.rule_id.to_string(), hit.raw.to_string()),
        None => {
            let kw = rules.dom_class_keyword.as_deref()?;
            (DOM_CLASS_RULE.to_string(), dom_class_digits(doc?, kw)?)
        }
    };

    let Some(value) = parse_grouped(&raw) else {
        debug!(field = %rules.field, rule = %rule_id, raw = %raw, "candidate not numeric");
        return None;
    };
    if !rules.in_bounds(value) {
        debug!(
            field = %rules.field,
            rule = %rule_id,
            value,
            min = ?rules.min,
            max = ?rules.max,
            "candidate outside bounds"
        );
        return None;
    }

    Some(Resolved {
        value,
        rule_id,
        provenance: Provenance::Matched,
    })
}
