// src/extract/patterns.rs
//! Field pattern table: config schema (TOML), regex compilation, and the
//! per-field match/bound helpers the extractor runs.

use anyhow::{anyhow, bail, Context};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::listing::FieldName;

/// Table shipped with the binary; used when no override path is configured.
pub const EMBEDDED_PATTERNS: &str = include_str!("../../config/patterns.toml");

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PatternTableCfg {
    pub meta: MetaCfg,
    pub fields: BTreeMap<String, FieldCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaCfg {
    pub version: String,
    /// Ownership count assumed when the hand pattern finds nothing.
    /// Absent → hand stays unresolved.
    #[serde(default)]
    pub hand_default: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldCfg {
    #[serde(default)]
    pub min: Option<u64>,
    #[serde(default)]
    pub max: Option<u64>,
    /// Last-resort lookup: first element whose class attribute contains this keyword.
    #[serde(default)]
    pub dom_class_keyword: Option<String>,
    pub patterns: Vec<PatternCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatternCfg {
    pub id: String,
    pub regex: String,
}

/* ----------------------------
Compiled table
---------------------------- */

#[derive(Debug)]
struct CompiledPattern {
    id: String,
    re: Regex,
}

/// Ordered patterns plus the sanity bounds for one field.
#[derive(Debug)]
pub struct FieldRules {
    pub field: FieldName,
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub dom_class_keyword: Option<String>,
    patterns: Vec<CompiledPattern>,
}

/// A syntactic pattern hit, before the bound check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternHit<'a> {
    pub rule_id: &'a str,
    pub raw: &'a str,
}

impl FieldRules {
    /// First pattern (in table order) that matches wins.
    pub fn first_match<'a>(&'a self, text: &'a str) -> Option<PatternHit<'a>> {
        self.patterns.iter().find_map(|p| {
            let caps = p.re.captures(text)?;
            let m = caps.name("value").or_else(|| caps.get(1))?;
            Some(PatternHit {
                rule_id: p.id.as_str(),
                raw: m.as_str(),
            })
        })
    }

    pub fn in_bounds(&self, v: u64) -> bool {
        self.min.is_none_or(|lo| v >= lo) && self.max.is_none_or(|hi| v <= hi)
    }

    pub fn pattern_ids(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.id.as_str())
    }
}

/// The whole compiled table, one `FieldRules` per field.
#[derive(Debug)]
pub struct PatternTable {
    pub version: String,
    pub hand_default: Option<u8>,
    rules: BTreeMap<FieldName, FieldRules>,
}

fn parse_field_name(s: &str) -> Option<FieldName> {
    FieldName::ALL.into_iter().find(|f| f.as_str() == s)
}

impl PatternTable {
    /// Built-in table.
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_toml_str(EMBEDDED_PATTERNS).context("compiling embedded pattern table")
    }

    /// Load and compile a table from disk.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pattern table from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("compiling pattern table {}", path.display()))
    }

    /// Load from a TOML string. Every field must be configured and every regex
    /// must compile with at least one capture group.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: PatternTableCfg = toml::from_str(toml_str)?;

        let mut rules = BTreeMap::new();
        for (name, fc) in cfg.fields {
            let field =
                parse_field_name(&name).ok_or_else(|| anyhow!("unknown field `{name}`"))?;
            if fc.patterns.is_empty() && fc.dom_class_keyword.is_none() {
                bail!("field `{name}` has no patterns");
            }
            if let (Some(lo), Some(hi)) = (fc.min, fc.max) {
                if lo > hi {
                    bail!("field `{name}` has min {lo} > max {hi}");
                }
            }

            let patterns = fc
                .patterns
                .into_iter()
                .map(|p| {
                    let re = Regex::new(&p.regex)
                        .map_err(|e| anyhow!("pattern `{name}:{}` regex error: {e}", p.id))?;
                    if re.captures_len() < 2 {
                        bail!("pattern `{name}:{}` has no capture group", p.id);
                    }
                    Ok(CompiledPattern { id: p.id, re })
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            rules.insert(
                field,
                FieldRules {
                    field,
                    min: fc.min,
                    max: fc.max,
                    dom_class_keyword: fc.dom_class_keyword,
                    patterns,
                },
            );
        }

        for f in FieldName::ALL {
            if !rules.contains_key(&f) {
                bail!("pattern table is missing field `{f}`");
            }
        }

        if let Some(d) = cfg.meta.hand_default {
            let hand = &rules[&FieldName::Hand];
            if !hand.in_bounds(u64::from(d)) {
                bail!("hand_default {d} is outside the hand bounds");
            }
        }

        Ok(Self {
            version: cfg.meta.version,
            hand_default: cfg.meta.hand_default,
            rules,
        })
    }

    pub fn rules(&self, field: FieldName) -> &FieldRules {
        // Presence of every field is checked in `from_toml_str`.
        &self.rules[&field]
    }
}
