// src/listing.rs
//! Listing field types shared by the extractor, the classifier and the predictor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed epoch the trained model assumes for `age`. Never derived from the clock.
pub const REFERENCE_YEAR: i32 = 2025;

/// The five semantic fields of a motorcycle listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Price,
    Year,
    Km,
    EngineCc,
    Hand,
}

impl FieldName {
    /// Resolution order used by the extractor and in traces.
    pub const ALL: [FieldName; 5] = [
        FieldName::Price,
        FieldName::Year,
        FieldName::Km,
        FieldName::EngineCc,
        FieldName::Hand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Price => "price",
            FieldName::Year => "year",
            FieldName::Km => "km",
            FieldName::EngineCc => "engine_cc",
            FieldName::Hand => "hand",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved listing, ready for the feature transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFields {
    pub year: i32,
    pub engine_cc: u32,
    pub hand: u8,
    pub km: u64,
    pub price: u64,
}

/// Subset of fields resolved from a listing; unresolved ones stay `None`
/// and are left out of the JSON form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_cc: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub km: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
}

impl PartialFields {
    pub fn resolved_count(&self) -> usize {
        self.resolved().len()
    }

    /// Names of the populated fields, in `FieldName::ALL` order.
    pub fn resolved(&self) -> Vec<FieldName> {
        FieldName::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_some())
            .collect()
    }

    /// Raw value of a field, widened to u64.
    pub fn get(&self, field: FieldName) -> Option<u64> {
        match field {
            FieldName::Price => self.price,
            FieldName::Year => self.year.and_then(|y| u64::try_from(y).ok()),
            FieldName::Km => self.km,
            FieldName::EngineCc => self.engine_cc.map(u64::from),
            FieldName::Hand => self.hand.map(u64::from),
        }
    }
}

impl From<ListingFields> for PartialFields {
    fn from(f: ListingFields) -> Self {
        Self {
            year: Some(f.year),
            engine_cc: Some(f.engine_cc),
            hand: Some(f.hand),
            km: Some(f.km),
            price: Some(f.price),
        }
    }
}
