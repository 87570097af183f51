// src/predict/features.rs
//! Feature transform: five listing fields → the fixed 11-component vector
//! the regression model was trained on. Order and formulas are part of the
//! model contract.

use serde::Serialize;

use crate::error::RatingError;
use crate::listing::{ListingFields, REFERENCE_YEAR};

pub const FEATURE_COUNT: usize = 11;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "engine_cc",
    "hand",
    "km",
    "price",
    "km_per_year",
    "price_per_cc",
    "price_per_year",
    "normalized_price",
    "log_km",
    "log_price",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// Hard invariants on listing fields, checked before any arithmetic.
pub fn validate(fields: &ListingFields) -> Result<(), RatingError> {
    if fields.engine_cc == 0 {
        return Err(RatingError::InvalidInput("engine_cc must be > 0".into()));
    }
    if !(1..=5).contains(&fields.hand) {
        return Err(RatingError::InvalidInput(format!(
            "hand must be within 1..=5, got {}",
            fields.hand
        )));
    }
    if fields.year > REFERENCE_YEAR {
        return Err(RatingError::InvalidInput(format!(
            "year {} is after {REFERENCE_YEAR}",
            fields.year
        )));
    }
    listing_age(fields.year)?;
    Ok(())
}

// years so far back that the age overflows are rejected, never wrapped
fn listing_age(year: i32) -> Result<i32, RatingError> {
    REFERENCE_YEAR
        .checked_sub(year)
        .ok_or_else(|| RatingError::InvalidInput(format!("year {year} is out of range")))
}

/// Build the feature vector. `max_observed_price` comes from the reference
/// dataset (or its fallback constant) and must be positive.
pub fn transform(
    fields: &ListingFields,
    max_observed_price: f64,
) -> Result<FeatureVector, RatingError> {
    validate(fields)?;
    if !(max_observed_price.is_finite() && max_observed_price > 0.0) {
        return Err(RatingError::InvalidInput(format!(
            "max observed price must be positive, got {max_observed_price}"
        )));
    }

    let age = listing_age(fields.year)?;
    let age_div = f64::from(age.max(1));
    let age = f64::from(age);
    let engine_cc = f64::from(fields.engine_cc);
    let hand = f64::from(fields.hand);
    let km = fields.km as f64;
    let price = fields.price as f64;

    let fv = FeatureVector([
        age,
        engine_cc,
        hand,
        km,
        price,
        km / age_div,
        price / engine_cc,
        price / age_div,
        price / max_observed_price,
        km.ln_1p(),
        price.ln_1p(),
    ]);

    if !fv.is_finite() {
        return Err(RatingError::InvalidInput(
            "feature vector has non-finite components".into(),
        ));
    }
    Ok(fv)
}
