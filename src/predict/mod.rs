// src/predict/mod.rs
//! Rating prediction: feature vector → model → clamped, rounded rating.

pub mod dataset;
pub mod features;
pub mod model;

use metrics::counter;
use serde::Serialize;
use tracing::warn;

use crate::error::RatingError;
use crate::predict::features::FeatureVector;
use crate::predict::model::DynModel;

pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingResult {
    pub predicted_rating: f64,
}

/// Clamp to [0, 10] and round to 2 decimals. NaN/∞ are model failures, not
/// values to clamp.
pub fn finalize_rating(raw: f64) -> Result<f64, RatingError> {
    if !raw.is_finite() {
        return Err(RatingError::PredictionFailed(format!(
            "model returned non-finite output {raw}"
        )));
    }
    let clamped = raw.clamp(RATING_MIN, RATING_MAX);
    Ok((clamped * 100.0).round() / 100.0)
}

#[derive(Clone)]
pub struct RatingPredictor {
    model: DynModel,
}

impl RatingPredictor {
    pub fn new(model: DynModel) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn predict(&self, fv: &FeatureVector) -> Result<RatingResult, RatingError> {
        let raw = self
            .model
            .predict(fv.as_slice())
            .map_err(|e| RatingError::PredictionFailed(e.to_string()))
            .and_then(finalize_rating);

        match raw {
            Ok(predicted_rating) => {
                counter!("predictions_total").increment(1);
                Ok(RatingResult { predicted_rating })
            }
            Err(e) => {
                warn!(error = %e, model = self.model.name(), "prediction failed");
                counter!("prediction_failures_total").increment(1);
                Err(e)
            }
        }
    }
}
