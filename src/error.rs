// src/error.rs
use thiserror::Error;

/// Request-level failures. None of these is fatal to the serving process.
#[derive(Debug, Error)]
pub enum RatingError {
    /// Network/timeout/status failure reaching the listing URL.
    #[error("failed to fetch listing: {0}")]
    Fetch(String),

    /// Extraction resolved nothing usable.
    #[error("no valid fields found; try manual entry")]
    NoFieldsFound,

    /// A user-supplied or resolved field breaks a hard invariant.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The regression model rejected the feature vector or returned garbage.
    #[error("prediction failed: {0}")]
    PredictionFailed(String),
}

impl RatingError {
    /// Stable machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            RatingError::Fetch(_) => "fetch_error",
            RatingError::NoFieldsFound => "no_fields_found",
            RatingError::InvalidInput(_) => "invalid_input",
            RatingError::PredictionFailed(_) => "prediction_failed",
        }
    }
}

impl From<reqwest::Error> for RatingError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RatingError::Fetch(format!("timed out: {e}"))
        } else {
            RatingError::Fetch(e.to_string())
        }
    }
}
