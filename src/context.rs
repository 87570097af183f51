// src/context.rs
//! Application context: the read-only pieces (pattern table, model, reference
//! price, fetcher) built once at startup and shared by every request.

use anyhow::Context as _;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::RatingError;
use crate::extract::classify::{classify, ExtractionOutcome};
use crate::extract::fetch::{parse_listing_url, HttpFetcher, PageFetcher};
use crate::extract::FieldExtractor;
use crate::listing::{ListingFields, PartialFields};
use crate::predict::dataset::max_observed_price;
use crate::predict::features::transform;
use crate::predict::model::load_model;
use crate::predict::{RatingPredictor, RatingResult};

/// Short stable id for a URL so logs never carry the raw listing address.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Result of scraping a listing and rating it in one go.
#[derive(Debug, Clone, PartialEq)]
pub enum RateOutcome {
    Rated {
        fields: ListingFields,
        hand_assumed: bool,
        rating: RatingResult,
    },
    /// Not enough fields to predict; hand back for manual completion.
    Partial(PartialFields),
}

pub struct AppContext {
    extractor: FieldExtractor,
    predictor: RatingPredictor,
    fetcher: Arc<dyn PageFetcher>,
    max_observed_price: f64,
}

impl AppContext {
    pub fn new(
        extractor: FieldExtractor,
        predictor: RatingPredictor,
        fetcher: Arc<dyn PageFetcher>,
        max_observed_price: f64,
    ) -> Self {
        Self {
            extractor,
            predictor,
            fetcher,
            max_observed_price,
        }
    }

    /// Build everything from config. Pattern table and model must load;
    /// the dataset may fall back.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let table = cfg.load_pattern_table()?;
        let model = load_model(cfg.model_path())?;
        let fetcher =
            HttpFetcher::new(&cfg.user_agent, cfg.fetch_timeout).context("building http client")?;
        let max_price = max_observed_price(&cfg.dataset_path);

        info!(
            patterns = %table.version,
            model = model.name(),
            max_observed_price = max_price,
            fetch_timeout_secs = cfg.fetch_timeout.as_secs(),
            "app context ready"
        );

        Ok(Self::new(
            FieldExtractor::new(table),
            RatingPredictor::new(model),
            Arc::new(fetcher),
            max_price,
        ))
    }

    pub fn max_observed_price(&self) -> f64 {
        self.max_observed_price
    }

    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    /// Extract + classify an already-fetched page.
    pub fn extract_html(&self, html: &str) -> ExtractionOutcome {
        let res = self.extractor.extract_html(html);
        let outcome = classify(&res);
        debug!(outcome = outcome.label(), trace = ?res.trace(), "listing classified");
        counter!("extract_outcome_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    /// Fetch `url` and extract its fields. `Ok` is Complete or Partial;
    /// nothing found is `NoFieldsFound`.
    pub async fn extract_fields(&self, url: &str) -> Result<ExtractionOutcome, RatingError> {
        let url = parse_listing_url(url)?;
        let id = anon_hash(url.as_str());
        let html = self.fetcher.fetch(&url).await?;
        let outcome = self.extract_html(&html);
        info!(%id, fetcher = self.fetcher.name(), outcome = outcome.label(), "listing extracted");
        outcome.into_result()
    }

    /// Feature transform + model.
    pub fn predict(&self, fields: &ListingFields) -> Result<RatingResult, RatingError> {
        let fv = transform(fields, self.max_observed_price)?;
        self.predictor.predict(&fv)
    }

    /// Extract, then predict when the listing is complete.
    pub async fn rate_url(&self, url: &str) -> Result<RateOutcome, RatingError> {
        let outcome = self.extract_fields(url).await?;
        self.rate_outcome(outcome)
    }

    /// Same as `rate_url` for a page already in hand.
    pub fn rate_html(&self, html: &str) -> Result<RateOutcome, RatingError> {
        let outcome = self.extract_html(html).into_result()?;
        self.rate_outcome(outcome)
    }

    fn rate_outcome(&self, outcome: ExtractionOutcome) -> Result<RateOutcome, RatingError> {
        match outcome {
            ExtractionOutcome::Complete {
                fields,
                hand_assumed,
            } => {
                let rating = self.predict(&fields)?;
                Ok(RateOutcome::Rated {
                    fields,
                    hand_assumed,
                    rating,
                })
            }
            ExtractionOutcome::Partial(p) => Ok(RateOutcome::Partial(p)),
            ExtractionOutcome::Empty => Err(RatingError::NoFieldsFound),
        }
    }
}
