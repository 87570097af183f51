// src/extract/classify.rs
use crate::error::RatingError;
use crate::extract::FieldResolutions;
use crate::listing::{FieldName, ListingFields, PartialFields};

/// What one extraction produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// Every field resolved. `hand_assumed` is set when hand came from the
    /// default policy rather than the listing.
    Complete {
        fields: ListingFields,
        hand_assumed: bool,
    },
    /// Some fields were found in the listing; only those are populated.
    Partial(PartialFields),
    /// Nothing was found in the listing.
    Empty,
}

impl ExtractionOutcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ExtractionOutcome::Complete { .. } => "complete",
            ExtractionOutcome::Partial(_) => "partial",
            ExtractionOutcome::Empty => "empty",
        }
    }

    /// `Empty` becomes `NoFieldsFound`; everything else passes through.
    pub fn into_result(self) -> Result<Self, RatingError> {
        match self {
            ExtractionOutcome::Empty => Err(RatingError::NoFieldsFound),
            other => Ok(other),
        }
    }
}

fn collect(res: &FieldResolutions, include_assumed: bool) -> PartialFields {
    let get = |f: FieldName| {
        if include_assumed {
            res.value(f)
        } else {
            res.matched(f)
        }
    };
    PartialFields {
        year: get(FieldName::Year).and_then(|v| i32::try_from(v).ok()),
        engine_cc: get(FieldName::EngineCc).and_then(|v| u32::try_from(v).ok()),
        hand: get(FieldName::Hand).and_then(|v| u8::try_from(v).ok()),
        km: get(FieldName::Km),
        price: get(FieldName::Price),
    }
}

/// Complete when all five fields resolve (an assumed hand counts), Empty when
/// the listing itself yielded nothing, Partial otherwise. Partial carries only
/// values found in the listing, so callers can tell found from assumed.
pub fn classify(res: &FieldResolutions) -> ExtractionOutcome {
    let matched = collect(res, false);
    if matched.resolved_count() == 0 {
        return ExtractionOutcome::Empty;
    }

    let all = collect(res, true);
    match (all.year, all.engine_cc, all.hand, all.km, all.price) {
        (Some(year), Some(engine_cc), Some(hand), Some(km), Some(price)) => {
            ExtractionOutcome::Complete {
                fields: ListingFields {
                    year,
                    engine_cc,
                    hand,
                    km,
                    price,
                },
                hand_assumed: matched.hand.is_none(),
            }
        }
        _ => ExtractionOutcome::Partial(matched),
    }
}
