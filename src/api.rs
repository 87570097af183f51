use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::context::{AppContext, RateOutcome};
use crate::error::RatingError;
use crate::extract::classify::ExtractionOutcome;
use crate::listing::ListingFields;

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<AppContext>,
}

impl AppState {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
        .route("/predict", post(predict))
        .route("/extract", get(extract))
        .route("/rate", get(rate))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct UrlQuery {
    url: String,
}

/* ----------------------------
Response bodies
---------------------------- */

pub fn error_body(e: &RatingError) -> Value {
    json!({ "error": e.to_string(), "code": e.code() })
}

pub fn extraction_body(outcome: &ExtractionOutcome) -> Value {
    match outcome {
        ExtractionOutcome::Complete {
            fields,
            hand_assumed,
        } => json!({ "fields": fields, "hand_assumed": hand_assumed }),
        ExtractionOutcome::Partial(p) => json!({ "partial": p }),
        ExtractionOutcome::Empty => error_body(&RatingError::NoFieldsFound),
    }
}

pub fn rate_body(outcome: &RateOutcome) -> Value {
    match outcome {
        RateOutcome::Rated {
            fields,
            hand_assumed,
            rating,
        } => json!({
            "predicted_rating": rating.predicted_rating,
            "fields": fields,
            "hand_assumed": hand_assumed,
        }),
        RateOutcome::Partial(p) => json!({ "partial": p }),
    }
}

struct ApiError(RatingError);

impl From<RatingError> for ApiError {
    fn from(e: RatingError) -> Self {
        Self(e)
    }
}

fn status_for(e: &RatingError) -> StatusCode {
    match e {
        RatingError::Fetch(_) => StatusCode::BAD_GATEWAY,
        RatingError::NoFieldsFound => StatusCode::UNPROCESSABLE_ENTITY,
        RatingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        RatingError::PredictionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (status_for(&self.0), Json(error_body(&self.0))).into_response()
    }
}

/* ----------------------------
Handlers
---------------------------- */

async fn root() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Motorcycle rating API is live" }))
}

async fn predict(
    State(state): State<AppState>,
    body: Result<Json<ListingFields>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(fields) = body.map_err(|e| RatingError::InvalidInput(e.body_text()))?;
    let rating = state.ctx.predict(&fields)?;
    Ok(Json(json!({ "predicted_rating": rating.predicted_rating })))
}

async fn extract(
    State(state): State<AppState>,
    q: Result<Query<UrlQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(q) = q.map_err(|e| RatingError::InvalidInput(e.body_text()))?;
    let outcome = state.ctx.extract_fields(&q.url).await?;
    Ok(Json(extraction_body(&outcome)))
}

async fn rate(
    State(state): State<AppState>,
    q: Result<Query<UrlQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(q) = q.map_err(|e| RatingError::InvalidInput(e.body_text()))?;
    let outcome = state.ctx.rate_url(&q.url).await?;
    Ok(Json(rate_body(&outcome)))
}
