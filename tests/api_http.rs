// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot, with a
// fixture fetcher standing in for the network.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::Request,
    Router,
};
use http::StatusCode;
use serde_json::json;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use moto_rating::api::{self, AppState};
use moto_rating::extract::fetch::FixtureFetcher;
use moto_rating::extract::FieldExtractor;
use moto_rating::predict::features::FEATURE_COUNT;
use moto_rating::predict::model::FnModel;
use moto_rating::predict::RatingPredictor;
use moto_rating::AppContext;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

const FULL: &str = include_str!("fixtures/listing_full.html");
const PARTIAL: &str = include_str!("fixtures/listing_partial.html");
const NOT_A_LISTING: &str = include_str!("fixtures/not_a_listing.html");

/// Router over a fixture page and a model scoring `10 - age`.
fn test_router(fetcher: FixtureFetcher) -> Router {
    let model = FnModel::new(FEATURE_COUNT, |x: &[f64]| 10.0 - x[0]);
    let ctx = AppContext::new(
        FieldExtractor::with_embedded_table().expect("pattern table"),
        RatingPredictor::new(Arc::new(model)),
        Arc::new(fetcher),
        100_000.0,
    );
    api::router(AppState::new(ctx))
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Json) {
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v: Json = serde_json::from_slice(&bytes).expect("json body");
    (status, v)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

fn post_json(uri: &str, payload: &Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_router(FixtureFetcher::new(""));
    let resp = app.oneshot(get("/health")).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap(), "ok");
}

#[tokio::test]
async fn root_reports_status() {
    let (status, v) = call(test_router(FixtureFetcher::new("")), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "ok");
}

#[tokio::test]
async fn predict_returns_rating() {
    let payload = json!({ "year": 2020, "engine_cc": 600, "hand": 1, "km": 8000, "price": 35000 });
    let (status, v) = call(
        test_router(FixtureFetcher::new("")),
        post_json("/predict", &payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!({ "predicted_rating": 5.0 }));
}

#[tokio::test]
async fn predict_zero_engine_is_invalid_input() {
    let payload = json!({ "year": 2020, "engine_cc": 0, "hand": 1, "km": 8000, "price": 35000 });
    let (status, v) = call(
        test_router(FixtureFetcher::new("")),
        post_json("/predict", &payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["code"], "invalid_input");
    assert!(v["error"].as_str().unwrap().contains("engine_cc"));
}

#[tokio::test]
async fn predict_far_past_year_is_invalid_input() {
    let payload = json!({ "year": i32::MIN, "engine_cc": 600, "hand": 1, "km": 8000, "price": 35000 });
    let (status, v) = call(
        test_router(FixtureFetcher::new("")),
        post_json("/predict", &payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["code"], "invalid_input");
    assert!(v["error"].as_str().unwrap().contains("year"));
}

#[tokio::test]
async fn predict_malformed_body_is_structured_error() {
    let payload = json!({ "year": "new", "engine_cc": 600 });
    let (status, v) = call(
        test_router(FixtureFetcher::new("")),
        post_json("/predict", &payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["code"], "invalid_input");
}

#[tokio::test]
async fn extract_complete_listing() {
    let (status, v) = call(
        test_router(FixtureFetcher::new(FULL)),
        get("/extract?url=https%3A%2F%2Fexample.com%2Fitem%2F1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        v,
        json!({
            "fields": { "year": 2020, "engine_cc": 689, "hand": 1, "km": 14500, "price": 38900 },
            "hand_assumed": false
        })
    );
}

#[tokio::test]
async fn extract_partial_listing() {
    let (status, v) = call(
        test_router(FixtureFetcher::new(PARTIAL)),
        get("/extract?url=https://example.com/item/2"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        v,
        json!({ "partial": { "year": 2019, "engine_cc": 300, "price": 24000 } })
    );
}

#[tokio::test]
async fn extract_unrelated_page_is_no_fields_found() {
    let (status, v) = call(
        test_router(FixtureFetcher::new(NOT_A_LISTING)),
        get("/extract?url=https://example.com/404"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(v["code"], "no_fields_found");
}

#[tokio::test]
async fn extract_fetch_failure_is_bad_gateway() {
    let (status, v) = call(
        test_router(FixtureFetcher::failing("operation timed out")),
        get("/extract?url=https://example.com/slow"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(v["code"], "fetch_error");
    assert!(v["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn extract_without_url_is_invalid_input() {
    let (status, v) = call(test_router(FixtureFetcher::new(FULL)), get("/extract")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["code"], "invalid_input");
}

#[tokio::test]
async fn rate_complete_listing_predicts() {
    let (status, v) = call(
        test_router(FixtureFetcher::new(FULL)),
        get("/rate?url=https://example.com/item/1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // age = 2025 - 2020
    assert_eq!(v["predicted_rating"], 5.0);
    assert_eq!(v["fields"]["engine_cc"], 689);
    assert_eq!(v["hand_assumed"], false);
}

#[tokio::test]
async fn rate_partial_listing_returns_partial() {
    let (status, v) = call(
        test_router(FixtureFetcher::new(PARTIAL)),
        get("/rate?url=https://example.com/item/2"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(v.get("predicted_rating").is_none());
    assert_eq!(v["partial"]["price"], 24000);
}
