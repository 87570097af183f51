//! Motorcycle rating service — binary entrypoint.
//! Boots the Axum HTTP server: config, shared context, routes, metrics.

use shuttle_axum::ShuttleAxum;

use moto_rating::api::{self, AppState};
use moto_rating::config::AppConfig;
use moto_rating::metrics::Metrics;
use moto_rating::AppContext;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    moto_rating::init_tracing();

    // Pattern table + model are required; the reference dataset may fall back.
    let cfg = AppConfig::from_env();
    let ctx = AppContext::from_config(&cfg)?;

    let metrics = Metrics::init()?;
    let router = api::router(AppState::new(ctx)).merge(metrics.router());

    Ok(router.into())
}
