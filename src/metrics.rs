use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and describe the series we emit, so
    /// they show up on /metrics before the first request.
    pub fn init() -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!(
            "extract_outcome_total",
            "Listing extractions by outcome (complete/partial/empty)."
        );
        describe_counter!("fetch_errors_total", "Listing page fetch failures.");
        describe_histogram!("fetch_ms", "Listing page fetch time in milliseconds.");
        describe_counter!("predictions_total", "Successful rating predictions.");
        describe_counter!(
            "prediction_failures_total",
            "Predictions rejected by the model or its output checks."
        );

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
