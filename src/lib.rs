// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod listing;
pub mod metrics;
pub mod predict;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::context::{AppContext, RateOutcome};
pub use crate::error::RatingError;
pub use crate::extract::classify::ExtractionOutcome;
pub use crate::listing::{FieldName, ListingFields, PartialFields};
pub use crate::predict::RatingResult;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing for the binaries. Uses `RUST_LOG` when set. A subscriber
/// installed by the host runtime wins; this is then a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("moto_rating=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}
