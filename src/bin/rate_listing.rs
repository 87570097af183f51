//! Probe the rating pipeline from the command line.
//!
//! `rate_listing <url>` fetches and rates a live listing;
//! `rate_listing <file.html>` rates a saved page without touching the network.

use std::path::Path;

use moto_rating::api::{error_body, rate_body};
use moto_rating::config::AppConfig;
use moto_rating::AppContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    moto_rating::init_tracing();

    let Some(target) = std::env::args().nth(1) else {
        anyhow::bail!("usage: rate_listing <url | file.html>");
    };

    let ctx = AppContext::from_config(&AppConfig::from_env())?;

    let path = Path::new(&target);
    let result = if path.is_file() {
        let html = std::fs::read_to_string(path)?;
        ctx.rate_html(&html)
    } else {
        ctx.rate_url(&target).await
    };

    let body = match &result {
        Ok(outcome) => rate_body(outcome),
        Err(e) => error_body(e),
    };
    println!("{}", serde_json::to_string_pretty(&body)?);

    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
