// src/extract/fetch.rs
//! Listing page fetch: one GET per request, fixed user agent, hard timeout,
//! no retries.

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Url;
use std::time::Duration;

use crate::error::RatingError;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; moto-rating/0.1)";

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Return the page body. Any transport/status failure is `RatingError::Fetch`.
    async fn fetch(&self, url: &Url) -> Result<String, RatingError>;
    fn name(&self) -> &'static str;
}

/// Accept only absolute http(s) URLs.
pub fn parse_listing_url(raw: &str) -> Result<Url, RatingError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| RatingError::InvalidInput(format!("bad listing url: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RatingError::InvalidInput(format!(
            "unsupported url scheme `{other}`"
        ))),
    }
}

/// reqwest-backed fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout.min(Duration::from_secs(4)))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, RatingError> {
        let t0 = std::time::Instant::now();
        let result = async {
            let resp = self.client.get(url.clone()).send().await?;
            let resp = resp.error_for_status()?;
            resp.text().await
        }
        .await;
        histogram!("fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        result.map_err(|e| {
            tracing::warn!(error = ?e, fetcher = self.name(), "listing fetch failed");
            counter!("fetch_errors_total").increment(1);
            RatingError::from(e)
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Serves a fixed body (or a fixed failure) for every URL. Used for local
/// files and tests.
pub struct FixtureFetcher {
    body: Result<String, String>,
}

impl FixtureFetcher {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            body: Ok(html.into()),
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            body: Err(reason.into()),
        }
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, _url: &Url) -> Result<String, RatingError> {
        self.body.clone().map_err(RatingError::Fetch)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_http_urls_are_accepted() {
        assert!(parse_listing_url("https://www.example.co.il/item/abc").is_ok());
        assert!(parse_listing_url("  http://example.com/x  ").is_ok());
        assert!(matches!(
            parse_listing_url("file:///etc/passwd"),
            Err(RatingError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_listing_url("not a url"),
            Err(RatingError::InvalidInput(_))
        ));
    }

    #[test]
    fn http_fetcher_builds_with_timeout() {
        assert!(HttpFetcher::new(DEFAULT_USER_AGENT, DEFAULT_FETCH_TIMEOUT).is_ok());
    }

    #[tokio::test]
    async fn fixture_fetcher_serves_body_or_error() {
        let url = parse_listing_url("https://example.com/a").unwrap();
        let ok = FixtureFetcher::new("<p>hi</p>");
        assert_eq!(ok.fetch(&url).await.unwrap(), "<p>hi</p>");

        let bad = FixtureFetcher::failing("connection refused");
        match bad.fetch(&url).await {
            Err(RatingError::Fetch(msg)) => assert_eq!(msg, "connection refused"),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_error() {
        // Port 9 on localhost: connection refused well within the timeout.
        let f = HttpFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(2)).unwrap();
        let url = parse_listing_url("http://127.0.0.1:9/listing").unwrap();
        assert!(matches!(f.fetch(&url).await, Err(RatingError::Fetch(_))));
    }

    #[tokio::test]
    async fn silent_server_hits_the_timeout() {
        // Accepts the connection, then never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                if let Ok((sock, _)) = listener.accept().await {
                    held.push(sock);
                }
            }
        });

        let f = HttpFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(1)).unwrap();
        let url = parse_listing_url(&format!("http://{addr}/listing")).unwrap();
        let t0 = std::time::Instant::now();
        let res = tokio::time::timeout(Duration::from_secs(5), f.fetch(&url))
            .await
            .expect("fetch must not hang");
        assert!(matches!(res, Err(RatingError::Fetch(_))));
        assert!(t0.elapsed() < Duration::from_millis(2500));
        server.abort();
    }
}
