//! Network fetchers for the traffic feed and METAR reports.
//!
//! `FeedSource` is the seam the poller and tests hang off; `HttpFeed` is the
//! real implementation over reqwest.

use std::time::Duration;

use vatwatch_core::metar::{self, decode_html_entities, Metar};
use vatwatch_core::types::{FeedSnapshot, VatwatchError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bad feed payload: {0}")]
    Payload(#[from] VatwatchError),
}

/// Where snapshots and weather come from.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch one full network snapshot.
    async fn snapshot(&self) -> Result<FeedSnapshot, FeedError>;

    /// Fetch and parse the current METAR for `icao`. `Ok(None)` when the
    /// service has nothing parseable for that station.
    async fn metar(&self, icao: &str) -> Result<Option<Metar>, FeedError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct HttpFeed {
    feed_url: String,
    metar_url: String,
    client: reqwest::Client,
}

impl HttpFeed {
    pub fn new(feed_url: &str, metar_url: &str) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("vatwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpFeed {
            feed_url: feed_url.to_string(),
            metar_url: metar_url.to_string(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl FeedSource for HttpFeed {
    async fn snapshot(&self) -> Result<FeedSnapshot, FeedError> {
        let body = self
            .client
            .get(&self.feed_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(FeedSnapshot::from_json(&body)?)
    }

    async fn metar(&self, icao: &str) -> Result<Option<Metar>, FeedError> {
        let body = self
            .client
            .get(&self.metar_url)
            .query(&[("id", icao)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(parse_metar_body(&body))
    }
}

/// The weather service answers with an HTML-escaped report, possibly
/// followed by more lines. Only the first non-blank line is used.
pub fn parse_metar_body(body: &str) -> Option<Metar> {
    let decoded = decode_html_entities(body);
    let line = decoded.lines().map(str::trim).find(|l| !l.is_empty())?;
    metar::parse(line)
}
