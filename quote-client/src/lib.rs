//! # Quote Client
//!
//! A typed Rust client for the AwesomeAPI exchange-rate quotes.
//! Implements the `QuoteProvider` port from `wallet-types`.

use std::time::Duration;

use reqwest::Client;
use wallet_types::{QuoteError, QuoteProvider, RawQuote};

/// Public AwesomeAPI endpoint.
pub const DEFAULT_BASE_URL: &str = "https://economia.awesomeapi.com.br";

/// Per-request timeout used unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("wallet/", env!("CARGO_PKG_VERSION"));

/// Quote API client.
pub struct HttpQuoteClient {
    base_url: String,
    timeout: Duration,
    http: Client,
}

impl HttpQuoteClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            http: Client::new(),
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, query: &str) -> String {
        format!("{}/json/last/{}", self.base_url, query)
    }

    /// Fetches the latest quote for `query` (e.g. `USD-BRL`). One attempt, no retries.
    pub async fn fetch_quote(&self, query: &str) -> Result<RawQuote, QuoteError> {
        let url = self.url_for(query);
        tracing::debug!(%url, "Requesting quote");

        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        let status = resp.status();
        tracing::debug!(query, status = status.as_u16(), "Quote response received");
        if !status.is_success() {
            return Err(QuoteError::Http(status.as_u16()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;
        RawQuote::from_body(&body)
    }
}

impl Default for HttpQuoteClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl QuoteProvider for HttpQuoteClient {
    async fn fetch(&self, query: &str) -> Result<RawQuote, QuoteError> {
        self.fetch_quote(query).await
    }
}
