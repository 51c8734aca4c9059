//! Quote provider port.
//!
//! This trait defines the interface for exchange-rate quote services.
//! Implementations can be HTTP clients, mock providers, etc.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error type for quote lookups.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Http(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Empty response body")]
    EmptyBody,
}

/// One quoted pair as returned by the quote API.
///
/// `bid` is the buy price of `code` expressed in `codein`, as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteItem {
    pub code: String,
    pub codein: String,
    #[serde(default)]
    pub name: String,
    pub bid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_date: Option<String>,
}

impl QuoteItem {
    /// Creates an item carrying only the fields the engine reads.
    pub fn new(code: impl Into<String>, codein: impl Into<String>, bid: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            codein: codein.into(),
            name: String::new(),
            bid: bid.into(),
            ask: None,
            high: None,
            low: None,
            timestamp: None,
            create_date: None,
        }
    }
}

/// A parsed quote response, keyed by the concatenated currency codes (`USDBRL`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawQuote(HashMap<String, QuoteItem>);

impl RawQuote {
    /// Parses a response body.
    ///
    /// An empty body (or a JSON `null`) is reported separately from a malformed one.
    pub fn from_body(body: &[u8]) -> Result<Self, QuoteError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(QuoteError::EmptyBody);
        }
        let parsed: Option<HashMap<String, QuoteItem>> =
            serde_json::from_slice(body).map_err(|e| QuoteError::Parse(e.to_string()))?;
        parsed.map(RawQuote).ok_or(QuoteError::EmptyBody)
    }

    pub fn get(&self, key: &str) -> Option<&QuoteItem> {
        self.0.get(key)
    }

    /// Returns the raw bid string for `key`, if the pair is present.
    pub fn bid(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|item| item.bid.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, QuoteItem)> for RawQuote {
    fn from_iter<I: IntoIterator<Item = (String, QuoteItem)>>(iter: I) -> Self {
        RawQuote(iter.into_iter().collect())
    }
}

/// Port trait for quote providers.
#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Looks up the latest quote for a pair query such as `USD-BRL`.
    ///
    /// Makes a single attempt; callers decide what to do with failures.
    async fn fetch(&self, query: &str) -> Result<RawQuote, QuoteError>;
}

#[async_trait::async_trait]
impl<T: QuoteProvider + ?Sized> QuoteProvider for std::sync::Arc<T> {
    async fn fetch(&self, query: &str) -> Result<RawQuote, QuoteError> {
        (**self).fetch(query).await
    }
}
