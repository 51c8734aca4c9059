//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use quote_client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use wallet_types::DecimalSeparator;

/// Application configuration.
pub struct Config {
    pub quote_api_url: String,
    pub quote_timeout: Duration,
    pub log_json: bool,
    pub decimal_separator: DecimalSeparator,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let quote_api_url =
            env::var("QUOTE_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let quote_timeout = match env::var("QUOTE_TIMEOUT_SECS") {
            Ok(secs) => Duration::from_secs(secs.parse().map_err(|_| {
                anyhow::anyhow!("QUOTE_TIMEOUT_SECS must be a whole number of seconds")
            })?),
            Err(_) => DEFAULT_TIMEOUT,
        };

        let log_json = env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let locale = env::var("LC_NUMERIC")
            .or_else(|_| env::var("LANG"))
            .unwrap_or_default();

        Ok(Self {
            quote_api_url,
            quote_timeout,
            log_json,
            decimal_separator: separator_for_locale(&locale),
        })
    }
}

/// Picks the decimal separator for a POSIX locale name such as `pt_BR.UTF-8`.
pub fn separator_for_locale(locale: &str) -> DecimalSeparator {
    const COMMA_LANGUAGES: &[&str] = &["pt", "es", "fr", "de", "it", "nl", "ru"];
    let language = locale
        .split(['_', '.', '-'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if COMMA_LANGUAGES.contains(&language.as_str()) {
        DecimalSeparator::Comma
    } else {
        DecimalSeparator::Dot
    }
}
