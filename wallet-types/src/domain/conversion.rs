//! Conversion request, pair resolution, and workflow state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::currency::Currency;
use crate::error::ConversionError;

/// Parses a user-entered amount.
///
/// Both `.` and `,` are accepted as the decimal separator. The amount must be
/// strictly positive.
pub fn parse_amount(raw: &str) -> Result<Decimal, ConversionError> {
    let normalized = raw.trim().replace(',', ".");
    let amount = Decimal::from_str(&normalized)
        .map_err(|_| ConversionError::InvalidAmount(raw.to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(ConversionError::InvalidAmount(raw.to_string()));
    }
    Ok(amount.normalize())
}

/// A validated conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub source: Currency,
    pub dest: Currency,
    pub amount: Decimal,
}

impl ConversionRequest {
    /// Validates the raw user input.
    ///
    /// # Validation
    /// - Amount must parse and be positive
    /// - Source and destination currencies must differ
    pub fn parse(source: Currency, dest: Currency, raw_amount: &str) -> Result<Self, ConversionError> {
        let amount = parse_amount(raw_amount)?;
        if source == dest {
            return Err(ConversionError::SameCurrency(source));
        }
        Ok(Self {
            source,
            dest,
            amount,
        })
    }
}

/// The quote-API query needed for one currency pair.
///
/// The API only quotes Bitcoin as `BTC-<fiat>`, so fiat-to-BTC conversions
/// ask for the reverse pair and invert the returned bid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairQuote {
    /// Path segment for `/json/last/{pair_query}`, e.g. `USD-BRL`.
    pub pair_query: String,
    /// Key of the quote item in the response body, e.g. `USDBRL`.
    pub response_key: String,
    /// Whether the fetched bid must be inverted to get source-to-dest.
    pub invert: bool,
}

impl PairQuote {
    pub fn resolve(source: Currency, dest: Currency) -> Self {
        let (first, second, invert) = if source != Currency::BTC && dest == Currency::BTC {
            (dest, source, true)
        } else {
            (source, dest, false)
        };
        Self {
            pair_query: format!("{}-{}", first, second),
            response_key: format!("{}{}", first, second),
            invert,
        }
    }

    /// Turns a fetched bid into the source-to-dest rate.
    ///
    /// Returns `None` for a bid that is zero or negative.
    pub fn apply(&self, bid: Decimal) -> Option<Decimal> {
        if bid <= Decimal::ZERO {
            return None;
        }
        if self.invert {
            Decimal::ONE.checked_div(bid)
        } else {
            Some(bid)
        }
    }
}

/// A completed conversion, as applied to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub source: Currency,
    pub source_amount: Decimal,
    pub dest: Currency,
    pub dest_amount: Decimal,
    /// Source-to-dest rate actually used, after any inversion.
    pub rate: Decimal,
}

/// State of the conversion workflow, observed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConversionState {
    #[default]
    Idle,
    Loading,
    Success {
        dest: Currency,
        dest_amount: Decimal,
    },
    Error(ConversionError),
}

impl ConversionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ConversionState::Loading)
    }
}
