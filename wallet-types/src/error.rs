//! Error types for the wallet.

use rust_decimal::Decimal;

use crate::domain::Currency;
use crate::ports::QuoteError;

/// Ledger-level errors (balance rule violations).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Insufficient {currency} balance: available {available}, requested {requested}")]
    InsufficientBalance {
        currency: Currency,
        available: Decimal,
        requested: Decimal,
    },

    #[error("{0} balance would overflow")]
    Overflow(Currency),
}

/// Conversion errors, as shown to the user.
///
/// Every failure of a conversion attempt ends up here. None is retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("Cannot convert {0} to itself")]
    SameCurrency(Currency),

    #[error("Insufficient {currency} balance: available {available}, requested {requested}")]
    InsufficientBalance {
        currency: Currency,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Quote service returned HTTP {0}")]
    Http(u16),

    #[error("Malformed quote response: {0}")]
    Parse(String),

    #[error("Quote service returned an empty response")]
    EmptyBody,

    #[error("Quote service has no entry for {0}")]
    PairNotFound(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),
}

impl From<QuoteError> for ConversionError {
    fn from(err: QuoteError) -> Self {
        match err {
            QuoteError::Network(e) => ConversionError::Network(e),
            QuoteError::Http(code) => ConversionError::Http(code),
            QuoteError::Parse(e) => ConversionError::Parse(e),
            QuoteError::EmptyBody => ConversionError::EmptyBody,
        }
    }
}

impl From<LedgerError> for ConversionError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance {
                currency,
                available,
                requested,
            } => ConversionError::InsufficientBalance {
                currency,
                available,
                requested,
            },
            LedgerError::NegativeAmount => {
                ConversionError::InvalidAmount("negative amount".into())
            }
            LedgerError::Overflow(currency) => {
                ConversionError::InvalidRate(format!("{} amount out of range", currency))
            }
        }
    }
}
