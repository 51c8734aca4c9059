//! Domain models for the wallet.

pub mod balance;
pub mod conversion;
pub mod currency;

pub use balance::{Balances, DecimalSeparator, format_amount};
pub use conversion::{
    ConversionOutcome, ConversionRequest, ConversionState, PairQuote, parse_amount,
};
pub use currency::Currency;
