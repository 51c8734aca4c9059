//! # Wallet Types
//!
//! Domain types and port traits for the wallet conversion engine.
//! This crate has ZERO IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Currency, Balances, PairQuote, ConversionState)
//! - `ports/` - Trait definitions that adapters must implement
//! - `error/` - Domain and application error types

pub mod domain;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Balances, ConversionOutcome, ConversionRequest, ConversionState, Currency, DecimalSeparator,
    PairQuote, format_amount, parse_amount,
};
pub use error::{ConversionError, LedgerError};
pub use ports::{QuoteError, QuoteItem, QuoteProvider, RawQuote};
