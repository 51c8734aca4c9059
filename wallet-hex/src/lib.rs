//! # Wallet Hex
//!
//! Application service layer for the wallet: the conversion engine.
//!
//! ## Architecture
//!
//! - `service/` - Conversion engine (orchestrates validation, quotes, and the ledger)
//!
//! The engine is generic over `Q: QuoteProvider`, allowing different quote
//! sources to be injected. Presentation adapters observe its state channel.

pub mod service;

#[cfg(test)]
mod service_tests;

pub use service::ConversionEngine;
