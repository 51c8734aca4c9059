//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The conversion engine depends on these traits, not concrete implementations.

mod quote;

pub use quote::{QuoteError, QuoteItem, QuoteProvider, RawQuote};
