//! Per-currency wallet balances and their display formatting.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::currency::Currency;
use crate::error::LedgerError;

/// One balance per currency. Balances never go negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    entries: BTreeMap<Currency, Decimal>,
}

impl Balances {
    /// Creates balances from explicit amounts.
    ///
    /// Negative inputs are rejected so the non-negative invariant holds from the start.
    pub fn new(brl: Decimal, usd: Decimal, btc: Decimal) -> Result<Self, LedgerError> {
        if brl.is_sign_negative() || usd.is_sign_negative() || btc.is_sign_negative() {
            return Err(LedgerError::NegativeAmount);
        }
        let entries = BTreeMap::from([
            (Currency::BRL, brl),
            (Currency::USD, usd),
            (Currency::BTC, btc),
        ]);
        Ok(Self { entries })
    }

    /// Returns an all-zero wallet.
    pub fn zero() -> Self {
        Self {
            entries: Currency::all().iter().map(|&c| (c, Decimal::ZERO)).collect(),
        }
    }

    /// Returns the balance held in `currency`.
    pub fn get(&self, currency: Currency) -> Decimal {
        self.entries.get(&currency).copied().unwrap_or(Decimal::ZERO)
    }

    /// Iterates balances in currency order (BRL, USD, BTC).
    pub fn iter(&self) -> impl Iterator<Item = (Currency, Decimal)> + '_ {
        self.entries.iter().map(|(&c, &v)| (c, v))
    }

    pub fn has_at_least(&self, currency: Currency, amount: Decimal) -> bool {
        self.get(currency) >= amount
    }

    /// Credits (adds) `amount` to `currency`.
    pub fn credit(&mut self, currency: Currency, amount: Decimal) -> Result<(), LedgerError> {
        if amount.is_sign_negative() {
            return Err(LedgerError::NegativeAmount);
        }
        let next = self
            .get(currency)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(currency))?;
        self.entries.insert(currency, next);
        Ok(())
    }

    /// Debits (subtracts) `amount` from `currency`.
    pub fn debit(&mut self, currency: Currency, amount: Decimal) -> Result<(), LedgerError> {
        if amount.is_sign_negative() {
            return Err(LedgerError::NegativeAmount);
        }
        let available = self.get(currency);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                currency,
                available,
                requested: amount,
            });
        }
        self.entries.insert(currency, available - amount);
        Ok(())
    }
}

/// Starting balances of a fresh wallet: R$ 100000.00, $ 50000.00, BTC 0.5000.
impl Default for Balances {
    fn default() -> Self {
        let entries = BTreeMap::from([
            (Currency::BRL, Decimal::new(10_000_000, 2)),
            (Currency::USD, Decimal::new(5_000_000, 2)),
            (Currency::BTC, Decimal::new(5_000, 4)),
        ]);
        Self { entries }
    }
}

impl fmt::Display for Balances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (currency, amount) in self.iter() {
            if !first {
                f.write_str(" | ")?;
            }
            first = false;
            f.write_str(&format_amount(currency, amount, DecimalSeparator::Dot))?;
        }
        Ok(())
    }
}

/// Decimal separator of the user's locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecimalSeparator {
    #[default]
    Dot,
    Comma,
}

/// Formats an amount for display: symbol, a space, then the amount rounded
/// half away from zero to the currency's display decimals.
///
/// `R$ 100000.00`, `$ 50000.00`, `BTC 0.5000`.
pub fn format_amount(currency: Currency, amount: Decimal, separator: DecimalSeparator) -> String {
    let dp = currency.display_decimals();
    let mut rounded = amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    let digits = rounded.to_string();
    let digits = match separator {
        DecimalSeparator::Dot => digits,
        DecimalSeparator::Comma => digits.replace('.', ","),
    };
    format!("{} {}", currency.symbol(), digits)
}
