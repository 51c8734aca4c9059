//! Currencies held by the wallet.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currencies supported by the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    BRL,
    USD,
    BTC,
}

impl Currency {
    /// Returns the ISO-style three letter code used by the quote API.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::BRL => "BRL",
            Currency::USD => "USD",
            Currency::BTC => "BTC",
        }
    }

    /// Returns the currency symbol shown in front of formatted amounts.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::BRL => "R$",
            Currency::USD => "$",
            Currency::BTC => "BTC",
        }
    }

    /// Returns the number of decimal places shown for this currency.
    pub fn display_decimals(&self) -> u32 {
        match self {
            Currency::BRL | Currency::USD => 2,
            Currency::BTC => 4,
        }
    }

    pub fn is_fiat(&self) -> bool {
        !matches!(self, Currency::BTC)
    }

    pub fn all() -> &'static [Currency] {
        &[Currency::BRL, Currency::USD, Currency::BTC]
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BRL" => Ok(Currency::BRL),
            "USD" => Ok(Currency::USD),
            "BTC" => Ok(Currency::BTC),
            _ => Err(format!("Unknown currency: {}. Supported: BRL, USD, BTC", s)),
        }
    }
}
