//! Quote currencies supported by the market endpoints.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// A fiat currency that prices can be quoted in.
///
/// The upstream API expects lower-case codes (`usd`, `eur`, ...); [`Currency::as_str`]
/// gives that form and [`Currency::label`] the upper-case display label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// US dollar
    #[default]
    Usd,
    /// Euro
    Eur,
    /// British pound
    Gbp,
    /// Japanese yen
    Jpy,
    /// Australian dollar
    Aud,
    /// Canadian dollar
    Cad,
    /// Swiss franc
    Chf,
    /// Chinese yuan
    Cny,
    /// Indian rupee
    Inr,
}

impl Currency {
    /// All supported currencies, in selector order.
    pub const ALL: [Currency; 9] = [
        Currency::Inr,
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Aud,
        Currency::Cad,
        Currency::Chf,
        Currency::Cny,
    ];

    /// Lower-case code as sent to the upstream API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Eur => "eur",
            Currency::Gbp => "gbp",
            Currency::Jpy => "jpy",
            Currency::Aud => "aud",
            Currency::Cad => "cad",
            Currency::Chf => "chf",
            Currency::Cny => "cny",
            Currency::Inr => "inr",
        }
    }

    /// Upper-case display label.
    pub fn label(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Aud => "AUD",
            Currency::Cad => "CAD",
            Currency::Chf => "CHF",
            Currency::Cny => "CNY",
            Currency::Inr => "INR",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Currency {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.as_str() == code)
            .ok_or_else(|| MarketError::InvalidInput(format!("unsupported currency: {}", s)))
    }
}
