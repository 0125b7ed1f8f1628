//! Satoshi to fiat conversion against fixed mock exchange rates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SATS_PER_BTC: u64 = 100_000_000;

/// Mock BTC price in USD; every other rate is relative to this.
pub const BTC_PRICE_USD: f64 = 65_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Jpy,
    Gbp,
    Cad,
    Aud,
}

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Jpy,
        Currency::Gbp,
        Currency::Cad,
        Currency::Aud,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Jpy => "JPY",
            Self::Gbp => "GBP",
            Self::Cad => "CAD",
            Self::Aud => "AUD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Eur => "€",
            Self::Jpy => "¥",
            Self::Gbp => "£",
            Self::Cad => "C$",
            Self::Aud => "A$",
        }
    }

    /// Exchange rate relative to USD.
    pub fn rate(&self) -> f64 {
        match self {
            Self::Usd => 1.0,
            Self::Eur => 0.93,
            Self::Jpy => 155.42,
            Self::Gbp => 0.8,
            Self::Cad => 1.36,
            Self::Aud => 1.52,
        }
    }

    pub fn decimals(&self) -> usize {
        match self {
            Self::Jpy => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported currency: {s}"))
    }
}

pub fn sats_to_btc(sats: u64) -> f64 {
    sats as f64 / SATS_PER_BTC as f64
}

pub fn sats_to_fiat(sats: u64, currency: Currency) -> f64 {
    sats_to_btc(sats) * BTC_PRICE_USD * currency.rate()
}

/// `$65000.00`, `¥10102300`: JPY has no minor unit, everything else two.
pub fn format_sats_to_fiat(sats: u64, currency: Currency) -> String {
    let amount = sats_to_fiat(sats, currency);
    match currency.decimals() {
        0 => format!("{}{}", currency.symbol(), amount.round()),
        decimals => format!("{}{:.*}", currency.symbol(), decimals, amount),
    }
}

pub fn format_sats(sats: u64) -> String {
    if sats >= 1_000_000 {
        format!("{:.2}M sats", sats as f64 / 1_000_000.0)
    } else if sats >= 1_000 {
        format!("{:.2}k sats", sats as f64 / 1_000.0)
    } else {
        format!("{sats} sats")
    }
}
