//! Coinage and price arithmetic.
//!
//! Prices are stored in gold pieces as decimals; 1 gp = 10 sp = 100 cp,
//! and one platinum piece is worth 100 gp in this ruleset.

use crate::inventory::ParsedInventoryItem;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinUnit {
    Platinum,
    Gold,
    Silver,
    Copper,
}

impl CoinUnit {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            CoinUnit::Platinum => "pp",
            CoinUnit::Gold => "gp",
            CoinUnit::Silver => "sp",
            CoinUnit::Copper => "cp",
        }
    }

    /// Worth of one coin in gold pieces.
    pub fn gp_value(&self) -> f64 {
        match self {
            CoinUnit::Platinum => 100.0,
            CoinUnit::Gold => 1.0,
            CoinUnit::Silver => 0.1,
            CoinUnit::Copper => 0.01,
        }
    }
}

impl fmt::Display for CoinUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// A gold-piece value broken down into whole coins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coins {
    pub pp: i64,
    pub gp: i64,
    pub sp: i64,
    pub cp: i64,
}

impl Coins {
    /// Decompose into gp/sp/cp, rounding to the nearest copper.
    pub fn from_gp(value_gp: f64) -> Self {
        let copper = (value_gp * 100.0).round() as i64;
        Self {
            pp: 0,
            gp: copper / 100,
            sp: (copper % 100) / 10,
            cp: copper % 10,
        }
    }

    /// Like [`Coins::from_gp`] but pays out platinum where possible.
    pub fn from_gp_with_platinum(value_gp: f64) -> Self {
        let mut coins = Self::from_gp(value_gp);
        let per_pp = CoinUnit::Platinum.gp_value() as i64;
        coins.pp = coins.gp / per_pp;
        coins.gp %= per_pp;
        coins
    }

    pub fn to_gp(&self) -> f64 {
        self.pp as f64 * CoinUnit::Platinum.gp_value()
            + self.gp as f64
            + self.sp as f64 * CoinUnit::Silver.gp_value()
            + self.cp as f64 * CoinUnit::Copper.gp_value()
    }

    pub fn is_zero(&self) -> bool {
        self.pp == 0 && self.gp == 0 && self.sp == 0 && self.cp == 0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0 gp");
        }
        let parts: Vec<String> = [
            (self.pp, CoinUnit::Platinum),
            (self.gp, CoinUnit::Gold),
            (self.sp, CoinUnit::Silver),
            (self.cp, CoinUnit::Copper),
        ]
        .iter()
        .filter(|(n, _)| *n != 0)
        .map(|(n, unit)| format!("{n} {unit}"))
        .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Human-readable price such as `"1 gp 5 sp"`; zero prints as `"free"`.
pub fn format_price(value_gp: f64) -> String {
    let coins = Coins::from_gp(value_gp);
    if coins.is_zero() {
        "free".to_string()
    } else {
        coins.to_string()
    }
}

/// Coin held, in gold pieces.
pub fn wealth(items: &[ParsedInventoryItem]) -> f64 {
    items
        .iter()
        .filter(|i| i.is_currency())
        .map(|i| i.total_price_gp)
        .sum()
}

/// Market value of everything that isn't coin.
pub fn goods_value(items: &[ParsedInventoryItem]) -> f64 {
    items
        .iter()
        .filter(|i| !i.is_currency())
        .map(|i| i.total_price_gp)
        .sum()
}

/// What a merchant pays: half the list price, coin at face value.
pub fn sale_price(item: &ParsedInventoryItem) -> f64 {
    if item.is_currency() {
        item.total_price_gp
    } else {
        item.total_price_gp / 2.0
    }
}
