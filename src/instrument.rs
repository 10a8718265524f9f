//! Demo trading-pair taxonomy for the HTTP surface. The core only ever
//! deals in an opaque [`Symbol`](crate::types::Symbol); this module exists
//! so the API has a couple of human-readable instruments to default to.

use crate::types::Symbol;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    BTC,
    USD,
    ETH,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pair {
    pub base: Asset,
    pub quote: Asset,
}

impl Pair {
    pub fn code(&self) -> String {
        format!("{:?}-{:?}", self.base, self.quote)
    }

    pub fn crypto_usd(base: Asset) -> Self {
        Pair { base, quote: Asset::USD }
    }

    pub fn supported() -> &'static [Pair] {
        &[BTC_USD, ETH_USD]
    }

    pub fn symbol(&self) -> Symbol {
        Symbol::new(self.code())
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Pair {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pair::supported().iter().find(|p| p.code() == s).cloned().ok_or(())
    }
}

pub const BTC_USD: Pair = Pair { base: Asset::BTC, quote: Asset::USD };
pub const ETH_USD: Pair = Pair { base: Asset::ETH, quote: Asset::USD };
