//! Side-aware price key used to order a book's price levels.
//!
//! A single key type expresses best-price-first on either side of the book:
//! on the bid side a higher price is "more aggressive" and sorts first, on
//! the ask side a lower price does. The market-order sentinel (price `0`)
//! sorts first on either side, ahead of any limit price.

use crate::types::{Price, Side, MARKET_ORDER_PRICE};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparablePrice {
    side: Side,
    price: Price,
}

impl ComparablePrice {
    pub fn new(side: Side, price: Price) -> Self {
        ComparablePrice { side, price }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_market(&self) -> bool {
        self.price == MARKET_ORDER_PRICE
    }

    /// True when this held limit crosses or meets `rhs`. A market sentinel
    /// on either side always matches.
    pub fn matches(&self, rhs: Price) -> bool {
        if self.is_market() || rhs == MARKET_ORDER_PRICE {
            return true;
        }
        match self.side {
            Side::Buy => self.price >= rhs,
            Side::Sell => self.price <= rhs,
        }
    }
}

impl PartialOrd for ComparablePrice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ComparablePrice {
    fn cmp(&self, other: &Self) -> Ordering {
        debug_assert_eq!(self.side, other.side, "ComparablePrice keys must share a side within one map");
        match (self.is_market(), other.is_market()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => match self.side {
                // Higher price is more aggressive on the bid side, so it
                // must sort first -> reverse the natural numeric order.
                Side::Buy => other.price.cmp(&self.price),
                // Lower price is more aggressive on the ask side, natural
                // ascending order already sorts it first.
                Side::Sell => self.price.cmp(&other.price),
            },
        }
    }
}
