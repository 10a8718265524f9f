//! Primitive types shared across the matching engine.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-negative price. The sentinel [`MARKET_ORDER_PRICE`] denotes a market
/// order (no limit).
pub type Price = u64;

/// Non-negative order size.
pub type Quantity = u64;

/// `price * quantity`, accumulated across fills.
pub type Cost = u64;

/// Monotonically increasing identifier minted per trade.
pub type FillId = u64;

/// Signed replace-size change. `0` means "unchanged".
pub type Delta = i64;

/// `0` is used as a sentinel meaning "no limit" (market order) on `Add`, and
/// "unchanged" when applying a replace.
pub const MARKET_ORDER_PRICE: Price = 0;

/// Sentinel for `Replace`: a new price of `PRICE_UNCHANGED` leaves the
/// resting order's price untouched.
pub const PRICE_UNCHANGED: Price = 0;

/// Sentinel for `Replace`: a size delta of `SIZE_UNCHANGED` leaves the
/// resting order's quantity untouched.
pub const SIZE_UNCHANGED: Delta = 0;

/// Opaque order identifier, supplied by the command source.
pub type OrderId = String;

/// Opaque book identifier. Wrapped rather than a bare `String` so call sites
/// can't accidentally pass an `OrderId` where a `Symbol` is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Symbol(s.into())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol(s)
    }
}

/// Which book side an order or resting tracker belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn is_buy(self) -> bool {
        matches!(self, Side::Buy)
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

bitflags! {
    /// Condition flags attached to an order at entry time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OrderConditions: u8 {
        const NONE = 0;
        const ALL_OR_NONE = 1 << 0;
        const IMMEDIATE_OR_CANCEL = 1 << 1;
    }
}

impl Default for OrderConditions {
    fn default() -> Self {
        OrderConditions::NONE
    }
}
