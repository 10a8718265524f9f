//! Trade record observed at the API boundary — the `on_trade` event
//! flattened into something `serde` can hand back over HTTP.

use crate::types::{FillId, OrderId, Price, Quantity, Symbol};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: Symbol,
    pub buy_id: OrderId,
    pub sell_id: OrderId,
    pub price: Price,
    pub quantity: Quantity,
    pub buyer_maker: bool,
    pub fill_id: FillId,
    pub timestamp: SystemTime,
}
