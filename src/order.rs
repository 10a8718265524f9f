//! Per-order mutable state: resting quantity, cumulative fill/cost, an
//! append-only lifecycle history, and the trade log of counterparties.

use crate::types::{Cost, Delta, FillId, OrderId, Price, Quantity, Side, Symbol, PRICE_UNCHANGED, SIZE_UNCHANGED};
use serde::Serialize;
use std::fmt;

/// Lifecycle tag recorded in an order's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderState {
    Accepted,
    Rejected,
    Modified,
    ModifyRejected,
    PartialFilled,
    Filled,
    CancelRejected,
    Cancelled,
}

/// One entry in an order's append-only history.
#[derive(Debug, Clone, Serialize)]
pub struct StateChange {
    pub state: OrderState,
    pub description: String,
}

impl StateChange {
    pub fn new(state: OrderState, description: impl Into<String>) -> Self {
        StateChange { state, description: description.into() }
    }
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.state, self.description)
    }
}

/// One fill recorded against an order's trade log.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedTrade {
    pub matched_order_id: OrderId,
    pub fill_cost: Cost,
    pub quantity: Quantity,
    pub quantity_on_market: Quantity,
    pub price: Price,
    pub fill_id: FillId,
}

/// A resting/filled/cancelled order. Owned by the `Market`, shared with at
/// most one `Book` while it rests (via `Rc<RefCell<Order>>`).
#[derive(Debug)]
pub struct Order {
    id: OrderId,
    side: Side,
    symbol: Symbol,
    quantity: Quantity,
    price: Price,
    quantity_filled: Quantity,
    quantity_on_market: Quantity,
    fill_cost: Cost,
    history: Vec<StateChange>,
    trades: Vec<MatchedTrade>,
}

impl Order {
    pub fn new(id: OrderId, side: Side, symbol: Symbol, quantity: Quantity, price: Price) -> Self {
        Order {
            id,
            side,
            symbol,
            quantity,
            price,
            quantity_filled: 0,
            quantity_on_market: 0,
            fill_cost: 0,
            history: Vec::new(),
            trades: Vec::new(),
        }
    }

    pub fn id(&self) -> &OrderId {
        &self.id
    }

    pub fn is_buy(&self) -> bool {
        self.side.is_buy()
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn quantity_on_market(&self) -> Quantity {
        self.quantity_on_market
    }

    pub fn quantity_filled(&self) -> Quantity {
        self.quantity_filled
    }

    pub fn fill_cost(&self) -> Cost {
        self.fill_cost
    }

    pub fn history(&self) -> &[StateChange] {
        &self.history
    }

    pub fn trades(&self) -> &[MatchedTrade] {
        &self.trades
    }

    /// Marks the order as resting at its full original quantity.
    pub fn on_accepted(&mut self) {
        self.quantity_on_market = self.quantity;
        self.history.push(StateChange::new(OrderState::Accepted, String::new()));
    }

    pub fn on_rejected(&mut self, reason: &str) {
        self.history.push(StateChange::new(OrderState::Rejected, reason.to_string()));
    }

    /// Decrements resting quantity and accumulates fill/cost bookkeeping.
    pub fn on_filled(&mut self, fill_qty: Quantity, fill_cost: Cost) {
        self.quantity_on_market -= fill_qty;
        self.fill_cost += fill_cost;
        self.quantity_filled += fill_qty;
        let state = if self.quantity_on_market == 0 { OrderState::Filled } else { OrderState::PartialFilled };
        self.history.push(StateChange::new(state, format!("filled {fill_qty} @ {fill_cost}")));
    }

    pub fn add_trade_history(
        &mut self,
        fill_qty: Quantity,
        remaining_qty: Quantity,
        fill_cost: Cost,
        matched_order_id: OrderId,
        price: Price,
        fill_id: FillId,
    ) {
        self.trades.push(MatchedTrade {
            matched_order_id,
            fill_cost,
            quantity: fill_qty,
            quantity_on_market: remaining_qty,
            price,
            fill_id,
        });
    }

    pub fn on_cancelled(&mut self) {
        self.quantity_on_market = 0;
        self.history.push(StateChange::new(OrderState::Cancelled, String::new()));
    }

    pub fn on_cancel_rejected(&mut self, reason: &str) {
        self.history.push(StateChange::new(OrderState::CancelRejected, reason.to_string()));
    }

    /// `size_delta != 0` adjusts quantity and open quantity; `new_price !=
    /// PRICE_UNCHANGED` updates the limit price. Both sentinels mean
    /// "unchanged".
    pub fn on_replaced(&mut self, size_delta: Delta, new_price: Price) {
        if size_delta != SIZE_UNCHANGED {
            self.quantity = (self.quantity as i64 + size_delta) as Quantity;
            self.quantity_on_market = (self.quantity_on_market as i64 + size_delta) as Quantity;
        }
        if new_price != PRICE_UNCHANGED {
            self.price = new_price;
        }
        self.history.push(StateChange::new(OrderState::Modified, format!("delta {size_delta}, price {new_price}")));
    }

    pub fn on_replace_rejected(&mut self, reason: &str) {
        self.history.push(StateChange::new(OrderState::ModifyRejected, reason.to_string()));
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[#{} {} {} {}", self.id, if self.is_buy() { "BUY" } else { "SELL" }, self.symbol, self.quantity)?;
        if self.price == 0 {
            write!(f, " MKT")?;
        } else {
            write!(f, " ${}", self.price)?;
        }
        if self.quantity_on_market != 0 {
            write!(f, " Open: {}", self.quantity_on_market)?;
        }
        if self.quantity_filled != 0 {
            write!(f, " FILLED: {}", self.quantity_filled)?;
        }
        if self.fill_cost != 0 {
            write!(f, " Cost: {}", self.fill_cost)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Order {
        Order::new("o1".into(), Side::Buy, Symbol::new("BTC-USD"), 10, 100)
    }

    #[test]
    fn accept_rests_full_quantity() {
        let mut o = sample();
        o.on_accepted();
        assert_eq!(o.quantity_on_market(), 10);
    }

    #[test]
    fn fill_conserves_quantity() {
        let mut o = sample();
        o.on_accepted();
        o.on_filled(4, 400);
        assert_eq!(o.quantity_filled() + o.quantity_on_market(), o.quantity());
        assert_eq!(o.fill_cost(), 400);
    }

    #[test]
    fn replace_applies_delta_and_price() {
        let mut o = sample();
        o.on_accepted();
        o.on_replaced(5, 105);
        assert_eq!(o.quantity(), 15);
        assert_eq!(o.quantity_on_market(), 15);
        assert_eq!(o.price(), 105);
    }

    #[test]
    fn replace_sentinels_mean_unchanged() {
        let mut o = sample();
        o.on_accepted();
        o.on_replaced(SIZE_UNCHANGED, PRICE_UNCHANGED);
        assert_eq!(o.quantity(), 10);
        assert_eq!(o.price(), 100);
    }
}
