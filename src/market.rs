//! Registry of per-symbol books plus the order-id index, and the
//! validation/GC wrapper around each entry/modify/cancel command (§4.5).

use crate::book::OrderBook;
use crate::events::{BookListener, NullListener, OrderRef};
use crate::types::{FillId, MARKET_ORDER_PRICE, OrderConditions, OrderId, Symbol};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

pub struct Market {
    orders: HashMap<OrderId, OrderRef>,
    books: HashMap<Symbol, OrderBook>,
    fill_id_counter: Rc<Cell<FillId>>,
    listener: Rc<RefCell<dyn BookListener>>,
}

impl Market {
    pub fn new() -> Self {
        Market {
            orders: HashMap::new(),
            books: HashMap::new(),
            fill_id_counter: Rc::new(Cell::new(0)),
            listener: Rc::new(RefCell::new(NullListener)),
        }
    }

    pub fn with_listener(listener: Rc<RefCell<dyn BookListener>>) -> Self {
        Market { listener, ..Market::new() }
    }

    /// `insert_or_assign`: returns whether a new book was created (an
    /// existing one for `symbol` is replaced, not merged).
    pub fn add_book(&mut self, symbol: Symbol) -> bool {
        tracing::info!(%symbol, "create new depth order book");
        let book = OrderBook::new(symbol.clone(), self.fill_id_counter.clone())
            .with_listener(self.listener.clone());
        self.books.insert(symbol, book).is_none()
    }

    pub fn book(&self, symbol: &Symbol) -> Option<&OrderBook> {
        self.books.get(symbol)
    }

    /// Validates symbol + duplicate id, inserts into the order index, then
    /// hands off to the book. After a match, sweeps counterparties (and the
    /// inbound itself) that are now fully filled out of the order index.
    pub fn order_entry(&mut self, order: OrderRef, conditions: OrderConditions) -> bool {
        let symbol = order.borrow().symbol().clone();
        if !self.books.contains_key(&symbol) {
            tracing::error!(%symbol, "order entry rejected: unknown symbol");
            return false;
        }
        let order_id = order.borrow().id().clone();
        if self.orders.contains_key(&order_id) {
            tracing::error!(%order_id, "order entry rejected: duplicate order id");
            return false;
        }
        tracing::info!(%order_id, "adding order");
        self.orders.insert(order_id.clone(), order.clone());

        let book = self.books.get_mut(&symbol).expect("checked above");
        let matched = book.add(order.clone(), conditions);
        if matched {
            tracing::info!(%order_id, "order matched");
            self.gc_trade_counterparties(&order);
        }
        self.gc_if_done(&order_id);
        true
    }

    /// Replaces the order bound to `new_order`'s id. The Market index is
    /// always rebound to `new_order`, whether the book took the side-flip
    /// (cancel+new) or same-side (replace-in-place) path — see spec §9's
    /// open question on same-id replace. Price 0 only names a market order
    /// at initial entry; a replace naming it is rejected rather than
    /// silently resting a market order.
    pub fn order_modify(&mut self, new_order: OrderRef) -> bool {
        let symbol = new_order.borrow().symbol().clone();
        if !self.books.contains_key(&symbol) {
            tracing::error!(%symbol, "order modify rejected: unknown symbol");
            return false;
        }
        if new_order.borrow().price() == MARKET_ORDER_PRICE {
            tracing::error!("order modify rejected: price 0 only names a market order at initial entry, not a replace");
            return false;
        }
        let order_id = new_order.borrow().id().clone();
        let Some(old_order) = self.orders.get(&order_id).cloned() else {
            tracing::debug!(%order_id, "can't find order id");
            return false;
        };
        tracing::info!(%order_id, "modifying passivated order");

        let book = self.books.get_mut(&symbol).expect("checked above");
        let matched = book.replace(&old_order, new_order.clone());

        self.orders.insert(order_id.clone(), new_order.clone());
        if matched {
            self.gc_trade_counterparties(&new_order);
        }
        self.gc_if_done(&order_id);
        true
    }

    pub fn order_cancel(&mut self, order_id: &OrderId) -> bool {
        let Some(order) = self.orders.get(order_id).cloned() else {
            tracing::debug!(%order_id, "can't find order id");
            return false;
        };
        tracing::info!(%order_id, "requesting cancel");
        let symbol = order.borrow().symbol().clone();
        if let Some(book) = self.books.get_mut(&symbol) {
            book.cancel(&order);
        }
        self.remove_order(order_id)
    }

    pub fn log(&self) {
        for book in self.books.values() {
            book.log();
        }
    }

    fn gc_trade_counterparties(&mut self, order: &OrderRef) {
        let matched_ids: Vec<OrderId> =
            order.borrow().trades().iter().map(|t| t.matched_order_id.clone()).collect();
        for matched_id in matched_ids {
            let done = self.orders.get(&matched_id).map(|o| o.borrow().quantity_on_market() == 0);
            if done == Some(true) {
                self.remove_order(&matched_id);
            }
        }
    }

    fn gc_if_done(&mut self, order_id: &OrderId) {
        let done = self.orders.get(order_id).map(|o| o.borrow().quantity_on_market() == 0);
        if done == Some(true) {
            self.remove_order(order_id);
        }
    }

    fn remove_order(&mut self, order_id: &OrderId) -> bool {
        self.orders.remove(order_id).is_some()
    }
}

impl Default for Market {
    fn default() -> Self {
        Market::new()
    }
}
