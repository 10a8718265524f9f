//! Price-level book for a single symbol: matching algorithm, event queue,
//! and the re-entrant drain loop that delivers events to an observer.

use crate::errors::{CancelRejectReason, RejectReason, ReplaceRejectReason};
use crate::events::{BookListener, Event, NullListener, OrderRef};
use crate::price::ComparablePrice;
use crate::tracker::OrderTracker;
use crate::types::{FillId, OrderConditions, Price, Quantity, Side, Symbol, MARKET_ORDER_PRICE};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

type SideMap = BTreeMap<ComparablePrice, VecDeque<OrderTracker>>;

/// A point-in-time read-only view of a book's aggregated depth, for the
/// HTTP surface and `PRINT`-style dumps.
#[derive(Debug, Clone, Serialize)]
pub struct BookSnapshot {
    pub symbol: Symbol,
    pub bids: Vec<(Price, Quantity)>,
    pub asks: Vec<(Price, Quantity)>,
}

pub struct OrderBook {
    symbol: Symbol,
    bids: SideMap,
    asks: SideMap,
    market_price: Price,
    events: Vec<Event>,
    draining: bool,
    fill_id_counter: Rc<Cell<FillId>>,
    listener: Rc<RefCell<dyn BookListener>>,
}

impl OrderBook {
    pub fn new(symbol: Symbol, fill_id_counter: Rc<Cell<FillId>>) -> Self {
        OrderBook {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            market_price: MARKET_ORDER_PRICE,
            events: Vec::new(),
            draining: false,
            fill_id_counter,
            listener: Rc::new(RefCell::new(NullListener)),
        }
    }

    pub fn with_listener(mut self, listener: Rc<RefCell<dyn BookListener>>) -> Self {
        self.listener = listener;
        self
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn market_price(&self) -> Price {
        self.market_price
    }

    /// Entry protocol (§4.2). Returns whether the inbound order matched
    /// anything.
    pub fn add(&mut self, order: OrderRef, conditions: OrderConditions) -> bool {
        let mut matched = false;
        // Quantity is unsigned, so "quantity <= 0" collapses to "== 0".
        let quantity = order.borrow().quantity();
        if quantity == 0 {
            self.events.push(Event::Reject { order, reason: RejectReason::NonPositiveSize });
        } else {
            self.events.push(Event::Accept { order: order.clone() });
            let mut inbound = OrderTracker::new(order.clone(), conditions);
            let order_price = order.borrow().price();
            matched = self.add_order(&mut inbound, order_price);
            if inbound.immediate_or_cancel() && !inbound.filled() {
                self.events.push(Event::Cancel { order: order.clone(), open_qty: 0 });
            }
            self.events.push(Event::BookUpdate { symbol: self.symbol.clone() });
        }
        self.drain();
        matched
    }

    pub fn cancel(&mut self, order: &OrderRef) {
        let is_buy = order.borrow().is_buy();
        let price = order.borrow().price();
        let key = ComparablePrice::new(if is_buy { Side::Buy } else { Side::Sell }, price);
        let side_map = if is_buy { &mut self.bids } else { &mut self.asks };

        let open_qty = {
            let found = find_on_market(side_map, &key, order);
            found.map(|idx| {
                let queue = side_map.get_mut(&key).expect("key located by find_on_market");
                let tracker = queue.remove(idx).expect("index located by find_on_market");
                if queue.is_empty() {
                    side_map.remove(&key);
                }
                tracker.open_qty()
            })
        };

        match open_qty {
            Some(open_qty) => {
                self.events.push(Event::Cancel { order: order.clone(), open_qty });
                self.events.push(Event::BookUpdate { symbol: self.symbol.clone() });
            }
            None => {
                self.events.push(Event::CancelReject { order: order.clone(), reason: CancelRejectReason::NotFound });
            }
        }
        self.drain();
    }

    /// Replace protocol (§4.3). Returns whether the replacement matched
    /// anything.
    pub fn replace(&mut self, old_order: &OrderRef, new_order: OrderRef) -> bool {
        let old_is_buy = old_order.borrow().is_buy();
        let new_is_buy = new_order.borrow().is_buy();

        if old_is_buy != new_is_buy {
            let old_price = old_order.borrow().price();
            let key = ComparablePrice::new(if old_is_buy { Side::Buy } else { Side::Sell }, old_price);
            let side_map = if old_is_buy { &mut self.bids } else { &mut self.asks };
            let found = find_on_market(side_map, &key, old_order);
            match found {
                Some(idx) => {
                    let queue = side_map.get_mut(&key).expect("key located by find_on_market");
                    queue.remove(idx);
                    if queue.is_empty() {
                        side_map.remove(&key);
                    }
                    self.events.push(Event::BookUpdate { symbol: self.symbol.clone() });
                    // Cancel-plus-new: the fresh Add drains on its own.
                    self.add(new_order, OrderConditions::NONE)
                }
                None => {
                    self.events.push(Event::ReplaceReject { order: new_order, reason: ReplaceRejectReason::NotFound });
                    self.drain();
                    false
                }
            }
        } else {
            let old_price = old_order.borrow().price();
            let key = ComparablePrice::new(if old_is_buy { Side::Buy } else { Side::Sell }, old_price);
            let side_map = if old_is_buy { &mut self.bids } else { &mut self.asks };
            let found = find_on_market(side_map, &key, old_order);
            let matched = match found {
                Some(idx) => {
                    let open_qty = {
                        let queue = side_map.get_mut(&key).expect("key located by find_on_market");
                        let old_tracker = queue.remove(idx).expect("index located by find_on_market");
                        if queue.is_empty() {
                            side_map.remove(&key);
                        }
                        old_tracker.open_qty()
                    };
                    let old_quantity = old_order.borrow().quantity() as i64;
                    let new_quantity = new_order.borrow().quantity() as i64;
                    let size_delta = new_quantity - old_quantity;
                    let new_price = new_order.borrow().price();

                    self.events.push(Event::Accept { order: new_order.clone() });
                    self.events.push(Event::Replace {
                        old_order: old_order.clone(),
                        open_qty,
                        new_order: new_order.clone(),
                        size_delta,
                        new_price,
                    });
                    // Re-queues at the back of its new price level: replace
                    // always loses time priority, even when price/size are
                    // unchanged.
                    let mut inbound = OrderTracker::new(new_order.clone(), OrderConditions::NONE);
                    let matched = self.add_order(&mut inbound, new_price);
                    self.events.push(Event::BookUpdate { symbol: self.symbol.clone() });
                    matched
                }
                None => {
                    self.events.push(Event::ReplaceReject { order: new_order.clone(), reason: ReplaceRejectReason::NotFound });
                    false
                }
            };
            self.drain();
            matched
        }
    }

    /// Aggregated open quantity per price, descending by price — the shape
    /// `PRINT`/the HTTP book snapshot need.
    pub fn depth(&self, side: Side) -> Vec<(Price, Quantity)> {
        let map = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        let mut levels: BTreeMap<Price, Quantity> = BTreeMap::new();
        for queue in map.values() {
            for tracker in queue {
                *levels.entry(tracker.order().borrow().price()).or_insert(0) += tracker.open_qty();
            }
        }
        levels.into_iter().rev().collect()
    }

    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot { symbol: self.symbol.clone(), bids: self.depth(Side::Buy), asks: self.depth(Side::Sell) }
    }

    pub fn log(&self) {
        tracing::info!("SELL:");
        for (price, qty) in self.depth(Side::Sell) {
            tracing::info!("{} {}", price, qty);
        }
        tracing::info!("BUY:");
        for (price, qty) in self.depth(Side::Buy) {
            tracing::info!("{} {}", price, qty);
        }
    }

    fn add_order(&mut self, inbound: &mut OrderTracker, order_price: Price) -> bool {
        let is_buy = inbound.order().borrow().is_buy();
        let matched = if is_buy {
            match_order(inbound, order_price, &mut self.asks, &mut self.market_price, &mut self.events)
        } else {
            match_order(inbound, order_price, &mut self.bids, &mut self.market_price, &mut self.events)
        };

        if inbound.open_qty() > 0 && !inbound.immediate_or_cancel() {
            let side = if is_buy { Side::Buy } else { Side::Sell };
            let key = ComparablePrice::new(side, order_price);
            let side_map = if is_buy { &mut self.bids } else { &mut self.asks };
            side_map.entry(key).or_default().push_back(inbound.clone());
        }
        matched
    }

    fn drain(&mut self) {
        if self.draining {
            return;
        }
        self.draining = true;
        while !self.events.is_empty() {
            let working = std::mem::take(&mut self.events);
            for event in working {
                self.perform_callback(event);
            }
        }
        self.draining = false;
    }

    fn perform_callback(&mut self, event: Event) {
        match event {
            Event::Accept { order } => {
                order.borrow_mut().on_accepted();
            }
            Event::Reject { order, reason } => {
                order.borrow_mut().on_rejected(&reason.to_string());
            }
            Event::Fill { inbound, matched, quantity, price } => {
                self.on_fill(inbound, matched, quantity, price);
            }
            Event::Cancel { order, .. } => {
                order.borrow_mut().on_cancelled();
            }
            Event::CancelReject { order, reason } => {
                order.borrow_mut().on_cancel_rejected(&reason.to_string());
            }
            Event::Replace { old_order, open_qty, new_order, size_delta, new_price } => {
                // The passivated (old) order records the replace in its own
                // history; the tracker now resting on the book already
                // wraps `new_order` directly, built with its final fields.
                old_order.borrow_mut().on_replaced(size_delta, new_price);
                tracing::debug!(
                    old = %old_order.borrow().id(),
                    new = %new_order.borrow().id(),
                    open_qty,
                    size_delta,
                    new_price,
                    "order replaced"
                );
            }
            Event::ReplaceReject { order, reason } => {
                order.borrow_mut().on_replace_rejected(&reason.to_string());
            }
            Event::BookUpdate { symbol } => {
                self.notify(|listener| listener.on_book_update(&symbol));
            }
        }
    }

    fn on_fill(&mut self, inbound: OrderRef, matched: OrderRef, quantity: Quantity, price: Price) {
        let fill_cost = price * quantity;
        let fill_id = self.fill_id_counter.get() + 1;
        self.fill_id_counter.set(fill_id);

        inbound.borrow_mut().on_filled(quantity, fill_cost);
        matched.borrow_mut().on_filled(quantity, fill_cost);

        let (maker_id, maker_price) = {
            let m = matched.borrow();
            (m.id().clone(), m.price())
        };
        let (taker_id, taker_price) = {
            let t = inbound.borrow();
            (t.id().clone(), t.price())
        };

        tracing::info!("TRADE {} {} {} {} {} {}", maker_id, maker_price, quantity, taker_id, taker_price, quantity);

        let matched_remaining = matched.borrow().quantity_on_market();
        inbound.borrow_mut().add_trade_history(quantity, matched_remaining, fill_cost, maker_id.clone(), maker_price, fill_id);
        let inbound_remaining = inbound.borrow().quantity_on_market();
        matched.borrow_mut().add_trade_history(quantity, inbound_remaining, fill_cost, taker_id.clone(), taker_price, fill_id);

        // The resting side is always the maker.
        let buyer_maker = matched.borrow().is_buy();
        let (buy_id, sell_id) =
            if buyer_maker { (maker_id, taker_id) } else { (taker_id, maker_id) };

        let symbol = self.symbol.clone();
        self.notify(|listener| listener.on_trade(&symbol, fill_id, &buy_id, &sell_id, quantity, price, buyer_maker));
    }

    /// Runs an observer hook under `catch_unwind` — a panicking observer is
    /// logged and the drain continues (§7 item 4), it never aborts the
    /// engine.
    fn notify(&self, call: impl FnOnce(&mut dyn BookListener)) {
        let listener = Rc::clone(&self.listener);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            call(&mut *listener.borrow_mut());
        }));
        if result.is_err() {
            tracing::error!("caught panic raised from a book observer callback");
        }
    }
}

fn find_on_market(side_map: &SideMap, key: &ComparablePrice, order: &OrderRef) -> Option<usize> {
    side_map.get(key)?.iter().position(|tracker| tracker.is_same_order(order))
}

/// AON short-circuits to "no trade" — the flag round-trips through the type
/// system but a real contiguous-quantity scan across levels is not
/// implemented (spec §9).
fn match_order(
    inbound: &mut OrderTracker,
    inbound_price: Price,
    opposite: &mut SideMap,
    market_price: &mut Price,
    events: &mut Vec<Event>,
) -> bool {
    if inbound.all_or_none() {
        return false;
    }
    match_regular_order(inbound, inbound_price, opposite, market_price, events)
}

fn match_regular_order(
    inbound: &mut OrderTracker,
    inbound_price: Price,
    current_orders: &mut SideMap,
    market_price: &mut Price,
    events: &mut Vec<Event>,
) -> bool {
    let mut matched = false;
    let mut drained_keys = Vec::new();

    for (key, queue) in current_orders.iter_mut() {
        if inbound.filled() {
            break;
        }
        if !key.matches(inbound_price) {
            break;
        }
        if match_level(queue, inbound, market_price, events) {
            matched = true;
        }
        if queue.is_empty() {
            drained_keys.push(*key);
        }
    }
    for key in drained_keys {
        current_orders.remove(&key);
    }
    matched
}

/// Walks one price level's FIFO queue front-to-back. A cold cross (no
/// reference price) leaves the resting tracker untouched and advances past
/// it rather than retrying forever (§7 item 3).
fn match_level(
    queue: &mut VecDeque<OrderTracker>,
    inbound: &mut OrderTracker,
    market_price: &mut Price,
    events: &mut Vec<Event>,
) -> bool {
    let mut matched = false;
    let mut i = 0;
    while i < queue.len() && !inbound.filled() {
        let resting = &mut queue[i];
        let traded = create_trade(inbound, resting, u64::MAX, market_price, events);
        if traded > 0 {
            matched = true;
        }
        if resting.filled() {
            queue.remove(i);
        } else {
            i += 1;
        }
    }
    matched
}

/// Cross-price cascade (§4.2): resting's limit, else inbound's limit, else
/// the book's last trade price, else abort (no reference price available).
fn create_trade(
    inbound: &mut OrderTracker,
    resting: &mut OrderTracker,
    max_quantity: Quantity,
    market_price: &mut Price,
    events: &mut Vec<Event>,
) -> Quantity {
    let mut cross_price = resting.order().borrow().price();
    if cross_price == MARKET_ORDER_PRICE {
        cross_price = inbound.order().borrow().price();
    }
    if cross_price == MARKET_ORDER_PRICE {
        cross_price = *market_price;
    }
    if cross_price == MARKET_ORDER_PRICE {
        return 0;
    }

    let fill_qty = max_quantity.min(inbound.open_qty()).min(resting.open_qty());
    if fill_qty > 0 {
        inbound.fill(fill_qty);
        resting.fill(fill_qty);
        *market_price = cross_price;
        events.push(Event::Fill {
            inbound: inbound.order().clone(),
            matched: resting.order().clone(),
            quantity: fill_qty,
            price: cross_price,
        });
    }
    fill_qty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Order;
    use std::cell::RefCell;

    fn counter() -> Rc<Cell<FillId>> {
        Rc::new(Cell::new(0))
    }

    fn book() -> OrderBook {
        OrderBook::new(Symbol::new("X"), counter())
    }

    fn order(id: &str, side: Side, qty: Quantity, price: Price) -> OrderRef {
        Rc::new(RefCell::new(Order::new(id.into(), side, Symbol::new("X"), qty, price)))
    }

    #[test]
    fn crossing_limit_partial_fill_rests_remainder() {
        let mut b = book();
        let s1 = order("s1", Side::Sell, 4, 100);
        b.add(s1.clone(), OrderConditions::NONE);
        let b1 = order("b1", Side::Buy, 10, 100);
        let matched = b.add(b1.clone(), OrderConditions::NONE);

        assert!(matched);
        assert_eq!(s1.borrow().quantity_filled(), 4);
        assert_eq!(b1.borrow().quantity_on_market(), 6);
        assert_eq!(b1.borrow().trades().len(), 1);
        assert_eq!(b1.borrow().trades()[0].price, 100);
    }

    #[test]
    fn price_priority_best_price_first() {
        let mut b = book();
        b.add(order("s1", Side::Sell, 5, 101), OrderConditions::NONE);
        b.add(order("s2", Side::Sell, 5, 100), OrderConditions::NONE);
        let b1 = order("b1", Side::Buy, 7, 101);
        b.add(b1.clone(), OrderConditions::NONE);

        let b1 = b1.borrow();
        let trades = b1.trades();
        assert_eq!(trades[0].matched_order_id, "s2");
        assert_eq!(trades[0].quantity, 5);
        assert_eq!(trades[0].price, 100);
        assert_eq!(trades[1].matched_order_id, "s1");
        assert_eq!(trades[1].quantity, 2);
        assert_eq!(trades[1].price, 101);
    }

    #[test]
    fn time_priority_fifo_within_level() {
        let mut b = book();
        b.add(order("s1", Side::Sell, 4, 100), OrderConditions::NONE);
        b.add(order("s2", Side::Sell, 6, 100), OrderConditions::NONE);
        let b1 = order("b1", Side::Buy, 4, 100);
        b.add(b1, OrderConditions::NONE);

        assert_eq!(b.depth(Side::Sell), vec![(100, 6)]);
    }

    #[test]
    fn market_on_cold_book_rests_without_trade() {
        let mut b = book();
        let b1 = order("b1", Side::Buy, 5, MARKET_ORDER_PRICE);
        let matched = b.add(b1.clone(), OrderConditions::NONE);
        assert!(!matched);
        assert_eq!(b1.borrow().quantity_on_market(), 5);

        let s1 = order("s1", Side::Sell, 5, MARKET_ORDER_PRICE);
        let matched = b.add(s1.clone(), OrderConditions::NONE);
        assert!(!matched);
        assert_eq!(s1.borrow().quantity_on_market(), 5);
    }

    #[test]
    fn ioc_residual_is_cancelled_not_rested() {
        let mut b = book();
        b.add(order("s1", Side::Sell, 5, 100), OrderConditions::NONE);
        let b1 = order("b1", Side::Buy, 10, 100);
        b.add(b1.clone(), OrderConditions::IMMEDIATE_OR_CANCEL);

        assert_eq!(b1.borrow().quantity_filled(), 5);
        assert_eq!(b1.borrow().quantity_on_market(), 0);
        assert!(b.depth(Side::Buy).is_empty());
    }

    #[test]
    fn reject_on_non_positive_size() {
        let mut b = book();
        let b1 = order("b1", Side::Buy, 0, 100);
        let matched = b.add(b1.clone(), OrderConditions::NONE);
        assert!(!matched);
        assert!(b1.borrow().history().iter().any(|h| matches!(h.state, crate::order::OrderState::Rejected)));
    }

    #[test]
    fn cancel_restores_depth() {
        let mut b = book();
        let b1 = order("b1", Side::Buy, 10, 100);
        b.add(b1.clone(), OrderConditions::NONE);
        assert_eq!(b.depth(Side::Buy), vec![(100, 10)]);
        b.cancel(&b1);
        assert!(b.depth(Side::Buy).is_empty());
    }

    #[test]
    fn cancel_not_found_is_rejected() {
        let mut b = book();
        let b1 = order("ghost", Side::Buy, 10, 100);
        b.cancel(&b1);
        assert!(b1.borrow().history().iter().any(|h| matches!(h.state, crate::order::OrderState::CancelRejected)));
    }

    #[test]
    fn find_on_market_scans_duplicates_at_same_price() {
        let mut b = book();
        let b1 = order("b1", Side::Buy, 5, 100);
        let b2 = order("b2", Side::Buy, 5, 100);
        b.add(b1.clone(), OrderConditions::NONE);
        b.add(b2.clone(), OrderConditions::NONE);
        b.cancel(&b1);
        assert_eq!(b.depth(Side::Buy), vec![(100, 5)]);
        // b2 should still be the one resting.
        let key = ComparablePrice::new(Side::Buy, 100);
        assert!(find_on_market(&b.bids, &key, &b2).is_some());
    }

    #[test]
    fn replace_same_side_loses_time_priority() {
        let mut b = book();
        let b1 = order("b1", Side::Buy, 5, 100);
        let b2 = order("b2", Side::Buy, 5, 100);
        b.add(b1.clone(), OrderConditions::NONE);
        b.add(b2.clone(), OrderConditions::NONE);

        let new_b1 = order("b1", Side::Buy, 5, 100);
        b.replace(&b1, new_b1.clone());

        let s1 = order("s1", Side::Sell, 5, 100);
        b.add(s1.clone(), OrderConditions::NONE);

        assert_eq!(s1.borrow().trades()[0].matched_order_id, "b2");
    }

    #[test]
    fn replace_side_flip_acts_as_cancel_and_new() {
        let mut b = book();
        let b1 = order("b1", Side::Buy, 5, 100);
        b.add(b1.clone(), OrderConditions::NONE);

        let new_sell = order("b1", Side::Sell, 5, 100);
        b.replace(&b1, new_sell.clone());

        assert!(b.depth(Side::Buy).is_empty());
        assert_eq!(b.depth(Side::Sell), vec![(100, 5)]);
    }

    #[test]
    fn all_or_none_never_matches() {
        let mut b = book();
        b.add(order("s1", Side::Sell, 10, 100), OrderConditions::NONE);
        let b1 = order("b1", Side::Buy, 10, 100);
        let matched = b.add(b1.clone(), OrderConditions::ALL_OR_NONE);
        assert!(!matched);
        assert_eq!(b1.borrow().quantity_on_market(), 10);
    }
}
