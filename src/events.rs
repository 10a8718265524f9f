//! The event queue that decouples book mutation from observation.
//!
//! Every state-mutating path on `OrderBook` appends `Event`s rather than
//! invoking observers inline; `OrderBook::drain` then dispatches them under
//! a re-entrancy guard (see `book.rs`).

use crate::errors::{CancelRejectReason, RejectReason, ReplaceRejectReason};
use crate::order::Order;
use crate::types::{Delta, FillId, OrderId, Price, Quantity, Symbol};
use std::cell::RefCell;
use std::rc::Rc;

pub type OrderRef = Rc<RefCell<Order>>;

#[derive(Clone)]
pub enum Event {
    Accept {
        order: OrderRef,
    },
    Reject {
        order: OrderRef,
        reason: RejectReason,
    },
    Fill {
        inbound: OrderRef,
        matched: OrderRef,
        quantity: Quantity,
        price: Price,
    },
    Cancel {
        order: OrderRef,
        open_qty: Quantity,
    },
    CancelReject {
        order: OrderRef,
        reason: CancelRejectReason,
    },
    Replace {
        old_order: OrderRef,
        open_qty: Quantity,
        new_order: OrderRef,
        size_delta: Delta,
        new_price: Price,
    },
    ReplaceReject {
        order: OrderRef,
        reason: ReplaceRejectReason,
    },
    BookUpdate {
        symbol: Symbol,
    },
}

/// Observer hook invoked by `OrderBook::perform_callback` while draining.
/// All methods default to a no-op so implementors only override what they
/// care about, matching the original's virtual-with-TODO-body hooks for
/// `OnOrderBookChange`/`OnTrade`.
pub trait BookListener {
    #[allow(clippy::too_many_arguments)]
    fn on_trade(&mut self, _symbol: &Symbol, _fill_id: FillId, _buy_id: &OrderId, _sell_id: &OrderId, _qty: Quantity, _price: Price, _buyer_maker: bool) {}
    fn on_book_update(&mut self, _symbol: &Symbol) {}
}

/// A listener that does nothing; the default when no observer is wired up.
pub struct NullListener;

impl BookListener for NullListener {}
