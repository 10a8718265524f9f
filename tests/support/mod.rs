//! Shared harness for the end-to-end integration tests: drives a `Market`
//! straight off the §6 text protocol (mirrors `main.rs`'s replay loop) and
//! hands back every order object constructed along the way, keyed by id, so
//! a test can inspect post-command state the way `main.rs` cannot (it only
//! observes the TRADE/PRINT output).

use order_book_engine::market::Market;
use order_book_engine::order::Order;
use order_book_engine::parser::{parse_line, Command};
use order_book_engine::types::Symbol;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type OrderRef = Rc<RefCell<Order>>;

pub fn run(market: &mut Market, symbol: &Symbol, lines: &[&str]) -> HashMap<String, OrderRef> {
    let mut orders = HashMap::new();
    for line in lines {
        match parse_line(line).unwrap_or_else(|| panic!("unparseable line: {line}")) {
            Command::Enter { side, conditions, price, quantity, order_id } => {
                let order = Rc::new(RefCell::new(Order::new(order_id.clone(), side, symbol.clone(), quantity, price)));
                market.order_entry(order.clone(), conditions);
                orders.insert(order_id, order);
            }
            Command::Modify { order_id, side, price, quantity } => {
                let order = Rc::new(RefCell::new(Order::new(order_id.clone(), side, symbol.clone(), quantity, price)));
                market.order_modify(order.clone());
                orders.insert(order_id, order);
            }
            Command::Cancel { order_id } => {
                market.order_cancel(&order_id);
            }
            Command::Print => market.log(),
        }
    }
    orders
}

pub fn new_market(symbol: &Symbol) -> Market {
    let mut market = Market::new();
    market.add_book(symbol.clone());
    market
}
