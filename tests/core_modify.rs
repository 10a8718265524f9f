//! End-to-end modify/replace coverage (spec §4.3, scenario 6 in §8), driven
//! through `Market`.

mod support;

use order_book_engine::order::OrderState;
use order_book_engine::types::{Side, Symbol};
use support::{new_market, run};

#[test]
fn same_side_replace_loses_time_priority() {
    let symbol = Symbol::new("X");
    let mut market = new_market(&symbol);
    let orders = run(
        &mut market,
        &symbol,
        &["BUY 100 5 b1", "BUY 100 5 b2", "MODIFY b1 BUY 100 5", "SELL 100 5 s1"],
    );

    let s1 = orders["s1"].borrow();
    assert_eq!(s1.trades().len(), 1);
    assert_eq!(s1.trades()[0].matched_order_id, "b2");
}

#[test]
fn side_flip_replace_acts_as_cancel_and_new() {
    let symbol = Symbol::new("X");
    let mut market = new_market(&symbol);
    run(&mut market, &symbol, &["BUY 100 5 b1", "MODIFY b1 SELL 100 5"]);

    let book = market.book(&symbol).unwrap();
    assert!(book.depth(Side::Buy).is_empty());
    assert_eq!(book.depth(Side::Sell), vec![(100, 5)]);
}

#[test]
fn replace_not_found_is_rejected() {
    let symbol = Symbol::new("X");
    let mut market = new_market(&symbol);
    let orders = run(&mut market, &symbol, &["MODIFY ghost BUY 100 5"]);

    // `order_modify` bails out before constructing any event for an unknown
    // id, so the replacement order object this harness built never gets
    // touched at all — no Accept, no history.
    assert!(orders["ghost"].borrow().history().is_empty());
}

#[test]
fn replace_against_a_resting_order_is_rejected_when_not_on_book() {
    let symbol = Symbol::new("X");
    let mut market = new_market(&symbol);
    let first = run(&mut market, &symbol, &["BUY 100 5 b1", "CANCEL b1"]);
    let original_b1 = first["b1"].clone();
    let second = run(&mut market, &symbol, &["MODIFY b1 BUY 100 5"]);

    // The original order was cancelled, not replaced.
    assert_eq!(original_b1.borrow().quantity(), 5);
    assert!(original_b1.borrow().history().iter().any(|h| matches!(h.state, OrderState::Cancelled)));
    // And the replacement object never gets an Accept, since `order_modify`
    // bails out before calling `book.replace` once the id is gone from the
    // index.
    assert!(second["b1"].borrow().history().is_empty());
    assert!(market.book(&symbol).unwrap().depth(Side::Buy).is_empty());
}

#[test]
fn replace_to_price_zero_is_rejected_rather_than_resting_a_market_order() {
    let symbol = Symbol::new("X");
    let mut market = new_market(&symbol);
    let orders = run(&mut market, &symbol, &["BUY 100 5 b1", "MODIFY b1 BUY 0 5"]);

    assert!(orders["b1"].borrow().history().is_empty());
    assert_eq!(market.book(&symbol).unwrap().depth(Side::Buy), vec![(100, 5)]);
}

#[test]
fn replace_with_size_delta_adjusts_quantity_and_price() {
    let symbol = Symbol::new("X");
    let mut market = new_market(&symbol);
    let orders = run(&mut market, &symbol, &["BUY 100 5 b1", "MODIFY b1 BUY 105 8"]);

    let book = market.book(&symbol).unwrap();
    assert_eq!(book.depth(Side::Buy), vec![(105, 8)]);

    let new_b1 = orders["b1"].borrow();
    assert_eq!(new_b1.quantity(), 8);
    assert_eq!(new_b1.price(), 105);
}
