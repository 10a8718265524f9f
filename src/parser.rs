//! Line-oriented command protocol (§6): `BUY`/`SELL`/`MODIFY`/`CANCEL`/
//! `PRINT`, one command per line, space-separated fields.

use crate::types::{OrderConditions, OrderId, Price, Quantity, Side};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Enter { side: Side, conditions: OrderConditions, price: Price, quantity: Quantity, order_id: OrderId },
    Modify { order_id: OrderId, side: Side, price: Price, quantity: Quantity },
    Cancel { order_id: OrderId },
    Print,
}

/// Parses one line of the command protocol. Returns `None` for a blank
/// line or an unrecognized verb — both are skipped, not errors (§7 item 1
/// logs the rejection at the call site, not here).
pub fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim_end_matches('\r');
    let mut fields = line.split(' ').filter(|f| !f.is_empty());
    let verb = fields.next()?;

    match verb {
        "BUY" | "SELL" => {
            let side = if verb == "BUY" { Side::Buy } else { Side::Sell };
            let mut next = fields.next()?;

            let mut conditions = OrderConditions::NONE;
            if next == "IOC" {
                conditions |= OrderConditions::IMMEDIATE_OR_CANCEL;
                next = fields.next()?;
            }
            let price: Price = next.parse().ok()?;
            let quantity: Quantity = fields.next()?.parse().ok()?;
            let order_id = fields.next()?.to_string();
            Some(Command::Enter { side, conditions, price, quantity, order_id })
        }
        "MODIFY" => {
            let order_id = fields.next()?.to_string();
            let side = match fields.next()? {
                "BUY" => Side::Buy,
                "SELL" => Side::Sell,
                _ => return None,
            };
            let price: Price = fields.next()?.parse().ok()?;
            let quantity: Quantity = fields.next()?.parse().ok()?;
            Some(Command::Modify { order_id, side, price, quantity })
        }
        "CANCEL" => {
            let order_id = fields.next()?.to_string();
            Some(Command::Cancel { order_id })
        }
        "PRINT" => Some(Command::Print),
        _ => None,
    }
}
