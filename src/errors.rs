//! Error taxonomy. §7 items 1-3 (malformed input, validation failure,
//! no-reference market cross) are represented as typed reasons attached to
//! Reject/CancelReject/ReplaceReject events rather than `Result` errors —
//! they are reported to observers, not propagated. `EngineError` covers the
//! outer CLI/API boundary (§7 item 4's catch-and-log discipline lives in
//! `book::OrderBook::drain`, not here).

use thiserror::Error;

/// Why `OrderBook::add` rejected an inbound order outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("size must be positive")]
    NonPositiveSize,
}

/// Why `OrderBook::cancel` could not find the order to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelRejectReason {
    #[error("not found")]
    NotFound,
}

/// Why `OrderBook::replace` / `Market::order_modify` could not apply a
/// replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReplaceRejectReason {
    #[error("not found")]
    NotFound,
}

/// Errors surfaced at the CLI/API boundary, outside the core's event-based
/// reporting.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("duplicate order id: {0}")]
    DuplicateOrderId(String),

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("malformed command: {0}")]
    MalformedCommand(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
