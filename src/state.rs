//! Shared Axum state.
//!
//! `Market` is built on `Rc<RefCell<_>>` because the core is deliberately
//! single-threaded (spec §5's non-goal on cross-thread concurrency) — it is
//! not `Send`. To drive it from an async multi-connection HTTP server
//! without smuggling threading into the core, it runs on its own dedicated
//! OS thread behind a job queue; handlers submit a closure and await its
//! result instead of locking shared state directly.

use crate::errors::EngineError;
use crate::events::BookListener;
use crate::market::Market;
use crate::trade::Trade;
use crate::types::{FillId, OrderId, Price, Quantity, Symbol};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tokio::sync::{mpsc, oneshot};

type EngineJob = Box<dyn FnOnce(&mut Market) + Send>;

struct TradeLogListener {
    sink: Arc<RwLock<Vec<Trade>>>,
}

impl BookListener for TradeLogListener {
    fn on_trade(
        &mut self,
        symbol: &Symbol,
        fill_id: FillId,
        buy_id: &OrderId,
        sell_id: &OrderId,
        qty: Quantity,
        price: Price,
        buyer_maker: bool,
    ) {
        let trade = Trade {
            symbol: symbol.clone(),
            buy_id: buy_id.clone(),
            sell_id: sell_id.clone(),
            price,
            quantity: qty,
            buyer_maker,
            fill_id,
            timestamp: SystemTime::now(),
        };
        if let Ok(mut log) = self.sink.write() {
            log.push(trade);
        }
    }
}

/// A handle to the engine's dedicated thread. Cheap to clone; every clone
/// shares the same job queue.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineJob>,
}

impl EngineHandle {
    pub fn spawn(symbols: Vec<Symbol>, trade_log: Arc<RwLock<Vec<Trade>>>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<EngineJob>();
        std::thread::Builder::new()
            .name("matching-engine".into())
            .spawn(move || {
                let listener: Rc<RefCell<dyn BookListener>> = Rc::new(RefCell::new(TradeLogListener { sink: trade_log }));
                let mut market = Market::with_listener(listener);
                for symbol in symbols {
                    market.add_book(symbol);
                }
                while let Some(job) = rx.blocking_recv() {
                    job(&mut market);
                }
            })
            .expect("failed to spawn matching engine thread");
        EngineHandle { tx }
    }

    /// Runs `f` against the live `Market` on the engine thread and returns
    /// its result. `f` must not capture `!Send` state of its own.
    pub async fn call<T, F>(&self, f: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Market) -> T + Send + 'static,
    {
        let (resp_tx, resp_rx) = oneshot::channel();
        let job: EngineJob = Box::new(move |market| {
            let _ = resp_tx.send(f(market));
        });
        self.tx
            .send(job)
            .map_err(|_| EngineError::Io(std::io::Error::other("matching engine thread is gone")))?;
        resp_rx
            .await
            .map_err(|_| EngineError::Io(std::io::Error::other("matching engine thread dropped the response")))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub trade_log: Arc<RwLock<Vec<Trade>>>,
}

impl AppState {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        let trade_log = Arc::new(RwLock::new(Vec::new()));
        let engine = EngineHandle::spawn(symbols, trade_log.clone());
        AppState { engine, trade_log }
    }

    pub fn trades_for(&self, symbol: &Symbol, after: Option<FillId>, limit: usize) -> (Vec<Trade>, Option<FillId>) {
        let log = self.trade_log.read().expect("trade log lock poisoned");
        let mut matching = log.iter().filter(|t| {
            &t.symbol == symbol && after.map(|a| t.fill_id > a).unwrap_or(true)
        });
        let items: Vec<Trade> = matching.by_ref().take(limit).cloned().collect();
        let has_more = matching.next().is_some();
        let next = if has_more { items.last().map(|t| t.fill_id) } else { None };
        (items, next)
    }
}
