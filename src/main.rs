use clap::Parser;
use order_book_engine::cli::{Cli, Commands};
use order_book_engine::market::Market;
use order_book_engine::parser::{parse_line, Command};
use order_book_engine::state::AppState;
use order_book_engine::types::Symbol;
use order_book_engine::utils::shutdown_token;
use order_book_engine::{api, order::Order};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::rc::Rc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// The symbol assumed by the replay protocol, which carries no symbol
/// field of its own (mirrors the reference implementation's single
/// `DEFAULT_SYMBOL` book).
const DEFAULT_SYMBOL: &str = "DEFAULT";

fn replay(file: &str) -> anyhow::Result<()> {
    let mut market = Market::new();
    let symbol = Symbol::new(DEFAULT_SYMBOL);
    market.add_book(symbol.clone());

    let reader = BufReader::new(File::open(file)?);
    for line in reader.lines() {
        let line = line?;
        match parse_line(&line) {
            Some(Command::Enter { side, conditions, price, quantity, order_id }) => {
                let order = Rc::new(RefCell::new(Order::new(order_id, side, symbol.clone(), quantity, price)));
                market.order_entry(order, conditions);
            }
            Some(Command::Modify { order_id, side, price, quantity }) => {
                let order = Rc::new(RefCell::new(Order::new(order_id, side, symbol.clone(), quantity, price)));
                market.order_modify(order);
            }
            Some(Command::Cancel { order_id }) => {
                market.order_cancel(&order_id);
            }
            Some(Command::Print) => market.log(),
            None => tracing::error!(%line, "invalid command line"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay { file } => {
            replay(&file)?;
        }
        Commands::Serve { port, symbols } => {
            let token = shutdown_token();
            let symbols: Vec<Symbol> = symbols.into_iter().map(Symbol::new).collect();
            let state = AppState::new(symbols);
            let app = api::router(state);
            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
            tracing::info!(port, "HTTP order-entry API listening");
            axum::serve(listener, app).with_graceful_shutdown(token.cancelled_owned()).await?;
        }
    }
    Ok(())
}
