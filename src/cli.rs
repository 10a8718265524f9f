//! `clap`-derived command-line surface: replay a command file straight
//! through a `Market` (grounds the reference `main.cpp`'s file loop), or
//! serve the HTTP surface.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "engine-cli")]
#[command(author = "Andrew Odiit", version = "0.1", about = "A demo of a limit-order-book-engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replays a line-oriented command file against a single default book.
    Replay {
        /// Path to the command file (defaults to `input.csv`, matching the
        /// reference implementation).
        #[arg(default_value = "input.csv")]
        file: String,
    },
    /// Serves the HTTP order-entry API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Symbols to create books for at startup (comma-separated). Only
        /// `Pair::supported()` symbols are reachable over the HTTP surface;
        /// anything else registers a book the replay protocol can still
        /// reach but the API will reject at the `{symbol}` boundary.
        #[arg(long, value_delimiter = ',', default_value = "BTC-USD")]
        symbols: Vec<String>,
    },
}
