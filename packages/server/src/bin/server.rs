//! Shared lobby document store service.
//!
//! Holds lobby documents in memory and serves them over HTTP and WebSocket
//! so that `courtlobby-client` instances can coordinate through it.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin courtlobby-server
//! cargo run --bin courtlobby-server -- --host 0.0.0.0 --port 3000
//! cargo run --bin courtlobby-server -- --last-write-wins
//! ```

use std::sync::Arc;

use clap::Parser;
use courtlobby_server::{infrastructure::store::InMemoryLobbyStore, ui::Server};
use courtlobby_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "courtlobby-server")]
#[command(about = "Shared lobby document store for Courtlobby clients", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Ignore field preconditions, like a store without conditional writes
    #[arg(long)]
    last_write_wins: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    let store = if args.last_write_wins {
        InMemoryLobbyStore::last_write_wins()
    } else {
        InMemoryLobbyStore::conditional()
    };

    let server = Server::new(Arc::new(store));
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
