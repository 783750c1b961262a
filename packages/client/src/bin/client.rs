//! Courtlobby CLI client.
//!
//! Runs the lobby coordinator locally against a `courtlobby-server` store
//! service. Every subcommand is one lobby operation; `join --auto` and
//! `watch` keep a live view and reconnect on transient failures
//! (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin courtlobby-client -- --player-id alice create --mode doubles
//! cargo run --bin courtlobby-client -- -i bob --name Bob join ABC234 --auto
//! cargo run --bin courtlobby-client -- -i alice swap ABC234 team1.slot2 team2.slot1
//! cargo run --bin courtlobby-client -- -i alice start ABC234
//! ```

use clap::Parser;

use courtlobby_client::{
    command::Command,
    runner::{connect, run_command},
};
use courtlobby_server::{
    domain::{PlayerId, PlayerSnapshot},
    usecase::CoordinatorConfig,
};
use courtlobby_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "courtlobby-client")]
#[command(about = "Lobby client coordinating through a shared Courtlobby store", long_about = None)]
struct Args {
    /// Store service URL
    #[arg(short = 'u', long, default_value = "http://127.0.0.1:8080")]
    url: String,

    /// Your player ID, as issued by the identity provider
    #[arg(short = 'i', long)]
    player_id: String,

    /// Display name (defaults to the player ID)
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Avatar reference shown to other players
    #[arg(short = 'a', long)]
    avatar: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let player_id = match PlayerId::new(args.player_id.clone()) {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Invalid player ID '{}': {}", args.player_id, e);
            std::process::exit(2);
        }
    };
    let display_name = args.name.unwrap_or_else(|| args.player_id.clone());
    let me = PlayerSnapshot::new(player_id, display_name, args.avatar);

    let coordinator = match connect(&args.url, CoordinatorConfig::default()).await {
        Ok(coordinator) => coordinator,
        Err(e) => {
            tracing::error!("Client error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_command(coordinator, me, args.command).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
