//! Mental poker room server.
//!
//! Players connect over WebSocket and are routed into rooms that deal
//! through an external card-crypto service and settle through a ledger.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Error;
use log::info;
use mental_poker::{
    HttpCardCrypto, HttpLedger, LoggingLedger, RoomRegistry, SettlementLedger, StandardEvaluator,
};
use mp_server::{api, config::ServerConfig, logging};
use pico_args::Arguments;

const HELP: &str = "\
Run a mental poker room server

USAGE:
  mp_server [OPTIONS]

OPTIONS:
  --bind        IP:PORT     Server socket bind address [default: 127.0.0.1:6969]
  --crypto-url  URL         Card-crypto service URL    [default: http://127.0.0.1:8000]
  --ledger-url  URL         Settlement ledger URL      [default: none, settlements are logged]

FLAGS:
  -h, --help                Print help information

ENVIRONMENT:
  SERVER_BIND               Server bind address (e.g., 0.0.0.0:8080)
  CRYPTO_URL                Card-crypto service base URL
  LEDGER_URL                Settlement ledger base URL
  ROOM_MAX_SEATS            Seats per room (2-10)
  ROOM_SMALL_BLIND          Small blind
  ROOM_BIG_BLIND            Big blind
  ROOM_ACTION_TIMEOUT_SECS  Seconds a player has to act
  ROOM_IDLE_INTERVAL_SECS   Seconds between automatic hand starts
  ROOM_AUTO_START_PLAYERS   Seated players that start a hand at once (0 disables)
  ROOM_DEFAULT_BUY_IN       Stack for players joining without a buy-in
  ROOM_SETTLEMENT           heads_up or last_standing
  RUST_LOG                  Log filter (e.g., info,mental_poker=debug)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let crypto_url: Option<String> = pargs.opt_value_from_str("--crypto-url")?;
    let ledger_url: Option<String> = pargs.opt_value_from_str("--ledger-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind, crypto_url, ledger_url)?;
    config.validate()?;
    info!("Starting room server at {}", config.bind);

    let crypto = Arc::new(
        HttpCardCrypto::new(config.crypto_url.clone())
            .map_err(|e| anyhow::anyhow!("Failed to build card-crypto client: {}", e))?,
    );
    info!("Card-crypto service: {}", config.crypto_url);

    let ledger: Arc<dyn SettlementLedger> = match &config.ledger_url {
        Some(url) => {
            info!("Settlement ledger: {}", url);
            Arc::new(
                HttpLedger::new(url.clone())
                    .map_err(|e| anyhow::anyhow!("Failed to build ledger client: {}", e))?,
            )
        }
        None => {
            info!("No settlement ledger configured, settlements are only logged");
            Arc::new(LoggingLedger)
        }
    };

    info!(
        "Room defaults: {} seats, blinds {}/{}, {}s to act, settlement {}",
        config.room_defaults.max_seats,
        config.room_defaults.small_blind,
        config.room_defaults.big_blind,
        config.room_defaults.action_timeout_secs,
        config.room_defaults.settlement
    );
    let registry = RoomRegistry::new(
        crypto,
        Arc::new(StandardEvaluator),
        ledger,
        config.room_defaults.clone(),
    );

    let app = api::create_router(api::AppState { registry });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!("Server is running at http://{}. Press Ctrl+C to stop.", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
