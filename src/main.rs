//! GASP depositor - scripted deposit run against an EVM test network
//!
//! Sends a random share of the wallet balance to the deposit contract, waits
//! a random interval, then approves and deposits a fixed token amount.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

mod chain;
mod config;
mod contract;
mod coordination;
mod error;
mod tx;
mod wallet;

use chain::ChainProvider;
use config::Settings;
use coordination::RunEngine;
use error::DepositorError;
use tx::ThreadRandomness;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting GASP depositor v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;

    let provider = ChainProvider::new(&settings.chain.rpc_url, settings.chain.chain_id)?;
    info!(
        "Using RPC {} (chain {})",
        settings.chain.rpc_url,
        provider.chain_id()
    );

    let mut engine = match RunEngine::bootstrap(
        &settings,
        Arc::new(provider),
        Arc::new(ThreadRandomness),
    ) {
        Ok(engine) => engine,
        Err(e) => {
            log_startup_failure(&e);
            return Ok(());
        }
    };

    let report = engine.run().await;
    info!(
        "Run states: {}",
        report
            .states
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    );
    for (step, outcome) in [
        ("transfer", &report.transfer),
        ("approve", &report.approve),
        ("deposit", &report.deposit),
    ] {
        match outcome.tx_hash() {
            Some(hash) if outcome.is_confirmed() => info!("{}: confirmed {:?}", step, hash),
            Some(hash) => warn!("{}: {:?} not confirmed ({:?})", step, hash, outcome),
            None => warn!("{}: no transaction ({:?})", step, outcome),
        }
    }

    Ok(())
}

/// Startup errors end the program quietly; nothing was sent yet
fn log_startup_failure(err: &DepositorError) {
    if err.is_fatal() {
        error!("{}: {}", err.startup_context(), err);
    } else {
        warn!("{}: {}", err.startup_context(), err);
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gasp_depositor=debug,hyper=warn,reqwest=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}
