// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use solace_wallet::{
    api::router,
    blockchain::ChainClient,
    config::Settings,
    logging,
    providers::{JupiterHttp, LendRateClient, PriceOracleClient, QuoteAggregatorClient},
    session::{SessionDeps, SessionError, WalletSession},
    state::AppState,
    storage::{LocalStorage, StoragePaths},
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let settings = Settings::from_env().expect("Invalid configuration");
    logging::init(settings.log_format);

    // Local storage (secret slot + snapshot)
    let mut storage = LocalStorage::new(StoragePaths::new(&settings.data_dir));
    storage
        .initialize()
        .expect("Failed to initialize data directory");
    let storage = Arc::new(storage);

    let chain = ChainClient::connect(&settings.network, settings.http_timeout)
        .expect("Failed to build RPC client");
    let jupiter = JupiterHttp::new(
        &settings.jupiter_api_url,
        settings.jupiter_api_key.clone(),
        settings.http_timeout,
    )
    .expect("Failed to build Jupiter client");

    let session = Arc::new(WalletSession::new(SessionDeps {
        chain: Arc::new(chain),
        prices: Arc::new(PriceOracleClient::new(jupiter.clone())),
        lend: Arc::new(LendRateClient::new(jupiter.clone())),
        venue: Arc::new(QuoteAggregatorClient::new(jupiter)),
        storage: storage.clone(),
        sync_interval: settings.sync_interval,
        quote_interval: settings.quote_interval,
    }));

    // Auto-login from the secret slot
    match session.restore().await {
        Ok(Some(owner)) => info!(owner = %owner, "Restored stored wallet"),
        Ok(None) => {}
        Err(SessionError::InvalidKey(_)) => warn!("Stored secret is invalid; waiting for a new wallet"),
        Err(e) => error!(error = %e, "Failed to restore stored wallet"),
    }

    let state = AppState::new(session.clone(), storage, settings.network.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .expect("Failed to bind control API address");
    info!(addr = %settings.bind_addr, "Solace wallet listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Control API server failed");

    session.shutdown().await;
    info!("Solace wallet stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
