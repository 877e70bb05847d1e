// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local control API.
//!
//! Polling accessors for the published portfolio plus the wallet, transfer
//! and swap commands. Binds to loopback by default; there is no
//! authentication layer.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    portfolio::{SyncState, TickOutcome},
    session::QuoteDenomination,
    state::AppState,
    swap::SwapState,
    tokens::TokenCategory,
};

pub mod health;
pub mod portfolio;
pub mod swap;
pub mod transfer;
pub mod wallet;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/wallet",
            get(wallet::get_wallet).post(wallet::create_wallet),
        )
        .route("/wallet/load", post(wallet::load_wallet))
        .route("/wallet/logout", post(wallet::logout))
        .route("/tokens", get(portfolio::list_tokens))
        .route("/portfolio", get(portfolio::get_portfolio))
        .route("/portfolio/refresh", post(portfolio::refresh_portfolio))
        .route("/transfers", post(transfer::create_transfer))
        .route("/accounts", post(transfer::create_account))
        .route(
            "/swap/quote",
            post(swap::request_quote)
                .get(swap::get_quote)
                .delete(swap::stop_quote),
        )
        .route("/swap/commit", post(swap::commit_swap));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        wallet::get_wallet,
        wallet::create_wallet,
        wallet::load_wallet,
        wallet::logout,
        portfolio::list_tokens,
        portfolio::get_portfolio,
        portfolio::refresh_portfolio,
        transfer::create_transfer,
        transfer::create_account,
        swap::request_quote,
        swap::get_quote,
        swap::stop_quote,
        swap::commit_swap
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            wallet::WalletStatusResponse,
            wallet::LoadWalletRequest,
            wallet::WalletResponse,
            wallet::MessageResponse,
            portfolio::TokenResponse,
            portfolio::BalanceEntry,
            portfolio::PartitionResponse,
            portfolio::PortfolioResponse,
            portfolio::RefreshResponse,
            transfer::TransferRequest,
            transfer::CreateAccountRequest,
            transfer::SubmittedResponse,
            swap::QuoteRequestBody,
            swap::QuotingResponse,
            swap::QuoteResponse,
            swap::CommitRequest,
            swap::SwapResponse,
            SyncState,
            SwapState,
            TickOutcome,
            TokenCategory,
            QuoteDenomination
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Wallet", description = "Wallet creation, import and logout"),
        (name = "Portfolio", description = "Token registry and published balances"),
        (name = "Transfers", description = "Token transfers and account creation"),
        (name = "Swap", description = "Quote polling and swap execution")
    )
)]
struct ApiDoc;
