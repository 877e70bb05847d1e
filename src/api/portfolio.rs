// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token registry and portfolio endpoints.
//!
//! The portfolio is read from the published views; these handlers never
//! touch the network except for an explicit refresh.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    portfolio::{MarketData, SyncState, TickOutcome},
    state::AppState,
    tokens::{registry, TokenBalance, TokenCategory, TokenDescriptor},
};

/// A registered token.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenResponse {
    pub symbol: String,
    pub name: String,
    pub category: TokenCategory,
    pub mint: String,
    pub decimals: u8,
    /// Owning token program.
    pub program_id: String,
}

impl From<&TokenDescriptor> for TokenResponse {
    fn from(token: &TokenDescriptor) -> Self {
        Self {
            symbol: token.symbol.to_string(),
            name: token.name.to_string(),
            category: token.category,
            mint: token.mint.to_string(),
            decimals: token.decimals,
            program_id: token.program_id.to_string(),
        }
    }
}

/// One balance with its valuation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceEntry {
    pub symbol: String,
    pub mint: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_price: Option<f64>,
    /// Zero when no price is known.
    pub usd_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_24h: Option<f64>,
    /// Lend tokens only; zero when the product is unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apy: Option<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartitionResponse {
    pub balances: Vec<BalanceEntry>,
    pub total_value: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PortfolioResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub sync_state: SyncState,
    pub normal: PartitionResponse,
    pub xstock: PartitionResponse,
    pub lend: PartitionResponse,
    pub total_value: f64,
    /// Value-weighted 24h change in percent.
    pub change_24h: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub outcome: TickOutcome,
    pub sync_state: SyncState,
}

fn entry(balance: &TokenBalance, market: &MarketData) -> BalanceEntry {
    let quote = market.prices.get(balance.token.mint);
    BalanceEntry {
        symbol: balance.token.symbol.to_string(),
        mint: balance.token.mint.to_string(),
        amount: balance.amount,
        usd_price: quote.map(|q| q.usd_price),
        usd_value: balance.value(quote),
        change_24h: quote.and_then(|q| q.change_24h),
        apy: (balance.token.category == TokenCategory::Lend)
            .then(|| market.lend.apy(balance.token.mint)),
    }
}

fn partition(balances: &[TokenBalance], market: &MarketData) -> PartitionResponse {
    PartitionResponse {
        balances: balances.iter().map(|b| entry(b, market)).collect(),
        total_value: market.prices.total_value(balances),
    }
}

#[utoipa::path(
    get,
    path = "/v1/tokens",
    tag = "Portfolio",
    responses(
        (status = 200, description = "Registered tokens in registry order", body = [TokenResponse])
    )
)]
pub async fn list_tokens() -> Json<Vec<TokenResponse>> {
    Json(registry::all().iter().map(TokenResponse::from).collect())
}

/// Published portfolio views with valuations.
#[utoipa::path(
    get,
    path = "/v1/portfolio",
    tag = "Portfolio",
    responses(
        (status = 200, description = "Current portfolio", body = PortfolioResponse)
    )
)]
pub async fn get_portfolio(State(state): State<AppState>) -> Json<PortfolioResponse> {
    let session = state.session();
    let engine = session.engine();
    let views = engine.views();
    let market = engine.market();
    let all = views.to_list();

    Json(PortfolioResponse {
        address: session.owner().await.map(|o| o.to_string()),
        sync_state: engine.state(),
        normal: partition(&views.normal, &market),
        xstock: partition(&views.xstock, &market),
        lend: partition(&views.lend, &market),
        total_value: market.prices.total_value(&all),
        change_24h: market.prices.change_24h(&all),
    })
}

/// Run one sync tick now.
#[utoipa::path(
    post,
    path = "/v1/portfolio/refresh",
    tag = "Portfolio",
    responses(
        (status = 200, description = "Tick finished", body = RefreshResponse),
        (status = 409, description = "No wallet is loaded"),
        (status = 500, description = "Snapshot could not be written")
    )
)]
pub async fn refresh_portfolio(
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let session = state.session();
    let outcome = session.refresh().await?;
    Ok(Json(RefreshResponse {
        outcome,
        sync_state: session.engine().state(),
    }))
}
