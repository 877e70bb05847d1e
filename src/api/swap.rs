// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Swap quoting and commit endpoints.
//!
//! Posting a quote request starts a background loop that refreshes the
//! quote every interval; `GET` returns the latest one. Committing signs and
//! executes the latest quote.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    providers::aggregator::PendingSwapOrder,
    session::{resolve_token, QuoteDenomination, SessionError},
    state::AppState,
    swap::SwapState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuoteRequestBody {
    /// Input token symbol or mint.
    pub input: String,
    /// Output token symbol or mint.
    pub output: String,
    /// Zero stops quoting.
    pub amount: f64,
    #[serde(default)]
    pub denomination: QuoteDenomination,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuotingResponse {
    pub state: SwapState,
    /// Input-token amount being quoted.
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuoteResponse {
    pub request_id: String,
    pub input: String,
    pub output: String,
    pub in_amount: u64,
    pub out_amount: u64,
    pub in_ui_amount: f64,
    pub out_ui_amount: f64,
}

impl From<PendingSwapOrder> for QuoteResponse {
    fn from(order: PendingSwapOrder) -> Self {
        Self {
            in_ui_amount: order.in_ui_amount(),
            out_ui_amount: order.out_ui_amount(),
            request_id: order.request_id,
            input: order.input.symbol.to_string(),
            output: order.output.symbol.to_string(),
            in_amount: order.in_amount,
            out_amount: order.out_amount,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CommitRequest {
    /// Commit only if this is still the latest quote.
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SwapResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_amount: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/v1/swap/quote",
    tag = "Swap",
    request_body = QuoteRequestBody,
    responses(
        (status = 200, description = "Quoting started or stopped", body = QuotingResponse),
        (status = 400, description = "Unknown token"),
        (status = 409, description = "No wallet is loaded")
    )
)]
pub async fn request_quote(
    State(state): State<AppState>,
    Json(body): Json<QuoteRequestBody>,
) -> Result<Json<QuotingResponse>, ApiError> {
    let input = resolve_token(&body.input)?;
    let output = resolve_token(&body.output)?;
    let session = state.session();
    let amount = session
        .request_quote(input, output, body.amount, body.denomination)
        .await?;
    Ok(Json(QuotingResponse {
        state: session.swaps().state(),
        amount,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/swap/quote",
    tag = "Swap",
    responses(
        (status = 200, description = "Latest quote", body = QuoteResponse),
        (status = 404, description = "No quote yet")
    )
)]
pub async fn get_quote(State(state): State<AppState>) -> Result<Json<QuoteResponse>, ApiError> {
    state
        .session()
        .swaps()
        .latest_quote()
        .map(|order| Json(order.into()))
        .ok_or_else(|| ApiError::not_found("No quote available"))
}

#[utoipa::path(
    delete,
    path = "/v1/swap/quote",
    tag = "Swap",
    responses((status = 204, description = "Quoting stopped"))
)]
pub async fn stop_quote(State(state): State<AppState>) -> StatusCode {
    state.session().stop_quote().await;
    StatusCode::NO_CONTENT
}

/// Sign and execute the latest quote.
#[utoipa::path(
    post,
    path = "/v1/swap/commit",
    tag = "Swap",
    request_body = CommitRequest,
    responses(
        (status = 200, description = "Swap settled", body = SwapResponse),
        (status = 409, description = "No wallet, no quote or stale quote"),
        (status = 503, description = "Swap failed or aggregator unavailable")
    )
)]
pub async fn commit_swap(
    State(state): State<AppState>,
    Json(body): Json<CommitRequest>,
) -> Result<Json<SwapResponse>, ApiError> {
    let task = state.session().commit_swap(body.request_id).await?;
    let result = task.join().await.map_err(SessionError::from)??;
    let settlement = result.settlement();
    Ok(Json(SwapResponse {
        explorer_url: result.signature.as_deref().map(|s| state.network.tx_url(s)),
        input_amount: settlement.map(|e| e.input_amount).or(result.total_input_amount),
        output_amount: settlement.map(|e| e.output_amount).or(result.total_output_amount),
        signature: result.signature.clone(),
        status: result.status,
    }))
}
