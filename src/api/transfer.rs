// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transfer and token-account endpoints.
//!
//! Both run as session tasks; the handler waits for the task so the
//! response carries the submitted signature or the failure.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    session::{resolve_token, SessionError},
    state::AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Token symbol or mint address.
    pub token: String,
    /// Base58 address of the recipient wallet.
    pub recipient: String,
    /// Amount in token units.
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    /// Token symbol or mint address.
    pub token: String,
}

/// A submitted transaction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmittedResponse {
    pub signature: String,
    pub explorer_url: String,
}

#[utoipa::path(
    post,
    path = "/v1/transfers",
    tag = "Transfers",
    request_body = TransferRequest,
    responses(
        (status = 202, description = "Transfer submitted", body = SubmittedResponse),
        (status = 400, description = "Unknown token, invalid address or amount"),
        (status = 409, description = "No wallet is loaded"),
        (status = 503, description = "Chain unavailable or transaction rejected")
    )
)]
pub async fn create_transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<SubmittedResponse>), ApiError> {
    let token = resolve_token(&request.token)?;
    let task = state
        .session()
        .transfer(token, &request.recipient, request.amount)
        .await?;
    let signature = task.join().await.map_err(SessionError::from)??;
    Ok((StatusCode::ACCEPTED, Json(submitted(&state, signature))))
}

/// Create the wallet's associated account for a token.
#[utoipa::path(
    post,
    path = "/v1/accounts",
    tag = "Transfers",
    request_body = CreateAccountRequest,
    responses(
        (status = 202, description = "Account creation submitted", body = SubmittedResponse),
        (status = 400, description = "Unknown token"),
        (status = 409, description = "No wallet is loaded"),
        (status = 503, description = "Chain unavailable or transaction rejected")
    )
)]
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<SubmittedResponse>), ApiError> {
    let token = resolve_token(&request.token)?;
    let task = state.session().create_account(token).await?;
    let signature = task.join().await.map_err(SessionError::from)??;
    Ok((StatusCode::ACCEPTED, Json(submitted(&state, signature))))
}

fn submitted(state: &AppState, signature: String) -> SubmittedResponse {
    SubmittedResponse {
        explorer_url: state.network.tx_url(&signature),
        signature,
    }
}
