// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet lifecycle endpoints.
//!
//! The secret is accepted on load but never returned by any endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::ApiError, portfolio::SyncState, state::AppState};

/// Current wallet binding.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletStatusResponse {
    /// Whether a wallet is loaded.
    pub bound: bool,
    /// Base58 address of the loaded wallet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub sync_state: SyncState,
}

/// Request to import an existing wallet.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoadWalletRequest {
    /// Base58 keypair, base58 seed, or JSON byte array.
    pub secret: String,
}

/// Response after binding a wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    pub address: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/v1/wallet",
    tag = "Wallet",
    responses(
        (status = 200, description = "Wallet binding", body = WalletStatusResponse)
    )
)]
pub async fn get_wallet(State(state): State<AppState>) -> Json<WalletStatusResponse> {
    let session = state.session();
    let address = session.owner().await.map(|owner| owner.to_string());
    Json(WalletStatusResponse {
        bound: address.is_some(),
        address,
        sync_state: session.engine().state(),
    })
}

/// Generate a new wallet and bind it.
#[utoipa::path(
    post,
    path = "/v1/wallet",
    tag = "Wallet",
    responses(
        (status = 201, description = "Wallet created", body = WalletResponse),
        (status = 409, description = "A wallet is already loaded")
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<WalletResponse>), ApiError> {
    let owner = state.session().create_wallet().await?;
    Ok((
        StatusCode::CREATED,
        Json(WalletResponse {
            address: owner.to_string(),
            message: "Wallet created".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/wallet/load",
    tag = "Wallet",
    request_body = LoadWalletRequest,
    responses(
        (status = 200, description = "Wallet loaded", body = WalletResponse),
        (status = 409, description = "A wallet is already loaded"),
        (status = 422, description = "Secret is not a valid key")
    )
)]
pub async fn load_wallet(
    State(state): State<AppState>,
    Json(request): Json<LoadWalletRequest>,
) -> Result<Json<WalletResponse>, ApiError> {
    let owner = state.session().load_wallet(&request.secret).await?;
    Ok(Json(WalletResponse {
        address: owner.to_string(),
        message: "Wallet loaded".to_string(),
    }))
}

/// Unbind the wallet, stop its tasks and delete the stored secret and
/// portfolio snapshot.
#[utoipa::path(
    post,
    path = "/v1/wallet/logout",
    tag = "Wallet",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 409, description = "No wallet is loaded")
    )
)]
pub async fn logout(State(state): State<AppState>) -> Result<Json<MessageResponse>, ApiError> {
    state.session().logout().await?;
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}
