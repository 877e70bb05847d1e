// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::ChainError;

/// A 32-byte ed25519 public key / account address, displayed as base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pubkey([u8; 32]);

impl Pubkey {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl FromStr for Pubkey {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| ChainError::InvalidAddress(format!("{s}: {e}")))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            ChainError::InvalidAddress(format!("{s}: expected 32 bytes, got {}", v.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Pubkey {
    type Error = ChainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pubkey> for String {
    fn from(value: Pubkey) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

// =============================================================================
// Program IDs
// =============================================================================

/// Base58 id of the legacy SPL token program.
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Base58 id of the token extension program (Token-2022).
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

/// Base58 id of the associated token account program.
pub const ASSOCIATED_TOKEN_PROGRAM_ID: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

/// Both token program families. Holdings are split across them, so balance
/// queries must cover each.
pub const TOKEN_PROGRAM_FAMILIES: [&str; 2] = [TOKEN_PROGRAM_ID, TOKEN_2022_PROGRAM_ID];

pub const TOKEN_PROGRAM: Pubkey = Pubkey::new([
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79, 0xac,
    0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff, 0x00, 0xa9,
]);

pub const TOKEN_2022_PROGRAM: Pubkey = Pubkey::new([
    0x06, 0xdd, 0xf6, 0xe1, 0xee, 0x75, 0x8f, 0xde, 0x18, 0x42, 0x5d, 0xbc, 0xe4, 0x6c, 0xcd, 0xda,
    0xb6, 0x1a, 0xfc, 0x4d, 0x83, 0xb9, 0x0d, 0x27, 0xfe, 0xbd, 0xf9, 0x28, 0xd8, 0xa1, 0x8b, 0xfc,
]);

pub const ASSOCIATED_TOKEN_PROGRAM: Pubkey = Pubkey::new([
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d, 0x83,
    0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9, 0xf8, 0x59,
]);

/// `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM: Pubkey = Pubkey::new([0u8; 32]);

/// Lamports per whole SOL.
pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

// =============================================================================
// JSON-RPC wire types
// =============================================================================

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// `{context, value}` wrapper most Solana RPC results are nested in.
#[derive(Debug, Deserialize)]
pub struct RpcContextual<T> {
    #[allow(dead_code)]
    pub context: Value,
    pub value: T,
}

/// One element of a `getTokenAccountsByOwner` (jsonParsed) result.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenAccountEntry {
    pub pubkey: String,
    pub account: ParsedAccount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedAccount {
    pub owner: String,
    pub data: ParsedAccountData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedAccountData {
    pub parsed: ParsedTokenAccount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParsedTokenAccount {
    pub info: TokenAccountInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccountInfo {
    pub mint: String,
    pub owner: String,
    pub token_amount: UiTokenAmount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTokenAmount {
    pub amount: String,
    pub decimals: u8,
    #[serde(default)]
    pub ui_amount: Option<f64>,
}

impl UiTokenAmount {
    /// Human amount; falls back to `amount / 10^decimals` when the node
    /// omits `uiAmount`.
    pub fn ui_value(&self) -> f64 {
        match self.ui_amount {
            Some(ui) => ui,
            None => {
                let raw: f64 = self.amount.parse().unwrap_or(0.0);
                raw / 10f64.powi(i32::from(self.decimals))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestBlockhash {
    pub blockhash: String,
    #[serde(default)]
    pub last_valid_block_height: u64,
}

/// Solana RPC endpoint configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: String,
    /// JSON-RPC endpoint URL (API key already applied)
    pub rpc_url: url::Url,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

impl NetworkConfig {
    /// Build a mainnet config; the API key, if any, is carried as the
    /// `api-key` query parameter.
    pub fn mainnet(rpc_url: &str, api_key: Option<&str>) -> Result<Self, ChainError> {
        let mut url = url::Url::parse(rpc_url)
            .map_err(|e| ChainError::Network(format!("invalid RPC URL {rpc_url}: {e}")))?;
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            url.query_pairs_mut().append_pair("api-key", key);
        }
        Ok(Self {
            name: "Solana Mainnet".to_string(),
            rpc_url: url,
            explorer_url: "https://solscan.io",
        })
    }

    pub fn tx_url(&self, signature: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, signature)
    }
}
