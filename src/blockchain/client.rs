// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Solana JSON-RPC client for balance queries and transaction submission.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::signing::{KeyError, WalletKeyStore};
use super::transactions::{
    compile_message, create_associated_token_account, derive_ata, system_transfer,
    transfer_checked, Instruction,
};
use super::types::*;
use crate::portfolio::BalanceSource;
use crate::tokens::{registry, TokenBalance, TokenDescriptor};

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Signing failed: {0}")]
    Signing(#[from] KeyError),
}

/// Carries one JSON-RPC request body to the node and returns the raw
/// response body.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn post(&self, body: Value) -> Result<Value, ChainError>;
}

/// HTTPS transport; the API key is part of the endpoint URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: url::Url,
    http: Client,
}

impl HttpTransport {
    pub fn new(network: &NetworkConfig, timeout: Duration) -> Result<Self, ChainError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: network.rpc_url.clone(),
            http,
        })
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn post(&self, body: Value) -> Result<Value, ChainError> {
        let response = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Network(format!("POST rpc failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::Network(format!("rpc returned {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| ChainError::Parse(format!("rpc invalid JSON: {e}")))
    }
}

/// Solana chain client.
pub struct ChainClient {
    transport: Arc<dyn RpcTransport>,
    next_id: AtomicU64,
}

impl ChainClient {
    /// Create a client over the given transport.
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    /// Create an HTTPS client for the given network.
    pub fn connect(network: &NetworkConfig, timeout: Duration) -> Result<Self, ChainError> {
        Ok(Self::new(Arc::new(HttpTransport::new(network, timeout)?)))
    }

    /// Issue one JSON-RPC call and decode its bare `result`.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        let body = serde_json::to_value(&request)
            .map_err(|e| ChainError::Parse(format!("serialize {method}: {e}")))?;

        let raw = self.transport.post(body).await?;
        let response: RpcResponse = serde_json::from_value(raw)
            .map_err(|e| ChainError::Parse(format!("{method} envelope: {e}")))?;

        if let Some(err) = response.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        let result = response
            .result
            .ok_or_else(|| ChainError::Parse(format!("{method}: missing result")))?;
        serde_json::from_value(result).map_err(|e| ChainError::Parse(format!("{method} result: {e}")))
    }

    /// Issue a call whose result is wrapped in `{context, value}`.
    pub async fn call_value<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        let wrapped: RpcContextual<T> = self.call(method, params).await?;
        Ok(wrapped.value)
    }

    /// Native balance in lamports.
    pub async fn get_balance(&self, owner: &Pubkey) -> Result<u64, ChainError> {
        self.call_value(
            "getBalance",
            json!([owner.to_string(), {"commitment": "finalized"}]),
        )
        .await
    }

    /// Token accounts of `owner` under one token program.
    pub async fn get_token_accounts(
        &self,
        owner: &Pubkey,
        program_id: &str,
    ) -> Result<Vec<TokenAccountEntry>, ChainError> {
        self.call_value(
            "getTokenAccountsByOwner",
            json!([
                owner.to_string(),
                {"programId": program_id},
                {"commitment": "finalized", "encoding": "jsonParsed"}
            ]),
        )
        .await
    }

    /// Latest blockhash as raw bytes.
    pub async fn get_latest_blockhash(&self) -> Result<[u8; 32], ChainError> {
        let latest: LatestBlockhash = self
            .call_value("getLatestBlockhash", json!([{"commitment": "finalized"}]))
            .await?;
        let bytes = bs58::decode(&latest.blockhash)
            .into_vec()
            .map_err(|e| ChainError::Parse(format!("blockhash: {e}")))?;
        bytes
            .try_into()
            .map_err(|_| ChainError::Parse("blockhash is not 32 bytes".into()))
    }

    /// Submit a signed transaction; returns its signature.
    pub async fn send_transaction(&self, signed_tx: &[u8]) -> Result<String, ChainError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(signed_tx);
        self.call("sendTransaction", json!([encoded, {"encoding": "base64"}]))
            .await
    }

    /// All registered balances of `owner`.
    ///
    /// Token accounts are queried under both program families and unioned;
    /// accounts whose mint is not registered are dropped. The native balance
    /// is appended exactly once as `lamports / 1e9`.
    pub async fn get_wallet_balances(&self, owner: &Pubkey) -> Result<Vec<TokenBalance>, ChainError> {
        let mut balances = Vec::new();
        for program_id in TOKEN_PROGRAM_FAMILIES {
            let accounts = self.get_token_accounts(owner, program_id).await?;
            debug!(program_id, count = accounts.len(), "Fetched token accounts");
            balances.extend(accounts.into_iter().filter_map(|entry| {
                let info = entry.account.data.parsed.info;
                registry::by_mint(&info.mint)
                    .map(|token| TokenBalance::new(token, info.token_amount.ui_value()))
            }));
        }

        let lamports = self.get_balance(owner).await?;
        balances.push(TokenBalance::new(
            registry::native(),
            lamports as f64 / LAMPORTS_PER_SOL,
        ));
        Ok(balances)
    }

    /// Transfer `amount` of `token` to `recipient`.
    ///
    /// SPL tokens move between the associated accounts of sender and
    /// recipient with `TransferChecked`; the native asset uses a system
    /// transfer.
    pub async fn transfer(
        &self,
        keys: &WalletKeyStore,
        token: &TokenDescriptor,
        recipient: &Pubkey,
        amount: f64,
    ) -> Result<String, ChainError> {
        let raw = token.to_raw(amount)?;
        if raw == 0 {
            return Err(ChainError::InvalidAmount(format!("{amount} rounds to zero")));
        }
        let owner = keys.pubkey();

        let instruction = if token.is_native() {
            system_transfer(owner, *recipient, raw)
        } else {
            let mint = token.mint_pubkey()?;
            let program = token.program_pubkey()?;
            let source = derive_ata(&owner, &mint, &program)?;
            let destination = derive_ata(recipient, &mint, &program)?;
            transfer_checked(program, source, mint, destination, owner, raw, token.decimals)
        };

        let signature = self.sign_and_send(keys, instruction).await?;
        info!(
            symbol = token.symbol,
            recipient = %recipient,
            raw_amount = raw,
            signature = %signature,
            "Transfer submitted"
        );
        Ok(signature)
    }

    /// Create the wallet's associated account for `token`.
    ///
    /// XSTOCK tokens live under the extension program, everything else
    /// under the legacy token program.
    pub async fn create_account(
        &self,
        keys: &WalletKeyStore,
        token: &TokenDescriptor,
    ) -> Result<String, ChainError> {
        if token.is_native() {
            return Err(ChainError::InvalidAddress(
                "the native asset has no token account".into(),
            ));
        }
        let owner = keys.pubkey();
        let mint = token.mint_pubkey()?;
        let program = token.category.account_program();
        let instruction = create_associated_token_account(owner, owner, mint, program)?;

        let signature = self.sign_and_send(keys, instruction).await?;
        info!(
            symbol = token.symbol,
            program = %program,
            signature = %signature,
            "Token account creation submitted"
        );
        Ok(signature)
    }

    async fn sign_and_send(&self, keys: &WalletKeyStore, instruction: Instruction) -> Result<String, ChainError> {
        let blockhash = self.get_latest_blockhash().await?;
        let message = compile_message(&keys.pubkey(), &[instruction], &blockhash);
        let signed = keys.sign(&message.to_unsigned_transaction())?;
        self.send_transaction(&signed).await
    }
}

#[async_trait]
impl BalanceSource for ChainClient {
    async fn fetch_balances(&self, owner: &Pubkey) -> Result<Vec<TokenBalance>, ChainError> {
        self.get_wallet_balances(owner).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tokens::registry::{SOL, USDC};
    use std::sync::Mutex;

    /// Scripted transport: answers by method name and records requests.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        requests: Mutex<Vec<Value>>,
    }

    impl ScriptedTransport {
        pub(crate) fn methods(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r["method"].as_str().unwrap_or_default().to_string())
                .collect()
        }
    }

    fn token_account(mint: &str, amount: &str, decimals: u8, ui: Option<f64>) -> Value {
        json!({
            "pubkey": "11111111111111111111111111111111",
            "account": {
                "owner": TOKEN_PROGRAM_ID,
                "lamports": 2039280,
                "data": {
                    "program": "spl-token",
                    "parsed": {
                        "type": "account",
                        "info": {
                            "mint": mint,
                            "owner": "11111111111111111111111111111111",
                            "tokenAmount": {
                                "amount": amount,
                                "decimals": decimals,
                                "uiAmount": ui
                            }
                        }
                    }
                }
            }
        })
    }

    #[async_trait]
    impl RpcTransport for ScriptedTransport {
        async fn post(&self, body: Value) -> Result<Value, ChainError> {
            self.requests.lock().unwrap().push(body.clone());
            let id = body["id"].clone();
            let ctx = json!({"slot": 1});
            let result = match body["method"].as_str().unwrap_or_default() {
                "getBalance" => json!({"context": ctx, "value": 2_000_000_000u64}),
                "getTokenAccountsByOwner" => {
                    if body["params"][1]["programId"] == TOKEN_PROGRAM_ID {
                        json!({"context": ctx, "value": [
                            token_account(USDC.mint, "10500000", 6, Some(10.5)),
                            token_account("UnknownMint1111111111111111111111111111111", "1", 0, Some(1.0)),
                        ]})
                    } else {
                        json!({"context": ctx, "value": []})
                    }
                }
                "getLatestBlockhash" => json!({"context": ctx, "value": {
                    "blockhash": bs58::encode([3u8; 32]).into_string(),
                    "lastValidBlockHeight": 100
                }}),
                "sendTransaction" => json!("5sig"),
                _ => return Ok(json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32601, "message": "Method not found"}})),
            };
            Ok(json!({"jsonrpc": "2.0", "id": id, "result": result}))
        }
    }

    pub(crate) fn client() -> (ChainClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::default());
        (ChainClient::new(transport.clone()), transport)
    }

    #[tokio::test]
    async fn test_wallet_balances_union_and_native() {
        let (client, transport) = client();
        let owner = Pubkey::new([1u8; 32]);
        let balances = client.get_wallet_balances(&owner).await.unwrap();

        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].token.mint, USDC.mint);
        assert_eq!(balances[0].amount, 10.5);
        assert_eq!(balances[1].token.mint, SOL.mint);
        assert_eq!(balances[1].amount, 2.0);

        let methods = transport.methods();
        assert_eq!(
            methods,
            vec!["getTokenAccountsByOwner", "getTokenAccountsByOwner", "getBalance"]
        );
        let reqs = transport.requests.lock().unwrap();
        assert_eq!(reqs[0]["params"][1]["programId"], TOKEN_PROGRAM_ID);
        assert_eq!(reqs[1]["params"][1]["programId"], TOKEN_2022_PROGRAM_ID);
        assert_eq!(reqs[0]["jsonrpc"], "2.0");
        assert_ne!(reqs[0]["id"], reqs[1]["id"]);
    }

    #[tokio::test]
    async fn test_rpc_error_maps_to_typed_error() {
        let (client, _) = client();
        let err = client.call::<Value>("getNothing", json!([])).await.unwrap_err();
        assert!(matches!(err, ChainError::Rpc { code: -32601, .. }));
    }

    #[tokio::test]
    async fn test_transfer_builds_signed_transaction() {
        let (client, transport) = client();
        let keys = WalletKeyStore::generate();
        let recipient = Pubkey::new([8u8; 32]);

        let sig = client.transfer(&keys, &USDC, &recipient, 1.25).await.unwrap();
        assert_eq!(sig, "5sig");
        assert_eq!(transport.methods(), vec!["getLatestBlockhash", "sendTransaction"]);

        let reqs = transport.requests.lock().unwrap();
        assert_eq!(reqs[1]["params"][1]["encoding"], "base64");
        let tx = base64::engine::general_purpose::STANDARD
            .decode(reqs[1]["params"][0].as_str().unwrap())
            .unwrap();
        // one signature, fee payer first, data = tag 12 + 1_250_000 + decimals
        assert_eq!(tx[0], 1);
        assert_eq!(&tx[65 + 4..65 + 36], keys.pubkey().as_bytes());
        let mut data = vec![12u8];
        data.extend_from_slice(&1_250_000u64.to_le_bytes());
        data.push(6);
        assert!(tx.ends_with(&data));
    }

    #[tokio::test]
    async fn test_native_transfer_uses_system_program() {
        let (client, transport) = client();
        let keys = WalletKeyStore::generate();
        client
            .transfer(&keys, &SOL, &Pubkey::new([8u8; 32]), 0.5)
            .await
            .unwrap();

        let reqs = transport.requests.lock().unwrap();
        let tx = base64::engine::general_purpose::STANDARD
            .decode(reqs[1]["params"][0].as_str().unwrap())
            .unwrap();
        let mut data = vec![2u8, 0, 0, 0];
        data.extend_from_slice(&500_000_000u64.to_le_bytes());
        assert!(tx.ends_with(&data));
    }

    #[tokio::test]
    async fn test_transfer_rejects_zero_amount() {
        let (client, transport) = client();
        let keys = WalletKeyStore::generate();
        let err = client
            .transfer(&keys, &USDC, &Pubkey::new([8u8; 32]), 0.0000001)
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::InvalidAmount(_)));
        assert!(transport.methods().is_empty());
    }

    #[tokio::test]
    async fn test_create_account_picks_program_by_category() {
        let (client, transport) = client();
        let keys = WalletKeyStore::generate();
        let spy = registry::by_symbol("SPYx").unwrap();
        client.create_account(&keys, spy).await.unwrap();

        let reqs = transport.requests.lock().unwrap();
        let tx = base64::engine::general_purpose::STANDARD
            .decode(reqs[1]["params"][0].as_str().unwrap())
            .unwrap();
        let contains = |key: &Pubkey| tx.windows(32).any(|w| w == key.as_bytes());
        assert!(contains(&TOKEN_2022_PROGRAM));
        assert!(!contains(&TOKEN_PROGRAM));
        assert!(contains(&ASSOCIATED_TOKEN_PROGRAM));
    }
}
