// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Swap quote aggregator client.
//!
//! Quotes come back as an unsigned transaction plus a request id; the
//! signed transaction is handed back with the same id for execution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{de_opt_u64, de_u64, JupiterHttp, ProviderError};
use crate::blockchain::Pubkey;
use crate::swap::SwapVenue;
use crate::tokens::TokenDescriptor;

const ORDER_PATH: &str = "/ultra/v1/order";
const EXECUTE_PATH: &str = "/ultra/v1/execute";
const STATUS_SUCCESS: &str = "Success";

/// A quote awaiting commit.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSwapOrder {
    /// Base64 unsigned transaction
    pub transaction: String,
    /// Correlation id for execution
    pub request_id: String,
    /// Quoted raw input amount
    pub in_amount: u64,
    /// Quoted raw output amount
    pub out_amount: u64,
    pub input: &'static TokenDescriptor,
    pub output: &'static TokenDescriptor,
}

impl PendingSwapOrder {
    pub fn in_ui_amount(&self) -> f64 {
        self.input.to_ui(self.in_amount)
    }

    pub fn out_ui_amount(&self) -> f64 {
        self.output.to_ui(self.out_amount)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    #[serde(default)]
    transaction: Option<String>,
    request_id: String,
    #[serde(deserialize_with = "de_u64")]
    in_amount: u64,
    #[serde(deserialize_with = "de_u64")]
    out_amount: u64,
}

/// Settlement record reported after execution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapEvent {
    pub input_mint: String,
    #[serde(deserialize_with = "de_u64")]
    pub input_amount: u64,
    pub output_mint: String,
    #[serde(deserialize_with = "de_u64")]
    pub output_amount: u64,
}

/// Outcome of an execute call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapExecutionResult {
    pub status: String,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub slot: Option<u64>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub total_input_amount: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub total_output_amount: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub input_amount_result: Option<u64>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub output_amount_result: Option<u64>,
    #[serde(default)]
    pub swap_events: Vec<SwapEvent>,
}

impl SwapExecutionResult {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// First settlement event, if any.
    pub fn settlement(&self) -> Option<&SwapEvent> {
        self.swap_events.first()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteRequest<'a> {
    signed_transaction: &'a str,
    request_id: &'a str,
}

/// Best-effort aggregator client.
#[derive(Debug, Clone)]
pub struct QuoteAggregatorClient {
    http: JupiterHttp,
}

impl QuoteAggregatorClient {
    pub fn new(http: JupiterHttp) -> Self {
        Self { http }
    }

    /// Request a quote for swapping `amount` of `input` into `output`.
    ///
    /// The raw amount is `round(amount × 10^input.decimals)`. Returns `None`
    /// on any failure.
    pub async fn create_order(
        &self,
        input: &'static TokenDescriptor,
        output: &'static TokenDescriptor,
        amount: f64,
        taker: &Pubkey,
    ) -> Option<PendingSwapOrder> {
        match self.fetch_order(input, output, amount, taker).await {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, input = input.symbol, output = output.symbol, "Quote request failed");
                None
            }
        }
    }

    async fn fetch_order(
        &self,
        input: &'static TokenDescriptor,
        output: &'static TokenDescriptor,
        amount: f64,
        taker: &Pubkey,
    ) -> Result<Option<PendingSwapOrder>, ProviderError> {
        let raw = input
            .to_raw(amount)
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let response: OrderResponse = self
            .http
            .get_json(
                ORDER_PATH,
                &[
                    ("inputMint", input.mint.to_string()),
                    ("outputMint", output.mint.to_string()),
                    ("amount", raw.to_string()),
                    ("taker", taker.to_string()),
                ],
            )
            .await?;

        let Some(transaction) = response.transaction.filter(|t| !t.is_empty()) else {
            debug!(request_id = %response.request_id, "Quote carried no transaction");
            return Ok(None);
        };

        debug!(
            request_id = %response.request_id,
            in_amount = response.in_amount,
            out_amount = response.out_amount,
            "Quote received"
        );
        Ok(Some(PendingSwapOrder {
            transaction,
            request_id: response.request_id,
            in_amount: response.in_amount,
            out_amount: response.out_amount,
            input,
            output,
        }))
    }

    /// Submit a signed swap transaction. Returns `None` on any failure.
    pub async fn execute(&self, signed_tx_base64: &str, request_id: &str) -> Option<SwapExecutionResult> {
        let body = ExecuteRequest {
            signed_transaction: signed_tx_base64,
            request_id,
        };
        match self.http.post_json(EXECUTE_PATH, &body).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(error = %e, request_id, "Swap execution request failed");
                None
            }
        }
    }
}

#[async_trait]
impl SwapVenue for QuoteAggregatorClient {
    async fn create_order(
        &self,
        input: &'static TokenDescriptor,
        output: &'static TokenDescriptor,
        amount: f64,
        taker: &Pubkey,
    ) -> Option<PendingSwapOrder> {
        QuoteAggregatorClient::create_order(self, input, output, amount, taker).await
    }

    async fn execute(&self, signed_tx_base64: &str, request_id: &str) -> Option<SwapExecutionResult> {
        QuoteAggregatorClient::execute(self, signed_tx_base64, request_id).await
    }
}
