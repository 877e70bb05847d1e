// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Swap Orchestrator
//!
//! Drives the quote lifecycle against an external aggregator:
//!
//! ```text
//! Idle -> Quoting -> Committed -> Executing -> Settled | Failed -> Idle
//! ```
//!
//! While quoting, a background loop requests a fresh quote every
//! `interval` and publishes the latest one. Quote failures are swallowed;
//! the next iteration retries.
//!
//! Committing takes the latest quote, stops the loop, signs the quoted
//! transaction and submits it. A successful execution is applied to the
//! published portfolio views at once (optimistic patch) and the next sync
//! tick is suppressed so stale chain data does not overwrite it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::blockchain::{KeyError, Pubkey, WalletKeyStore};
use crate::portfolio::PortfolioSyncEngine;
use crate::providers::aggregator::{PendingSwapOrder, SwapExecutionResult};
use crate::session::Notifier;
use crate::tokens::TokenDescriptor;

/// Default interval between quote requests.
pub const DEFAULT_QUOTE_INTERVAL: Duration = Duration::from_secs(15);

/// Quote and execution venue.
///
/// Both calls are best-effort: any failure is `None`.
#[async_trait]
pub trait SwapVenue: Send + Sync {
    async fn create_order(
        &self,
        input: &'static TokenDescriptor,
        output: &'static TokenDescriptor,
        amount: f64,
        taker: &Pubkey,
    ) -> Option<PendingSwapOrder>;

    async fn execute(&self, signed_tx_base64: &str, request_id: &str) -> Option<SwapExecutionResult>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SwapState {
    Idle,
    Quoting,
    Committed,
    Executing,
    Settled,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error("No quote available")]
    NoQuote,

    #[error("Quote {0} is no longer current")]
    StaleQuote(String),

    #[error("Quoted transaction is not valid base64: {0}")]
    Decode(String),

    #[error(transparent)]
    Signing(#[from] KeyError),

    #[error("Swap failed with status {status}")]
    Rejected { status: String, code: Option<i64> },

    #[error("Swap execution returned no result")]
    NoResult,

    #[error("Swap was cancelled")]
    Cancelled,
}

/// What the quote loop is asked to price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteRequest {
    pub input: &'static TokenDescriptor,
    pub output: &'static TokenDescriptor,
    pub amount: f64,
}

impl QuoteRequest {
    /// Only strictly positive finite amounts are quoted.
    pub fn is_quotable(&self) -> bool {
        self.amount.is_finite() && self.amount > 0.0
    }
}

struct QuoteLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct SwapOrchestrator {
    venue: Arc<dyn SwapVenue>,
    engine: Arc<PortfolioSyncEngine>,
    notifier: Notifier,
    interval: Duration,
    quote_loop: Mutex<Option<QuoteLoop>>,
    latest: watch::Sender<Option<PendingSwapOrder>>,
    state: watch::Sender<SwapState>,
}

impl SwapOrchestrator {
    pub fn new(
        venue: Arc<dyn SwapVenue>,
        engine: Arc<PortfolioSyncEngine>,
        notifier: Notifier,
        interval: Duration,
    ) -> Self {
        Self {
            venue,
            engine,
            notifier,
            interval,
            quote_loop: Mutex::new(None),
            latest: watch::Sender::new(None),
            state: watch::Sender::new(SwapState::Idle),
        }
    }

    pub fn state(&self) -> SwapState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SwapState> {
        self.state.subscribe()
    }

    /// The most recent quote, if any.
    pub fn latest_quote(&self) -> Option<PendingSwapOrder> {
        self.latest.borrow().clone()
    }

    pub fn subscribe_quotes(&self) -> watch::Receiver<Option<PendingSwapOrder>> {
        self.latest.subscribe()
    }

    // ========== Quoting ==========

    /// Start (or restart) quoting `request` for `taker`.
    ///
    /// A zero, negative or non-finite amount stops quoting and issues no
    /// request. The loop is a child of `session`, so session teardown stops
    /// it as well.
    pub async fn request_quote(
        self: &Arc<Self>,
        request: QuoteRequest,
        taker: Pubkey,
        session: &CancellationToken,
    ) {
        self.stop_quoting().await;
        if !request.is_quotable() {
            debug!(amount = request.amount, "Amount not quotable; staying idle");
            return;
        }

        let cancel = session.child_token();
        let this = Arc::clone(self);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { this.run_quotes(request, taker, token).await });

        self.state.send_replace(SwapState::Quoting);
        *self.quote_loop.lock().await = Some(QuoteLoop { cancel, handle });
        info!(
            input = request.input.symbol,
            output = request.output.symbol,
            amount = request.amount,
            "Quoting started"
        );
    }

    async fn run_quotes(&self, request: QuoteRequest, taker: Pubkey, cancel: CancellationToken) {
        loop {
            let order = tokio::select! {
                order = self.venue.create_order(request.input, request.output, request.amount, &taker) => order,
                _ = cancel.cancelled() => break,
            };
            match order {
                Some(order) => {
                    debug!(request_id = %order.request_id, out_amount = order.out_amount, "Quote refreshed");
                    self.latest.send_replace(Some(order));
                }
                None => debug!("No quote this round"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = cancel.cancelled() => break,
            }
        }
        debug!("Quote loop stopped");
    }

    /// Stop the quote loop and drop the latest quote.
    pub async fn stop_quoting(&self) {
        self.halt_loop().await;
        self.latest.send_replace(None);
        if self.state() == SwapState::Quoting {
            self.state.send_replace(SwapState::Idle);
        }
    }

    async fn halt_loop(&self) {
        let running = self.quote_loop.lock().await.take();
        if let Some(running) = running {
            running.cancel.cancel();
            let _ = running.handle.await;
        }
    }

    // ========== Commit ==========

    /// Sign and execute the latest quote.
    ///
    /// With `request_id` the commit only proceeds if it still names the
    /// latest quote. On success the settlement is patched into the
    /// published views and the next sync tick is suppressed; on any
    /// failure the views stay untouched.
    pub async fn commit(
        &self,
        keys: &WalletKeyStore,
        request_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SwapExecutionResult, SwapError> {
        let order = self.claim_quote(request_id)?;

        self.halt_loop().await;
        self.latest.send_replace(None);
        self.state.send_replace(SwapState::Committed);

        let outcome = self.sign_and_execute(keys, &order, cancel).await;
        match &outcome {
            Ok(result) => self.settle(&order, result),
            Err(SwapError::Cancelled) => debug!("Swap cancelled; result discarded"),
            Err(e) => {
                warn!(request_id = %order.request_id, error = %e, "Swap failed");
                self.state.send_replace(SwapState::Failed);
                self.notifier.error(format!(
                    "Swap {} -> {} failed: {e}",
                    order.input.symbol, order.output.symbol
                ));
            }
        }
        self.state.send_replace(SwapState::Idle);
        outcome
    }

    /// Take the latest quote out of the slot so it is committed at most once.
    fn claim_quote(&self, request_id: Option<&str>) -> Result<PendingSwapOrder, SwapError> {
        let mut claimed = Err(SwapError::NoQuote);
        self.latest.send_if_modified(|slot| match slot {
            Some(order) if request_id.is_some_and(|id| id != order.request_id) => {
                claimed = Err(SwapError::StaleQuote(request_id.unwrap_or_default().to_string()));
                false
            }
            Some(_) => {
                claimed = slot.take().ok_or(SwapError::NoQuote);
                true
            }
            None => false,
        });
        claimed
    }

    async fn sign_and_execute(
        &self,
        keys: &WalletKeyStore,
        order: &PendingSwapOrder,
        cancel: &CancellationToken,
    ) -> Result<SwapExecutionResult, SwapError> {
        let unsigned = BASE64
            .decode(&order.transaction)
            .map_err(|e| SwapError::Decode(e.to_string()))?;
        let signed = BASE64.encode(keys.sign(&unsigned)?);

        self.state.send_replace(SwapState::Executing);
        let result = tokio::select! {
            result = self.venue.execute(&signed, &order.request_id) => result,
            _ = cancel.cancelled() => return Err(SwapError::Cancelled),
        };
        // the call may have completed just as the session went away
        if cancel.is_cancelled() {
            return Err(SwapError::Cancelled);
        }

        match result {
            Some(result) if result.is_success() => Ok(result),
            Some(result) => Err(SwapError::Rejected {
                status: result.status,
                code: result.code,
            }),
            None => Err(SwapError::NoResult),
        }
    }

    fn settle(&self, order: &PendingSwapOrder, result: &SwapExecutionResult) {
        match result.settlement() {
            Some(event) => {
                self.engine.apply_swap_patch(event);
            }
            None => debug!(request_id = %order.request_id, "No settlement event; patch skipped"),
        }
        // a tick already in flight is not affected and may publish stale data
        self.engine.suppress_next_tick();

        self.state.send_replace(SwapState::Settled);
        info!(
            request_id = %order.request_id,
            signature = result.signature.as_deref().unwrap_or_default(),
            "Swap settled"
        );
        self.notifier.success(format!(
            "Swapped {} {} for {} {}",
            order.in_ui_amount(),
            order.input.symbol,
            order.out_ui_amount(),
            order.output.symbol
        ));
    }
}
