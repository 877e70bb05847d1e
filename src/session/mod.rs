// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Session
//!
//! Owns the signing key and the long-lived tasks bound to it, and exposes
//! the command surface used by the control API.
//!
//! ## Lifecycle
//!
//! ```text
//! logged out --create/load/restore--> bound (sync loop running) --logout--> logged out
//! ```
//!
//! Every task launched for a bound wallet runs under a child of the
//! session's cancellation token. Logout cancels that token, waits for the
//! sync loop, unbinds the engine and clears the secret slot and snapshot.
//!
//! The key is held behind an `Arc` and only ever lent to signing calls;
//! it is never copied.

pub mod notifier;
pub mod task;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::blockchain::{ChainClient, ChainError, KeyError, Pubkey, WalletKeyStore};
use crate::portfolio::{
    LendSource, PortfolioSyncEngine, PriceSource, SyncError, SyncSources, TickOutcome,
};
use crate::providers::aggregator::SwapExecutionResult;
use crate::storage::{LocalStorage, SecretRepository, StorageError};
use crate::swap::{QuoteRequest, SwapError, SwapOrchestrator, SwapVenue};
use crate::tokens::{lend_withdrawal_amount, registry, TokenDescriptor};

pub use notifier::{Notification, NotificationLevel, Notifier};
pub use task::{TaskError, TaskHandle};

/// Errors surfaced by session commands.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("No wallet is loaded")]
    NotBound,

    #[error("A wallet is already loaded")]
    AlreadyBound,

    #[error("Unknown token: {0}")]
    UnknownToken(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Chain(ChainError),

    #[error(transparent)]
    Swap(#[from] SwapError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Task(#[from] TaskError),
}

impl From<KeyError> for SessionError {
    fn from(e: KeyError) -> Self {
        match e {
            KeyError::InvalidKey(msg) => SessionError::InvalidKey(msg),
            other => SessionError::Chain(ChainError::Signing(other)),
        }
    }
}

impl From<ChainError> for SessionError {
    fn from(e: ChainError) -> Self {
        match e {
            ChainError::InvalidAddress(msg) => SessionError::InvalidAddress(msg),
            ChainError::InvalidAmount(msg) => SessionError::InvalidAmount(msg),
            other => SessionError::Chain(other),
        }
    }
}

impl From<SyncError> for SessionError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::NotBound => SessionError::NotBound,
            SyncError::Persistence(e) => SessionError::Storage(e),
        }
    }
}

/// Collaborators injected into a session.
pub struct SessionDeps {
    pub chain: Arc<ChainClient>,
    pub prices: Arc<dyn PriceSource>,
    pub lend: Arc<dyn LendSource>,
    pub venue: Arc<dyn SwapVenue>,
    pub storage: Arc<LocalStorage>,
    pub sync_interval: Duration,
    pub quote_interval: Duration,
}

struct ActiveWallet {
    keys: Arc<WalletKeyStore>,
    cancel: CancellationToken,
    sync: TaskHandle<Result<(), SyncError>>,
}

/// How a quote amount is denominated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuoteDenomination {
    /// Units of the input token.
    #[default]
    Input,
    /// Units of the input lend token's underlying asset.
    Underlying,
}

pub struct WalletSession {
    chain: Arc<ChainClient>,
    storage: Arc<LocalStorage>,
    engine: Arc<PortfolioSyncEngine>,
    swaps: Arc<SwapOrchestrator>,
    notifier: Notifier,
    active: RwLock<Option<ActiveWallet>>,
}

impl WalletSession {
    pub fn new(deps: SessionDeps) -> Self {
        let notifier = Notifier::new();
        let sources = SyncSources {
            balances: deps.chain.clone(),
            prices: deps.prices,
            lend: deps.lend,
        };
        let engine = Arc::new(PortfolioSyncEngine::new(
            sources,
            deps.storage.clone(),
            deps.sync_interval,
        ));
        let swaps = Arc::new(SwapOrchestrator::new(
            deps.venue,
            engine.clone(),
            notifier.clone(),
            deps.quote_interval,
        ));
        Self {
            chain: deps.chain,
            storage: deps.storage,
            engine,
            swaps,
            notifier,
            active: RwLock::new(None),
        }
    }

    pub fn engine(&self) -> &Arc<PortfolioSyncEngine> {
        &self.engine
    }

    pub fn swaps(&self) -> &Arc<SwapOrchestrator> {
        &self.swaps
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn is_bound(&self) -> bool {
        self.active.read().await.is_some()
    }

    pub async fn owner(&self) -> Option<Pubkey> {
        self.active.read().await.as_ref().map(|a| a.keys.pubkey())
    }

    // ========== Wallet Lifecycle ==========

    /// Generate a new wallet, persist it and bind it.
    pub async fn create_wallet(&self) -> Result<Pubkey, SessionError> {
        // Held until the wallet is bound: one secret slot, one sync task.
        let mut slot = self.active.write().await;
        if slot.is_some() {
            return Err(SessionError::AlreadyBound);
        }
        let keys = WalletKeyStore::generate();
        SecretRepository::new(&self.storage).save(&keys.export())?;
        let owner = self.activate(&mut slot, keys).await;
        self.notifier.success("Wallet created");
        Ok(owner)
    }

    /// Import a wallet from its secret, persist it and bind it.
    ///
    /// An invalid secret leaves the session logged out.
    pub async fn load_wallet(&self, secret: &str) -> Result<Pubkey, SessionError> {
        let mut slot = self.active.write().await;
        if slot.is_some() {
            return Err(SessionError::AlreadyBound);
        }
        let keys = WalletKeyStore::load(secret)?;
        SecretRepository::new(&self.storage).save(&keys.export())?;
        let owner = self.activate(&mut slot, keys).await;
        self.notifier.success("Wallet loaded");
        Ok(owner)
    }

    /// Bind the wallet stored in the secret slot, if any.
    pub async fn restore(&self) -> Result<Option<Pubkey>, SessionError> {
        let mut slot = self.active.write().await;
        if let Some(active) = slot.as_ref() {
            return Ok(Some(active.keys.pubkey()));
        }
        let Some(secret) = SecretRepository::new(&self.storage).load()? else {
            info!("No stored wallet; session stays logged out");
            return Ok(None);
        };
        let keys = WalletKeyStore::load(&secret).inspect_err(|e| {
            warn!(error = %e, "Stored secret is invalid; session stays logged out");
        })?;
        Ok(Some(self.activate(&mut slot, keys).await))
    }

    async fn activate(&self, slot: &mut Option<ActiveWallet>, keys: WalletKeyStore) -> Pubkey {
        let owner = keys.pubkey();
        let cancel = CancellationToken::new();
        self.engine.bind(owner, cancel.clone()).await;

        let sync = TaskHandle::spawn(&cancel, self.engine.clone().run(cancel.clone()));
        *slot = Some(ActiveWallet {
            keys: Arc::new(keys),
            cancel,
            sync,
        });
        info!(owner = %owner, "Wallet session started");
        owner
    }

    /// Tear down the bound wallet and forget it.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let active = self.active.write().await.take().ok_or(SessionError::NotBound)?;
        let owner = active.keys.pubkey();
        self.stop(active).await;

        self.engine.unbind(true).await?;
        SecretRepository::new(&self.storage).clear()?;
        info!(owner = %owner, "Wallet logged out");
        self.notifier.info("Logged out");
        Ok(())
    }

    /// Stop all tasks but keep the stored wallet for the next start.
    pub async fn shutdown(&self) {
        let active = self.active.write().await.take();
        if let Some(active) = active {
            self.stop(active).await;
            info!("Wallet session stopped");
        }
    }

    async fn stop(&self, active: ActiveWallet) {
        active.cancel.cancel();
        self.swaps.stop_quoting().await;
        match active.sync.join().await {
            Ok(Err(e)) => warn!(error = %e, "Portfolio sync had stopped with an error"),
            Ok(Ok(())) | Err(TaskError::Cancelled) => {}
            Err(e) => warn!(error = %e, "Portfolio sync task ended abnormally"),
        }
    }

    async fn keys_and_token(&self) -> Result<(Arc<WalletKeyStore>, CancellationToken), SessionError> {
        let active = self.active.read().await;
        let active = active.as_ref().ok_or(SessionError::NotBound)?;
        Ok((active.keys.clone(), active.cancel.clone()))
    }

    // ========== Portfolio ==========

    /// Run one sync tick now.
    pub async fn refresh(&self) -> Result<TickOutcome, SessionError> {
        self.keys_and_token().await?;
        Ok(self.engine.refresh_now().await?)
    }

    // ========== Chain Actions ==========

    /// Start a transfer as a cancellable task resolving to the signature.
    pub async fn transfer(
        &self,
        token: &'static TokenDescriptor,
        recipient: &str,
        amount: f64,
    ) -> Result<TaskHandle<Result<String, SessionError>>, SessionError> {
        let recipient: Pubkey = recipient.parse()?;
        validate_amount(amount)?;
        let (keys, cancel) = self.keys_and_token().await?;

        let chain = self.chain.clone();
        let notifier = self.notifier.clone();
        Ok(TaskHandle::spawn(&cancel, async move {
            let result = chain.transfer(&keys, token, &recipient, amount).await;
            match &result {
                Ok(_) => notifier.success(format!("Sent {amount} {}", token.symbol)),
                Err(e) => notifier.error(format!("Transfer of {} failed: {e}", token.symbol)),
            }
            result.map_err(SessionError::from)
        }))
    }

    /// Start creating the wallet's token account for `token`.
    pub async fn create_account(
        &self,
        token: &'static TokenDescriptor,
    ) -> Result<TaskHandle<Result<String, SessionError>>, SessionError> {
        let (keys, cancel) = self.keys_and_token().await?;

        let chain = self.chain.clone();
        let notifier = self.notifier.clone();
        Ok(TaskHandle::spawn(&cancel, async move {
            let result = chain.create_account(&keys, token).await;
            match &result {
                Ok(_) => notifier.success(format!("{} account created", token.symbol)),
                Err(e) => notifier.error(format!("Creating {} account failed: {e}", token.symbol)),
            }
            result.map_err(SessionError::from)
        }))
    }

    // ========== Swaps ==========

    /// Start quoting a swap; a non-positive amount stops quoting.
    ///
    /// Returns the input-token amount being quoted.
    pub async fn request_quote(
        &self,
        input: &'static TokenDescriptor,
        output: &'static TokenDescriptor,
        amount: f64,
        denomination: QuoteDenomination,
    ) -> Result<f64, SessionError> {
        let (keys, cancel) = self.keys_and_token().await?;
        let amount = match denomination {
            QuoteDenomination::Input => amount,
            QuoteDenomination::Underlying => self.lend_amount(input, amount)?,
        };

        let request = QuoteRequest {
            input,
            output,
            amount,
        };
        self.swaps.request_quote(request, keys.pubkey(), &cancel).await;
        Ok(amount)
    }

    fn lend_amount(&self, lend_token: &TokenDescriptor, amount: f64) -> Result<f64, SessionError> {
        let market = self.engine.market();
        let underlying = market.lend.underlying_of(lend_token.mint).ok_or_else(|| {
            SessionError::InvalidAmount(format!("{} has no known underlying asset", lend_token.symbol))
        })?;
        Ok(lend_withdrawal_amount(
            amount,
            market.prices.usd_price(underlying.mint),
            market.prices.usd_price(lend_token.mint),
        ))
    }

    pub async fn stop_quote(&self) {
        self.swaps.stop_quoting().await;
    }

    /// Commit the latest quote as a cancellable task.
    pub async fn commit_swap(
        &self,
        request_id: Option<String>,
    ) -> Result<TaskHandle<Result<SwapExecutionResult, SessionError>>, SessionError> {
        let (keys, cancel) = self.keys_and_token().await?;
        let swaps = self.swaps.clone();
        let session = cancel.clone();
        Ok(TaskHandle::spawn(&cancel, async move {
            swaps
                .commit(&keys, request_id.as_deref(), &session)
                .await
                .map_err(SessionError::from)
        }))
    }
}

/// Resolve a token by symbol or mint.
pub fn resolve_token(id: &str) -> Result<&'static TokenDescriptor, SessionError> {
    registry::by_symbol(id)
        .or_else(|| registry::by_mint(id))
        .ok_or_else(|| SessionError::UnknownToken(id.to_string()))
}

fn validate_amount(amount: f64) -> Result<(), SessionError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(SessionError::InvalidAmount(format!("{amount} is not a positive amount")))
    }
}
