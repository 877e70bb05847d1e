// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Portfolio Sync Engine
//!
//! Background task that keeps the published balance views in step with the
//! chain, the price feed and the lending feed.
//!
//! ## Strategy
//!
//! Every `interval` (default 15 s) one tick runs, strictly in order:
//! 1. Refresh prices for every registered mint.
//! 2. Refresh lending products.
//! 3. Fetch on-chain balances of the bound wallet.
//! 4. Merge them into the NORMAL / XSTOCK / LEND partitions.
//! 5. Persist the merged list to the snapshot.
//! 6. Publish the new views.
//!
//! Price and lend failures degrade to the last known data. A balance fetch
//! failure skips the cycle. A persistence failure stops the loop.
//!
//! Only one tick is in flight at a time; a slow tick defers the next one.
//!
//! ## Swap suppression
//!
//! After a successful swap the orchestrator patches the published views and
//! sets a single-use flag that makes the next tick a no-op, so chain data
//! that has not caught up yet does not overwrite the patch. A tick that is
//! already running when the flag is set is not affected and may still
//! publish stale balances.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`. Cancelling the binding's
//! token drops any in-flight tick; its results are never published.

pub mod sources;
pub mod views;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::blockchain::Pubkey;
use crate::providers::aggregator::SwapEvent;
use crate::storage::{LocalStorage, SnapshotRepository, StorageError};
use crate::tokens::{registry, LendBook, PriceBook};

pub use sources::{BalanceSource, LendSource, PriceSource, SyncSources};
pub use views::BalanceViews;

/// Default interval between sync ticks.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(15);

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Uninitialized,
    WalletBound,
    Fetching,
    Merging,
    Published,
    Stopped,
}

/// Errors that end or refuse a tick.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("No wallet is bound")]
    NotBound,

    #[error("Persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// New views were published.
    Published,
    /// The single-use suppression flag consumed this tick.
    Suppressed,
    /// Balances could not be fetched; nothing changed.
    Skipped,
    /// The binding was torn down mid-tick; results were discarded.
    Cancelled,
}

/// Last known market data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketData {
    pub prices: PriceBook,
    pub lend: LendBook,
}

#[derive(Debug, Clone)]
struct Binding {
    owner: Pubkey,
    cancel: CancellationToken,
}

/// Orchestrates periodic refresh of the published portfolio.
pub struct PortfolioSyncEngine {
    sources: SyncSources,
    storage: Arc<LocalStorage>,
    interval: Duration,
    binding: RwLock<Option<Binding>>,
    views: watch::Sender<Arc<BalanceViews>>,
    market: watch::Sender<Arc<MarketData>>,
    state: watch::Sender<SyncState>,
    suppress_next: AtomicBool,
    tick_guard: Mutex<()>,
}

impl PortfolioSyncEngine {
    pub fn new(sources: SyncSources, storage: Arc<LocalStorage>, interval: Duration) -> Self {
        Self {
            sources,
            storage,
            interval,
            binding: RwLock::new(None),
            views: watch::Sender::new(Arc::new(BalanceViews::default())),
            market: watch::Sender::new(Arc::new(MarketData::default())),
            state: watch::Sender::new(SyncState::Uninitialized),
            suppress_next: AtomicBool::new(false),
            tick_guard: Mutex::new(()),
        }
    }

    // ========== Published State ==========

    /// Current views (cheap clone of an immutable snapshot).
    pub fn views(&self) -> Arc<BalanceViews> {
        self.views.borrow().clone()
    }

    pub fn subscribe_views(&self) -> watch::Receiver<Arc<BalanceViews>> {
        self.views.subscribe()
    }

    pub fn market(&self) -> Arc<MarketData> {
        self.market.borrow().clone()
    }

    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub async fn owner(&self) -> Option<Pubkey> {
        self.binding.read().await.as_ref().map(|b| b.owner)
    }

    // ========== Binding ==========

    /// Bind a wallet and seed the views from the durable snapshot.
    ///
    /// `cancel` is the session token; once it fires no further results
    /// are published for this binding.
    pub async fn bind(&self, owner: Pubkey, cancel: CancellationToken) {
        *self.binding.write().await = Some(Binding { owner, cancel });
        self.suppress_next.store(false, Ordering::SeqCst);
        self.seed_from_snapshot(&owner);
        self.state.send_replace(SyncState::WalletBound);
        info!(owner = %owner, "Wallet bound to portfolio sync");
    }

    /// Publish snapshot contents so consumers never start from an empty
    /// view purely because the network is slow.
    fn seed_from_snapshot(&self, owner: &Pubkey) {
        match SnapshotRepository::new(&self.storage).load(&owner.to_string()) {
            Ok(balances) => {
                debug!(count = balances.len(), "Seeded views from snapshot");
                self.views
                    .send_replace(Arc::new(BalanceViews::merge(&balances)));
            }
            Err(e) => {
                warn!(error = %e, "Snapshot unreadable; starting from empty views");
                self.views.send_replace(Arc::new(BalanceViews::default()));
            }
        }
    }

    /// Drop the binding and clear all published state.
    ///
    /// With `forget` the durable snapshot is removed as well.
    pub async fn unbind(&self, forget: bool) -> Result<(), SyncError> {
        // waits for an in-flight tick to observe cancellation and finish
        let _guard = self.tick_guard.lock().await;
        *self.binding.write().await = None;
        self.suppress_next.store(false, Ordering::SeqCst);
        self.views.send_replace(Arc::new(BalanceViews::default()));
        self.market.send_replace(Arc::new(MarketData::default()));
        self.state.send_replace(SyncState::Uninitialized);
        if forget {
            SnapshotRepository::new(&self.storage).clear()?;
        }
        info!(forget, "Wallet unbound from portfolio sync");
        Ok(())
    }

    // ========== Ticks ==========

    /// Make the next scheduled tick a no-op.
    pub fn suppress_next_tick(&self) {
        self.suppress_next.store(true, Ordering::SeqCst);
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress_next.load(Ordering::SeqCst)
    }

    /// Run one scheduled tick.
    pub async fn tick(&self) -> Result<TickOutcome, SyncError> {
        self.tick_inner(true).await
    }

    /// Run one tick now, ignoring the suppression flag. Waits for an
    /// in-flight tick instead of overlapping it.
    pub async fn refresh_now(&self) -> Result<TickOutcome, SyncError> {
        self.tick_inner(false).await
    }

    async fn tick_inner(&self, honor_suppression: bool) -> Result<TickOutcome, SyncError> {
        let _guard = self.tick_guard.lock().await;

        let binding = self.binding.read().await.clone().ok_or(SyncError::NotBound)?;

        if honor_suppression && self.suppress_next.swap(false, Ordering::SeqCst) {
            debug!("Sync tick suppressed after swap");
            return Ok(TickOutcome::Suppressed);
        }

        tokio::select! {
            result = self.sync_once(&binding.owner) => result,
            _ = binding.cancel.cancelled() => {
                debug!("Sync tick cancelled; results discarded");
                self.state.send_replace(SyncState::Stopped);
                Ok(TickOutcome::Cancelled)
            }
        }
    }

    async fn sync_once(&self, owner: &Pubkey) -> Result<TickOutcome, SyncError> {
        self.state.send_replace(SyncState::Fetching);

        let mints: Vec<&str> = registry::all().iter().map(|t| t.mint).collect();
        let prices = self.sources.prices.prices(&mints).await;
        let lend = self.sources.lend.lend_products().await;

        let balances = match self.sources.balances.fetch_balances(owner).await {
            Ok(balances) => balances,
            Err(e) => {
                warn!(owner = %owner, error = %e, "Balance fetch failed; skipping cycle");
                self.state.send_replace(self.settled_state());
                return Ok(TickOutcome::Skipped);
            }
        };

        self.state.send_replace(SyncState::Merging);
        let views = BalanceViews::merge(&balances);
        let market = self.merge_market(prices, lend);

        if let Err(e) = SnapshotRepository::new(&self.storage).save(&owner.to_string(), &views.to_list()) {
            error!(owner = %owner, error = %e, "Snapshot persistence failed");
            return Err(SyncError::Persistence(e));
        }

        self.market.send_replace(Arc::new(market));
        self.views.send_replace(Arc::new(views));
        self.state.send_replace(SyncState::Published);
        debug!(owner = %owner, balances = balances.len(), "Portfolio published");
        Ok(TickOutcome::Published)
    }

    /// New market data, keeping last known values for empty feeds.
    fn merge_market(&self, prices: PriceBook, lend: Vec<crate::tokens::LendProductInfo>) -> MarketData {
        let previous = self.market();
        MarketData {
            prices: if prices.is_empty() { previous.prices.clone() } else { prices },
            lend: if lend.is_empty() {
                previous.lend.clone()
            } else {
                LendBook::new(lend)
            },
        }
    }

    fn settled_state(&self) -> SyncState {
        if self.views.borrow().is_empty() {
            SyncState::WalletBound
        } else {
            SyncState::Published
        }
    }

    // ========== Swap Patch ==========

    /// Apply a settled swap to the published views.
    ///
    /// Returns `false`, leaving the views untouched, when either balance is
    /// missing.
    pub fn apply_swap_patch(&self, event: &SwapEvent) -> bool {
        let current = self.views();
        match current.with_swap_applied(event) {
            Some(next) => {
                self.views.send_replace(Arc::new(next));
                info!(
                    input_mint = %event.input_mint,
                    input_amount = event.input_amount,
                    output_mint = %event.output_mint,
                    output_amount = event.output_amount,
                    "Applied optimistic swap patch"
                );
                true
            }
            None => {
                debug!("Swap patch skipped: balance not in published views");
                false
            }
        }
    }

    // ========== Loop ==========

    /// Run the sync loop until `shutdown` fires or persistence fails.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(engine.clone().run(shutdown.clone()));
    /// ```
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) -> Result<(), SyncError> {
        info!(
            interval_secs = self.interval.as_secs(),
            "Portfolio sync starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match self.tick().await {
                Ok(outcome) => debug!(?outcome, "Sync tick finished"),
                Err(SyncError::NotBound) => {
                    info!("Portfolio sync has no wallet; stopping");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Portfolio sync stopped");
                    self.state.send_replace(SyncState::Stopped);
                    return Err(e);
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => break,
            }
        }

        info!("Portfolio sync shutting down");
        self.state.send_replace(SyncState::Stopped);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::blockchain::ChainError;
    use crate::storage::StoragePaths;
    use crate::tokens::registry::{by_symbol, SOL, USDC};
    use crate::tokens::{LendProductInfo, PriceQuote, TokenBalance};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;

    /// Scripted balances with a call counter and optional gate.
    pub(crate) struct FakeChain {
        pub balances: StdMutex<Result<Vec<TokenBalance>, String>>,
        pub calls: AtomicUsize,
        pub gate: Option<Arc<tokio::sync::Notify>>,
    }

    impl Default for FakeChain {
        fn default() -> Self {
            Self::with(Vec::new())
        }
    }

    impl FakeChain {
        pub fn with(balances: Vec<TokenBalance>) -> Self {
            Self {
                balances: StdMutex::new(Ok(balances)),
                calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        pub fn fail(&self) {
            *self.balances.lock().unwrap() = Err("connection refused".to_string());
        }
    }

    #[async_trait]
    impl BalanceSource for FakeChain {
        async fn fetch_balances(&self, _owner: &Pubkey) -> Result<Vec<TokenBalance>, ChainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.balances
                .lock()
                .unwrap()
                .clone()
                .map_err(ChainError::Network)
        }
    }

    #[derive(Default)]
    pub(crate) struct FakePrices {
        pub quotes: StdMutex<HashMap<String, PriceQuote>>,
    }

    #[async_trait]
    impl PriceSource for FakePrices {
        async fn prices(&self, _mints: &[&str]) -> PriceBook {
            PriceBook::new(self.quotes.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeLend {
        pub products: StdMutex<Vec<LendProductInfo>>,
    }

    #[async_trait]
    impl LendSource for FakeLend {
        async fn lend_products(&self) -> Vec<LendProductInfo> {
            self.products.lock().unwrap().clone()
        }
    }

    pub(crate) fn test_storage() -> Arc<LocalStorage> {
        let dir = std::env::temp_dir().join(format!("test-portfolio-{}", uuid::Uuid::new_v4()));
        let mut storage = LocalStorage::new(StoragePaths::new(dir));
        storage.initialize().expect("Failed to initialize");
        Arc::new(storage)
    }

    pub(crate) fn cleanup(storage: &LocalStorage) {
        let _ = std::fs::remove_dir_all(storage.paths().root());
    }

    pub(crate) fn engine_with(chain: Arc<FakeChain>, storage: Arc<LocalStorage>) -> Arc<PortfolioSyncEngine> {
        let sources = SyncSources {
            balances: chain,
            prices: Arc::new(FakePrices::default()),
            lend: Arc::new(FakeLend::default()),
        };
        Arc::new(PortfolioSyncEngine::new(sources, storage, Duration::from_millis(20)))
    }

    fn owner() -> Pubkey {
        Pubkey::new([1u8; 32])
    }

    #[tokio::test]
    async fn tick_requires_binding() {
        let storage = test_storage();
        let engine = engine_with(Arc::new(FakeChain::default()), storage.clone());
        assert!(matches!(engine.tick().await, Err(SyncError::NotBound)));
        assert_eq!(engine.state(), SyncState::Uninitialized);
        cleanup(&storage);
    }

    #[tokio::test]
    async fn tick_publishes_merged_views() {
        let storage = test_storage();
        let chain = Arc::new(FakeChain::with(vec![
            TokenBalance::new(&USDC, 10.5),
            TokenBalance::new(&SOL, 2.0),
        ]));
        let engine = engine_with(chain, storage.clone());
        engine.bind(owner(), CancellationToken::new()).await;
        assert_eq!(engine.state(), SyncState::WalletBound);
        let mut rx = engine.subscribe_views();

        assert_eq!(engine.tick().await.unwrap(), TickOutcome::Published);
        assert_eq!(engine.state(), SyncState::Published);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().normal.len(), 2);

        let views = engine.views();
        assert_eq!(
            views.normal,
            vec![TokenBalance::new(&SOL, 2.0), TokenBalance::new(&USDC, 10.5)]
        );
        assert!(views.xstock.is_empty() && views.lend.is_empty());

        // persisted
        let stored = SnapshotRepository::new(&storage).load(&owner().to_string()).unwrap();
        assert_eq!(stored, views.to_list());
        cleanup(&storage);
    }

    #[tokio::test]
    async fn tick_is_idempotent() {
        let storage = test_storage();
        let spy = by_symbol("SPYx").unwrap();
        let chain = Arc::new(FakeChain::with(vec![
            TokenBalance::new(spy, 1.0),
            TokenBalance::new(&SOL, 2.0),
        ]));
        let engine = engine_with(chain, storage.clone());
        engine.bind(owner(), CancellationToken::new()).await;

        engine.tick().await.unwrap();
        let first = engine.views();
        engine.tick().await.unwrap();
        assert_eq!(*first, *engine.views());
        cleanup(&storage);
    }

    #[tokio::test]
    async fn bind_seeds_from_snapshot() {
        let storage = test_storage();
        SnapshotRepository::new(&storage)
            .save(&owner().to_string(), &[TokenBalance::new(&USDC, 7.0)])
            .unwrap();

        let chain = Arc::new(FakeChain::default());
        let engine = engine_with(chain.clone(), storage.clone());
        engine.bind(owner(), CancellationToken::new()).await;

        assert_eq!(engine.views().normal, vec![TokenBalance::new(&USDC, 7.0)]);
        assert_eq!(chain.calls.load(Ordering::SeqCst), 0);
        cleanup(&storage);
    }

    #[tokio::test]
    async fn balance_failure_keeps_last_views() {
        let storage = test_storage();
        let chain = Arc::new(FakeChain::with(vec![TokenBalance::new(&SOL, 1.0)]));
        let engine = engine_with(chain.clone(), storage.clone());
        engine.bind(owner(), CancellationToken::new()).await;
        engine.tick().await.unwrap();

        chain.fail();
        assert_eq!(engine.tick().await.unwrap(), TickOutcome::Skipped);
        assert_eq!(engine.views().normal, vec![TokenBalance::new(&SOL, 1.0)]);
        assert_eq!(engine.state(), SyncState::Published);
        cleanup(&storage);
    }

    #[tokio::test]
    async fn empty_price_feed_keeps_last_known_prices() {
        let storage = test_storage();
        let prices = Arc::new(FakePrices::default());
        prices.quotes.lock().unwrap().insert(
            SOL.mint.to_string(),
            PriceQuote {
                usd_price: 150.0,
                decimals: 9,
                change_24h: None,
            },
        );
        let sources = SyncSources {
            balances: Arc::new(FakeChain::with(vec![TokenBalance::new(&SOL, 1.0)])),
            prices: prices.clone(),
            lend: Arc::new(FakeLend::default()),
        };
        let engine = PortfolioSyncEngine::new(sources, storage.clone(), DEFAULT_SYNC_INTERVAL);
        engine.bind(owner(), CancellationToken::new()).await;

        engine.tick().await.unwrap();
        assert_eq!(engine.market().prices.usd_price(SOL.mint), 150.0);

        prices.quotes.lock().unwrap().clear();
        engine.tick().await.unwrap();
        assert_eq!(engine.market().prices.usd_price(SOL.mint), 150.0);
        assert_eq!(engine.market().lend.apy("anything"), 0.0);
        cleanup(&storage);
    }

    #[tokio::test]
    async fn suppressed_tick_leaves_patch_in_place() {
        let storage = test_storage();
        let chain = Arc::new(FakeChain::with(vec![
            TokenBalance::new(&SOL, 2.0),
            TokenBalance::new(&USDC, 10.5),
        ]));
        let engine = engine_with(chain.clone(), storage.clone());
        engine.bind(owner(), CancellationToken::new()).await;
        engine.tick().await.unwrap();

        let event = SwapEvent {
            input_mint: USDC.mint.to_string(),
            input_amount: 5_000_000,
            output_mint: SOL.mint.to_string(),
            output_amount: 33_000_000,
        };
        assert!(engine.apply_swap_patch(&event));
        engine.suppress_next_tick();
        let patched = engine.views();

        let calls = chain.calls.load(Ordering::SeqCst);
        assert_eq!(engine.tick().await.unwrap(), TickOutcome::Suppressed);
        assert_eq!(*engine.views(), *patched);
        assert_eq!(chain.calls.load(Ordering::SeqCst), calls);

        // single use
        assert!(!engine.is_suppressed());
        assert_eq!(engine.tick().await.unwrap(), TickOutcome::Published);
        cleanup(&storage);
    }

    #[tokio::test]
    async fn refresh_now_ignores_suppression() {
        let storage = test_storage();
        let engine = engine_with(Arc::new(FakeChain::with(vec![])), storage.clone());
        engine.bind(owner(), CancellationToken::new()).await;
        engine.suppress_next_tick();

        assert_eq!(engine.refresh_now().await.unwrap(), TickOutcome::Published);
        assert!(engine.is_suppressed());
        cleanup(&storage);
    }

    #[tokio::test]
    async fn ticks_never_overlap() {
        let storage = test_storage();
        let gate = Arc::new(tokio::sync::Notify::new());
        let chain = Arc::new(FakeChain {
            gate: Some(gate.clone()),
            ..FakeChain::with(vec![TokenBalance::new(&SOL, 1.0)])
        });
        let engine = engine_with(chain.clone(), storage.clone());
        engine.bind(owner(), CancellationToken::new()).await;

        let first = tokio::spawn({
            let engine = engine.clone();
            async move { engine.tick().await }
        });
        let second = tokio::spawn({
            let engine = engine.clone();
            async move { engine.refresh_now().await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(chain.calls.load(Ordering::SeqCst), 1);

        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(chain.calls.load(Ordering::SeqCst), 2);
        gate.notify_one();

        assert_eq!(first.await.unwrap().unwrap(), TickOutcome::Published);
        assert_eq!(second.await.unwrap().unwrap(), TickOutcome::Published);
        cleanup(&storage);
    }

    #[tokio::test]
    async fn cancelled_binding_discards_in_flight_results() {
        let storage = test_storage();
        let gate = Arc::new(tokio::sync::Notify::new());
        let chain = Arc::new(FakeChain {
            gate: Some(gate.clone()),
            ..FakeChain::with(vec![TokenBalance::new(&SOL, 9.0)])
        });
        let engine = engine_with(chain, storage.clone());
        let cancel = CancellationToken::new();
        engine.bind(owner(), cancel.clone()).await;

        let tick = tokio::spawn({
            let engine = engine.clone();
            async move { engine.tick().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        assert_eq!(tick.await.unwrap().unwrap(), TickOutcome::Cancelled);
        assert!(engine.views().is_empty());
        assert_eq!(engine.state(), SyncState::Stopped);
        cleanup(&storage);
    }

    #[tokio::test]
    async fn persistence_failure_stops_loop() {
        let storage = test_storage();
        let engine = engine_with(
            Arc::new(FakeChain::with(vec![TokenBalance::new(&SOL, 1.0)])),
            storage.clone(),
        );
        engine.bind(owner(), CancellationToken::new()).await;

        // a directory where the snapshot file should go makes the rename fail
        let snapshot = storage.paths().snapshot();
        std::fs::create_dir_all(&snapshot).unwrap();
        std::fs::write(snapshot.join("blocker"), b"x").unwrap();

        let result = engine.clone().run(CancellationToken::new()).await;
        assert!(matches!(result, Err(SyncError::Persistence(_))));
        assert_eq!(engine.state(), SyncState::Stopped);
        cleanup(&storage);
    }

    #[tokio::test]
    async fn loop_stops_on_shutdown() {
        let storage = test_storage();
        let chain = Arc::new(FakeChain::with(vec![TokenBalance::new(&SOL, 1.0)]));
        let engine = engine_with(chain.clone(), storage.clone());
        let shutdown = CancellationToken::new();
        engine.bind(owner(), shutdown.clone()).await;

        let handle = tokio::spawn(engine.clone().run(shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(70)).await;
        shutdown.cancel();
        handle.await.unwrap().unwrap();

        assert!(chain.calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(engine.state(), SyncState::Stopped);

        engine.unbind(true).await.unwrap();
        assert_eq!(engine.state(), SyncState::Uninitialized);
        assert!(engine.views().is_empty());
        assert!(!storage.exists(storage.paths().snapshot()));
        cleanup(&storage);
    }
}
