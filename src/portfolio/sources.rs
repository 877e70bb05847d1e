// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upstream data sources of a sync tick.

use std::sync::Arc;

use async_trait::async_trait;

use crate::blockchain::{ChainError, Pubkey};
use crate::tokens::{LendProductInfo, PriceBook, TokenBalance};

/// On-chain balances. Errors skip the cycle.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn fetch_balances(&self, owner: &Pubkey) -> Result<Vec<TokenBalance>, ChainError>;
}

/// Spot prices. Best-effort: failures come back as an empty book.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn prices(&self, mints: &[&str]) -> PriceBook;
}

/// Lending products. Best-effort: failures come back empty.
#[async_trait]
pub trait LendSource: Send + Sync {
    async fn lend_products(&self) -> Vec<LendProductInfo>;
}

/// The three sources a sync tick reads from.
#[derive(Clone)]
pub struct SyncSources {
    pub balances: Arc<dyn BalanceSource>,
    pub prices: Arc<dyn PriceSource>,
    pub lend: Arc<dyn LendSource>,
}
