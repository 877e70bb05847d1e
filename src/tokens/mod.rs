// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token model: registered descriptors, balances, prices and lend products.
//!
//! The mint address is the only join key between balances, prices and
//! descriptors. Anything whose mint is not registered is dropped.

pub mod registry;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::types::{Pubkey, TOKEN_2022_PROGRAM, TOKEN_PROGRAM};
use crate::blockchain::ChainError;

/// Asset category; decides partitioning and the account program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenCategory {
    Normal,
    Lend,
    Xstock,
}

impl TokenCategory {
    /// Token program that owns accounts created for this category.
    pub fn account_program(self) -> Pubkey {
        match self {
            TokenCategory::Xstock => TOKEN_2022_PROGRAM,
            TokenCategory::Normal | TokenCategory::Lend => TOKEN_PROGRAM,
        }
    }
}

/// Immutable description of a registered asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDescriptor {
    pub symbol: &'static str,
    pub name: &'static str,
    pub category: TokenCategory,
    /// Mint address (unique key)
    pub mint: &'static str,
    pub decimals: u8,
    /// Owning token program id
    pub program_id: &'static str,
}

impl TokenDescriptor {
    pub fn mint_pubkey(&self) -> Result<Pubkey, ChainError> {
        self.mint.parse()
    }

    pub fn program_pubkey(&self) -> Result<Pubkey, ChainError> {
        self.program_id.parse()
    }

    /// The synthetic native balance, not an SPL token.
    pub fn is_native(&self) -> bool {
        self.mint == registry::NATIVE_MINT
    }

    /// `round(amount × 10^decimals)`.
    pub fn to_raw(&self, amount: f64) -> Result<u64, ChainError> {
        to_raw_amount(amount, self.decimals)
    }

    /// `raw / 10^decimals`.
    pub fn to_ui(&self, raw: u64) -> f64 {
        raw as f64 / 10f64.powi(i32::from(self.decimals))
    }
}

/// Convert a human amount into base units.
pub fn to_raw_amount(amount: f64, decimals: u8) -> Result<u64, ChainError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ChainError::InvalidAmount(format!("{amount}")));
    }
    let raw = (amount * 10f64.powi(i32::from(decimals))).round();
    if raw > u64::MAX as f64 {
        return Err(ChainError::InvalidAmount(format!("{amount} overflows u64")));
    }
    Ok(raw as u64)
}

/// A balance of one registered token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBalance {
    pub token: &'static TokenDescriptor,
    pub amount: f64,
}

impl TokenBalance {
    pub fn new(token: &'static TokenDescriptor, amount: f64) -> Self {
        Self { token, amount }
    }

    /// USD value at `price`, zero when no quote is known.
    pub fn value(&self, price: Option<&PriceQuote>) -> f64 {
        price.map(|p| self.amount * p.usd_price).unwrap_or(0.0)
    }
}

/// Spot price of a mint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub usd_price: f64,
    pub decimals: u8,
    /// 24h change in percent
    #[serde(default)]
    pub change_24h: Option<f64>,
}

/// Prices keyed by mint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceBook {
    quotes: HashMap<String, PriceQuote>,
}

impl PriceBook {
    pub fn new(quotes: HashMap<String, PriceQuote>) -> Self {
        Self { quotes }
    }

    pub fn get(&self, mint: &str) -> Option<&PriceQuote> {
        self.quotes.get(mint)
    }

    pub fn usd_price(&self, mint: &str) -> f64 {
        self.get(mint).map(|q| q.usd_price).unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    /// Total USD value of `balances`.
    pub fn total_value(&self, balances: &[TokenBalance]) -> f64 {
        balances.iter().map(|b| b.value(self.get(b.token.mint))).sum()
    }

    /// Value-weighted 24h change of `balances` in percent.
    pub fn change_24h(&self, balances: &[TokenBalance]) -> f64 {
        let (now, before) = balances.iter().fold((0.0, 0.0), |(now, before), b| {
            let Some(quote) = self.get(b.token.mint) else {
                return (now, before);
            };
            let value = b.value(Some(quote));
            let change = quote.change_24h.unwrap_or(0.0);
            (now + value, before + value / (1.0 + change / 100.0))
        });
        if before == 0.0 {
            0.0
        } else {
            (now / before - 1.0) * 100.0
        }
    }
}

/// Lending product for a lend token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LendProductInfo {
    pub token: &'static TokenDescriptor,
    pub underlying: &'static TokenDescriptor,
    /// Annual rate as a fraction (0.05 = 5%)
    pub apy: f64,
}

/// Lend products keyed by lend-token mint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LendBook {
    products: HashMap<&'static str, LendProductInfo>,
}

impl LendBook {
    pub fn new(products: Vec<LendProductInfo>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.token.mint, p)).collect(),
        }
    }

    /// APY of a lend token; zero when unknown.
    pub fn apy(&self, mint: &str) -> f64 {
        self.products.get(mint).map(|p| p.apy).unwrap_or(0.0)
    }

    pub fn underlying_of(&self, mint: &str) -> Option<&'static TokenDescriptor> {
        self.products.get(mint).map(|p| p.underlying)
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Amount of lend token to swap when withdrawing `amount` of the underlying.
///
/// Returns 0 when the lend token has no price, which disables quoting.
pub fn lend_withdrawal_amount(amount: f64, underlying_price: f64, lend_price: f64) -> f64 {
    if lend_price <= 0.0 || !lend_price.is_finite() {
        return 0.0;
    }
    amount * underlying_price / lend_price
}
