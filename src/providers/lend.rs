// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Lending rate feed.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{de_f64, JupiterHttp, ProviderError};
use crate::portfolio::LendSource;
use crate::tokens::{registry, LendProductInfo};

const EARN_TOKENS_PATH: &str = "/lend/v1/earn/tokens";

/// Rates are reported in basis points.
const BASIS_POINTS: f64 = 10_000.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EarnToken {
    /// Lend-token mint
    address: String,
    /// Underlying asset mint
    asset_address: String,
    #[serde(deserialize_with = "de_f64")]
    total_rate: f64,
}

/// Best-effort lending product client.
#[derive(Debug, Clone)]
pub struct LendRateClient {
    http: JupiterHttp,
}

impl LendRateClient {
    pub fn new(http: JupiterHttp) -> Self {
        Self { http }
    }

    /// Registered lend products; empty on any failure.
    pub async fn get_lend_rates(&self) -> Vec<LendProductInfo> {
        match self.fetch().await {
            Ok(products) => {
                debug!(count = products.len(), "Lend rates refreshed");
                products
            }
            Err(e) => {
                warn!(error = %e, "Lend rate fetch failed; APYs default to zero");
                Vec::new()
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<LendProductInfo>, ProviderError> {
        let raw: Vec<Value> = self.http.get_json(EARN_TOKENS_PATH, &[]).await?;

        Ok(raw
            .into_iter()
            .filter_map(|value| serde_json::from_value::<EarnToken>(value).ok())
            .filter_map(|item| {
                let token = registry::by_mint(&item.address)?;
                let underlying = registry::by_mint(&item.asset_address)?;
                Some(LendProductInfo {
                    token,
                    underlying,
                    apy: item.total_rate / BASIS_POINTS,
                })
            })
            .collect())
    }
}

#[async_trait]
impl LendSource for LendRateClient {
    async fn lend_products(&self) -> Vec<LendProductInfo> {
        self.get_lend_rates().await
    }
}
