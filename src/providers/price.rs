// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Spot price feed.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{JupiterHttp, ProviderError};
use crate::portfolio::PriceSource;
use crate::tokens::{PriceBook, PriceQuote};

const PRICE_PATH: &str = "/price/v3";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceEntry {
    usd_price: f64,
    decimals: u8,
    #[serde(default)]
    price_change_24h: Option<f64>,
}

/// Best-effort price client.
#[derive(Debug, Clone)]
pub struct PriceOracleClient {
    http: JupiterHttp,
}

impl PriceOracleClient {
    pub fn new(http: JupiterHttp) -> Self {
        Self { http }
    }

    /// Prices for `mints`; empty on any failure.
    pub async fn get_prices(&self, mints: &[&str]) -> PriceBook {
        if mints.is_empty() {
            return PriceBook::default();
        }
        match self.fetch(mints).await {
            Ok(book) => {
                debug!(requested = mints.len(), priced = book.len(), "Prices refreshed");
                book
            }
            Err(e) => {
                warn!(error = %e, "Price fetch failed; continuing without prices");
                PriceBook::default()
            }
        }
    }

    async fn fetch(&self, mints: &[&str]) -> Result<PriceBook, ProviderError> {
        let raw: HashMap<String, Value> = self
            .http
            .get_json(PRICE_PATH, &[("ids", mints.join(","))])
            .await?;

        let quotes = raw
            .into_iter()
            .filter_map(|(mint, value)| {
                let entry: PriceEntry = serde_json::from_value(value).ok()?;
                Some((
                    mint,
                    PriceQuote {
                        usd_price: entry.usd_price,
                        decimals: entry.decimals,
                        change_24h: entry.price_change_24h,
                    },
                ))
            })
            .collect();
        Ok(PriceBook::new(quotes))
    }
}

#[async_trait]
impl PriceSource for PriceOracleClient {
    async fn prices(&self, mints: &[&str]) -> PriceBook {
        self.get_prices(mints).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_server;
    use crate::tokens::registry::{SOL, USDC};
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::time::Duration;

    fn client(base: &str) -> PriceOracleClient {
        PriceOracleClient::new(
            JupiterHttp::new(base, Some("test-key".into()), Duration::from_secs(5)).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_prices_decoded_and_bad_entries_skipped() {
        let router = Router::new().route(
            "/price/v3",
            get(
                |headers: HeaderMap, Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(headers["x-api-key"], "test-key");
                    assert_eq!(q["ids"], format!("{},{}", SOL.mint, USDC.mint));
                    Json(json!({
                        SOL.mint: {"usdPrice": 150.25, "blockId": 1, "decimals": 9, "priceChange24h": -1.5},
                        USDC.mint: {"usdPrice": 1.0, "decimals": 6},
                        "Broken": null
                    }))
                },
            ),
        );
        let base = test_server::spawn(router).await;

        let book = client(&base).get_prices(&[SOL.mint, USDC.mint]).await;
        assert_eq!(book.len(), 2);
        assert_eq!(book.usd_price(SOL.mint), 150.25);
        assert_eq!(book.get(SOL.mint).unwrap().change_24h, Some(-1.5));
        assert_eq!(book.get(USDC.mint).unwrap().change_24h, None);
    }

    #[tokio::test]
    async fn test_prices_degrade_to_empty() {
        let router = Router::new().route(
            "/price/v3",
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let base = test_server::spawn(router).await;
        assert!(client(&base).get_prices(&[SOL.mint]).await.is_empty());

        let dead = test_server::dead_url().await;
        assert!(client(&dead).get_prices(&[SOL.mint]).await.is_empty());
    }

    #[tokio::test]
    async fn test_no_mints_no_request() {
        let dead = test_server::dead_url().await;
        assert!(client(&dead).get_prices(&[]).await.is_empty());
    }
}
