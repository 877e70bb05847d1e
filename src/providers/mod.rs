// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! External market data and swap venue integrations.
//!
//! All three clients talk to the same REST API family and share
//! [`JupiterHttp`] for transport, authentication and error mapping. Their
//! public methods are best-effort: failures are logged and degrade to an
//! empty result (or `None`) instead of propagating.

pub mod aggregator;
pub mod lend;
pub mod price;

use std::time::Duration;

use reqwest::Client;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

pub use aggregator::QuoteAggregatorClient;
pub use lend::LendRateClient;
pub use price::PriceOracleClient;

const API_KEY_HEADER: &str = "x-api-key";

/// Errors internal to the provider clients.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider configuration invalid: {0}")]
    Config(String),

    #[error("Provider request failed: {0}")]
    Request(String),

    #[error("Provider response was invalid: {0}")]
    InvalidResponse(String),
}

/// Shared HTTP plumbing for the REST API.
#[derive(Debug, Clone)]
pub struct JupiterHttp {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

impl JupiterHttp {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            http,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("GET {path} failed: {e}")))?;

        Self::decode(path, "GET", response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let request = self.http.post(format!("{}{}", self.base_url, path)).json(body);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("POST {path} failed: {e}")))?;

        Self::decode(path, "POST", response).await
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        method: &str,
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Request(format!(
                "{method} {path} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("{method} {path} invalid JSON: {e}")))
    }
}

// =============================================================================
// Lenient number decoding
// =============================================================================

/// Amounts arrive either as JSON numbers or as decimal strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    String(String),
}

impl NumberOrString {
    fn as_u64(&self) -> Option<u64> {
        match self {
            NumberOrString::Number(n) => n.as_u64(),
            NumberOrString::String(s) => s.trim().parse().ok(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrString::Number(n) => n.as_f64(),
            NumberOrString::String(s) => s.trim().parse().ok(),
        }
    }
}

pub(crate) fn de_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    NumberOrString::deserialize(deserializer)?
        .as_u64()
        .ok_or_else(|| serde::de::Error::custom("expected an unsigned integer"))
}

pub(crate) fn de_opt_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Ok(Option::<NumberOrString>::deserialize(deserializer)?.and_then(|v| v.as_u64()))
}

pub(crate) fn de_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    NumberOrString::deserialize(deserializer)?
        .as_f64()
        .ok_or_else(|| serde::de::Error::custom("expected a number"))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Amounts {
        #[serde(deserialize_with = "de_u64")]
        a: u64,
        #[serde(default, deserialize_with = "de_opt_u64")]
        b: Option<u64>,
        #[serde(deserialize_with = "de_f64")]
        c: f64,
    }

    #[test]
    fn test_lenient_numbers() {
        let v: Amounts = serde_json::from_str(r#"{"a":"42","b":7,"c":"612.5"}"#).unwrap();
        assert_eq!((v.a, v.b, v.c), (42, Some(7), 612.5));

        let v: Amounts = serde_json::from_str(r#"{"a":1,"c":3}"#).unwrap();
        assert_eq!((v.a, v.b, v.c), (1, None, 3.0));

        assert!(serde_json::from_str::<Amounts>(r#"{"a":"x","c":1}"#).is_err());
    }
}
