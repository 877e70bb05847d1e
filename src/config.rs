// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the daemon. Configuration is loaded from the environment
//! once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the secret slot and snapshot | `./data` |
//! | `HOST` | Control API bind address | `127.0.0.1` |
//! | `PORT` | Control API bind port | `8787` |
//! | `SOLANA_RPC_URL` | JSON-RPC endpoint | `https://mainnet.helius-rpc.com/` |
//! | `SOLANA_RPC_API_KEY` | Appended as `api-key` query parameter | Optional |
//! | `JUPITER_API_URL` | Aggregator, price and lend REST base | `https://api.jup.ag` |
//! | `JUPITER_API_KEY` | Sent as `x-api-key` header | Optional |
//! | `SYNC_INTERVAL_SECS` | Portfolio poll interval | `15` |
//! | `QUOTE_INTERVAL_SECS` | Quote poll interval | `15` |
//! | `HTTP_TIMEOUT_SECS` | Timeout of every outbound HTTP request | `30` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::blockchain::NetworkConfig;
use crate::logging::LogFormat;
use crate::storage::paths::DATA_ROOT;

/// Root directory of local storage.
///
/// Holds `wallet/secret` (mode 0600) and `portfolio/snapshot.json`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// JSON-RPC endpoint of the Solana node.
pub const SOLANA_RPC_URL_ENV: &str = "SOLANA_RPC_URL";
pub const SOLANA_RPC_API_KEY_ENV: &str = "SOLANA_RPC_API_KEY";

/// Base URL shared by the aggregator, price and lend APIs.
pub const JUPITER_API_URL_ENV: &str = "JUPITER_API_URL";
pub const JUPITER_API_KEY_ENV: &str = "JUPITER_API_KEY";

pub const SYNC_INTERVAL_ENV: &str = "SYNC_INTERVAL_SECS";
pub const QUOTE_INTERVAL_ENV: &str = "QUOTE_INTERVAL_SECS";
pub const HTTP_TIMEOUT_ENV: &str = "HTTP_TIMEOUT_SECS";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_SOLANA_RPC_URL: &str = "https://mainnet.helius-rpc.com/";
pub const DEFAULT_JUPITER_API_URL: &str = "https://api.jup.ag";
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_QUOTE_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Errors that make the configuration unusable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid bind address {0}")]
    BindAddress(String),

    #[error("Invalid URL in {var}: {reason}")]
    Url { var: &'static str, reason: String },
}

/// Daemon settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub network: NetworkConfig,
    pub jupiter_api_url: String,
    pub jupiter_api_key: Option<String>,
    pub sync_interval: Duration,
    pub quote_interval: Duration,
    pub http_timeout: Duration,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through `lookup`, which returns the value of a variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&lookup, PORT_ENV, DEFAULT_PORT);
        let bind_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::BindAddress(format!("{host}:{port}")))?;

        let rpc_url = var(SOLANA_RPC_URL_ENV).unwrap_or_else(|| DEFAULT_SOLANA_RPC_URL.to_string());
        let network = NetworkConfig::mainnet(&rpc_url, var(SOLANA_RPC_API_KEY_ENV).as_deref())
            .map_err(|e| ConfigError::Url {
                var: SOLANA_RPC_URL_ENV,
                reason: e.to_string(),
            })?;

        let jupiter_api_url =
            var(JUPITER_API_URL_ENV).unwrap_or_else(|| DEFAULT_JUPITER_API_URL.to_string());
        url::Url::parse(&jupiter_api_url).map_err(|e| ConfigError::Url {
            var: JUPITER_API_URL_ENV,
            reason: e.to_string(),
        })?;

        Ok(Self {
            data_dir: var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DATA_ROOT)),
            bind_addr,
            network,
            jupiter_api_url,
            jupiter_api_key: var(JUPITER_API_KEY_ENV),
            sync_interval: Duration::from_secs(parse_or(
                &lookup,
                SYNC_INTERVAL_ENV,
                DEFAULT_SYNC_INTERVAL_SECS,
            )),
            quote_interval: Duration::from_secs(parse_or(
                &lookup,
                QUOTE_INTERVAL_ENV,
                DEFAULT_QUOTE_INTERVAL_SECS,
            )),
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                HTTP_TIMEOUT_ENV,
                DEFAULT_HTTP_TIMEOUT_SECS,
            )),
            log_format: LogFormat::parse(var(LOG_FORMAT_ENV).as_deref()),
        })
    }
}

/// Parse a numeric variable, falling back to `default` with a warning.
fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match lookup(name) {
        None => default,
        Some(raw) if raw.trim().is_empty() => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(var = name, value = %raw, default = %default, "Unparseable value; using default");
                default
            }
        },
    }
}
