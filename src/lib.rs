// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Solace Wallet - Self-Custodial Solana Portfolio & Swap Daemon
//!
//! Keeps a local, category-partitioned portfolio view in sync with the
//! chain, a price feed and a lending feed, and executes swaps through an
//! external quote aggregator. The signing key stays inside the session.
//!
//! ## Modules
//!
//! - `api` - Local control API (Axum)
//! - `blockchain` - Solana JSON-RPC client, transaction building and signing
//! - `providers` - Price, lending and quote aggregator clients
//! - `portfolio` - Periodic sync engine and published balance views
//! - `swap` - Quote polling, commit and optimistic patching
//! - `session` - Wallet session owning the key and its tasks
//! - `storage` - Secret slot and portfolio snapshot on local disk
//! - `tokens` - Static token registry and valuation types

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod portfolio;
pub mod providers;
pub mod session;
pub mod state;
pub mod storage;
pub mod swap;
pub mod tokens;
