// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration module for Solana.
//!
//! This module provides functionality for:
//! - Holding the wallet key and signing transactions
//! - Querying native and SPL token balances over JSON-RPC
//! - Building, signing and submitting transfers and account creations

pub mod client;
pub mod signing;
pub mod transactions;
pub mod types;

pub use client::{ChainClient, ChainError, HttpTransport, RpcTransport};
pub use signing::{KeyError, WalletKeyStore};
pub use types::{NetworkConfig, Pubkey};
