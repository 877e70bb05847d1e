// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Local Storage Module
//!
//! Durable state of the wallet daemon, kept as plain files under
//! `DATA_DIR`.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   wallet/
//!     secret          # Encoded keypair (NEVER exposed via API)
//!   portfolio/
//!     snapshot.json   # Last merged balances
//! ```
//!
//! Writes are atomic (temp file + rename).

pub mod local_fs;
pub mod paths;
pub mod repository;

pub use local_fs::{LocalStorage, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{SecretRepository, SnapshotRepository, StoredBalance};
