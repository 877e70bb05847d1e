// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Portfolio snapshot repository.
//!
//! Holds the last merged balance list so a restarted session can publish
//! views before its first network round-trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{LocalStorage, StorageError, StorageResult};
use crate::tokens::{registry, TokenBalance};

/// One persisted balance, keyed by mint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBalance {
    pub mint: String,
    pub amount: f64,
}

/// File format of `snapshot.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSnapshot {
    /// Wallet address the balances belong to
    pub owner: String,
    pub saved_at: DateTime<Utc>,
    pub balances: Vec<StoredBalance>,
}

/// Repository for the durable portfolio snapshot.
pub struct SnapshotRepository<'a> {
    storage: &'a LocalStorage,
}

impl<'a> SnapshotRepository<'a> {
    pub fn new(storage: &'a LocalStorage) -> Self {
        Self { storage }
    }

    /// Persist `balances` for `owner`.
    pub fn save(&self, owner: &str, balances: &[TokenBalance]) -> StorageResult<()> {
        let snapshot = StoredSnapshot {
            owner: owner.to_string(),
            saved_at: Utc::now(),
            balances: balances
                .iter()
                .map(|b| StoredBalance {
                    mint: b.token.mint.to_string(),
                    amount: b.amount,
                })
                .collect(),
        };
        self.storage
            .write_json(self.storage.paths().snapshot(), &snapshot)
    }

    /// Load the snapshot for `owner`.
    ///
    /// Returns an empty list when nothing is stored or the snapshot belongs
    /// to another wallet. Entries whose mint is no longer registered are
    /// dropped.
    pub fn load(&self, owner: &str) -> StorageResult<Vec<TokenBalance>> {
        let snapshot: StoredSnapshot = match self.storage.read_json(self.storage.paths().snapshot()) {
            Ok(snapshot) => snapshot,
            Err(StorageError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        if snapshot.owner != owner {
            return Ok(Vec::new());
        }

        Ok(snapshot
            .balances
            .into_iter()
            .filter_map(|b| registry::by_mint(&b.mint).map(|token| TokenBalance::new(token, b.amount)))
            .collect())
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.storage.delete(self.storage.paths().snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use crate::tokens::registry::{SOL, USDC};
    use std::env;
    use std::fs;

    fn test_storage() -> LocalStorage {
        let test_dir = env::temp_dir().join(format!("test-snapshot-repo-{}", uuid::Uuid::new_v4()));
        let mut storage = LocalStorage::new(StoragePaths::new(&test_dir));
        storage.initialize().expect("Failed to initialize");
        storage
    }

    fn cleanup(storage: &LocalStorage) {
        let _ = fs::remove_dir_all(storage.paths().root());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let storage = test_storage();
        let repo = SnapshotRepository::new(&storage);
        let balances = vec![TokenBalance::new(&SOL, 2.0), TokenBalance::new(&USDC, 10.5)];

        repo.save("owner-a", &balances).unwrap();
        assert_eq!(repo.load("owner-a").unwrap(), balances);
        cleanup(&storage);
    }

    #[test]
    fn missing_or_foreign_snapshot_is_empty() {
        let storage = test_storage();
        let repo = SnapshotRepository::new(&storage);
        assert!(repo.load("owner-a").unwrap().is_empty());

        repo.save("owner-a", &[TokenBalance::new(&SOL, 1.0)]).unwrap();
        assert!(repo.load("owner-b").unwrap().is_empty());

        repo.clear().unwrap();
        assert!(repo.load("owner-a").unwrap().is_empty());
        cleanup(&storage);
    }

    #[test]
    fn unregistered_mints_are_dropped() {
        let storage = test_storage();
        let snapshot = StoredSnapshot {
            owner: "owner-a".to_string(),
            saved_at: Utc::now(),
            balances: vec![
                StoredBalance {
                    mint: "Delisted111111111111111111111111111111111111".to_string(),
                    amount: 5.0,
                },
                StoredBalance {
                    mint: USDC.mint.to_string(),
                    amount: 3.0,
                },
            ],
        };
        storage.write_json(storage.paths().snapshot(), &snapshot).unwrap();

        let loaded = SnapshotRepository::new(&storage).load("owner-a").unwrap();
        assert_eq!(loaded, vec![TokenBalance::new(&USDC, 3.0)]);
        cleanup(&storage);
    }
}
