// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Secret slot repository.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/wallet/
//!   secret          # base58 keypair, mode 0600
//! ```
//!
//! Absence of the slot means the wallet is logged out.

use zeroize::Zeroizing;

use super::super::{LocalStorage, StorageError, StorageResult};

/// Repository for the single wallet secret.
pub struct SecretRepository<'a> {
    storage: &'a LocalStorage,
}

impl<'a> SecretRepository<'a> {
    pub fn new(storage: &'a LocalStorage) -> Self {
        Self { storage }
    }

    pub fn exists(&self) -> bool {
        self.storage.exists(self.storage.paths().secret())
    }

    /// Read the stored secret, `None` when logged out.
    pub fn load(&self) -> StorageResult<Option<Zeroizing<String>>> {
        match self.storage.read_raw(self.storage.paths().secret()) {
            Ok(bytes) => {
                let bytes = Zeroizing::new(bytes);
                let secret = std::str::from_utf8(&bytes)
                    .map_err(|_| StorageError::Corrupted("secret is not UTF-8".to_string()))?;
                Ok(Some(Zeroizing::new(secret.trim().to_string())))
            }
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, secret: &str) -> StorageResult<()> {
        self.storage
            .write_private(self.storage.paths().secret(), secret.as_bytes())
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.storage.delete(self.storage.paths().secret())
    }
}
