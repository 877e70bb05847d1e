// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the local storage layout.

use std::path::{Path, PathBuf};

/// Default base directory for all persistent state.
pub const DATA_ROOT: &str = "./data";

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Wallet Paths ==========

    /// Directory holding the secret slot.
    pub fn wallet_dir(&self) -> PathBuf {
        self.root.join("wallet")
    }

    /// The single secret slot.
    pub fn secret(&self) -> PathBuf {
        self.wallet_dir().join("secret")
    }

    // ========== Portfolio Paths ==========

    /// Directory holding cached portfolio state.
    pub fn portfolio_dir(&self) -> PathBuf {
        self.root.join("portfolio")
    }

    /// Last merged balance list.
    pub fn snapshot(&self) -> PathBuf {
        self.portfolio_dir().join("snapshot.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted() {
        let paths = StoragePaths::new("/tmp/solace");
        assert_eq!(paths.secret(), PathBuf::from("/tmp/solace/wallet/secret"));
        assert_eq!(
            paths.snapshot(),
            PathBuf::from("/tmp/solace/portfolio/snapshot.json")
        );
        assert_eq!(StoragePaths::default().root(), Path::new(DATA_ROOT));
    }
}
