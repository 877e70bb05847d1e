// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::blockchain::NetworkConfig;
use crate::session::WalletSession;
use crate::storage::LocalStorage;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<WalletSession>,
    pub storage: Arc<LocalStorage>,
    /// Used to build explorer links for submitted transactions
    pub network: Arc<NetworkConfig>,
}

impl AppState {
    pub fn new(
        session: Arc<WalletSession>,
        storage: Arc<LocalStorage>,
        network: NetworkConfig,
    ) -> Self {
        Self {
            session,
            storage,
            network: Arc::new(network),
        }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }
}
