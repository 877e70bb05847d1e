// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Static asset registry.
//!
//! Registry order is the display order of every published partition.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::blockchain::types::{TOKEN_2022_PROGRAM_ID, TOKEN_PROGRAM_ID};

use super::{TokenCategory, TokenDescriptor};

const fn normal(symbol: &'static str, name: &'static str, mint: &'static str, decimals: u8) -> TokenDescriptor {
    TokenDescriptor {
        symbol,
        name,
        category: TokenCategory::Normal,
        mint,
        decimals,
        program_id: TOKEN_PROGRAM_ID,
    }
}

const fn xstock(symbol: &'static str, name: &'static str, mint: &'static str) -> TokenDescriptor {
    TokenDescriptor {
        symbol,
        name,
        category: TokenCategory::Xstock,
        mint,
        decimals: 8,
        program_id: TOKEN_2022_PROGRAM_ID,
    }
}

const fn lend(symbol: &'static str, name: &'static str, mint: &'static str) -> TokenDescriptor {
    TokenDescriptor {
        symbol,
        name,
        category: TokenCategory::Lend,
        mint,
        decimals: 6,
        program_id: TOKEN_PROGRAM_ID,
    }
}

/// Mint of the synthetic native balance.
pub const NATIVE_MINT: &str = "So11111111111111111111111111111111111111111";

pub static SOL: TokenDescriptor = normal("SOL", "Solana", NATIVE_MINT, 9);
pub static USDC: TokenDescriptor = normal("USDC", "USD Coin", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", 6);

static TOKEN_LIST: &[TokenDescriptor] = &[
    normal("SOL", "Solana", NATIVE_MINT, 9),
    // Stablecoins
    normal("EURC", "EURC", "HzwqbKZw8HxMN6bF2yFZNrht3c2iXXzpKcFu7uBEDKtr", 6),
    normal("USDC", "USD Coin", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", 6),
    normal("USDT", "USDT", "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", 6),
    normal("USDS", "USDS", "USDSwr9ApdHk5bvJKMjzff41FfuX8bSxdKcR81vTwcA", 6),
    normal("USDG", "USDG", "2u1tszSeqZ3qBWF3uNGPFc8TzMk2tdiwknnRMWGWjGWH", 6),
    // Majors
    normal("WSOL", "Solana (Wrapped)", "So11111111111111111111111111111111111111112", 9),
    normal("ETH", "Ethereum", "7vfCXTUXx5WJV5JADk17DUJ4ksgau7utNKj4b963voxs", 8),
    normal("BTC", "Bitcoin", "3NZ9JMVBmGAqocybic2c7LQCJScmgsAZ6vQqTDzcqmJh", 8),
    // xStocks
    xstock("SPYx", "S&P 500", "XsoCS1TfEyfFhfvj8EtZ528L3CaKBDBRqRapnBbDF2W"),
    xstock("QQQx", "QQQ", "Xs8S1uUs1zvS2p7iwtsG3b6fkhpvmwz4GYU3gWAmWHZ"),
    xstock("GOOGLx", "Google", "XsCPL9dNWBMvFtTmwcCA5v3xWPSMEBCszbQdiLLq6aN"),
    xstock("AAPLx", "Apple", "XsbEhLAtcf6HdfpFZ5xEMdqW8nfAvcsP5bdudRLJzJp"),
    xstock("AMZNx", "Amazon", "Xs3eBt7uRfJX8QUs4suhyU8p2M6DoUDrJyWBa8LLZsg"),
    xstock("METAx", "Meta", "Xsa62P5mvPszXL1krVUnU5ar38bBSVcWAB6fmPCo5Zu"),
    xstock("NFLXx", "Netflix", "XsEH7wWfJJu2ZT3UCFeVfALnVA6CP5ur7Ee11KmzVpL"),
    xstock("TSLAx", "Tesla", "XsDoVfqeBukxuZHWhdvWHBhgEHjGNst4MLodqsJHzoB"),
    xstock("NVDAx", "Nvidia", "Xsc9qvGR1efVDFGLrVsmkzv3qi45LTBjeUKSPmx9qEh"),
    xstock("MSFTx", "Microsoft", "XspzcW1PRtgf6Wj92HCiZdjzKCyFekVD8P5Ueh3dRMX"),
    xstock("ORCLx", "Oracle", "XsjFwUPiLofddX5cWFHW35GCbXcSu1BCUGfxoQAQjeL"),
    xstock("PLTRx", "Palantir", "XsoBhf2ufR8fTyNSjqfU71DYGaE6Z3SUGAidpzriAA4"),
    xstock("GLDx", "Gold", "Xsv9hRk1z5ystj9MhnA7Lq4vjSsLwzL2nxrwmwtD3re"),
    // Lend
    lend("jlUSDC", "Lent USDC", "9BEcn9aPEmhSPbPQeFGjidRiEKki46fVQDyPpSQXPA2D"),
    lend("jlUSDT", "Lent USDT", "Cmn4v2wipYV41dkakDvCgFJpxhtaaKt11NyWV8pjSE8A"),
    lend("jlWSOL", "Lent WSOL", "2uQsyo1fXXQkDtcpXnLofWy88PxcvnfH2L8FPSE62FVU"),
    lend("jlEURC", "Lent EURC", "GcV9tEj62VncGithz4o4N9x6HWXARxuRgEAYk9zahNA8"),
    lend("jlUSDS", "Lent USDS", "j14XLJZSVMcUYpAfajdZRpnfHUpJieZHS4aPektLWvh"),
    lend("jlUSDG", "Lent USDG", "9fvHrYNw1A8Evpcj7X2yy4k4fT7nNHcA9L6UsamNHAif"),
];

static BY_MINT: LazyLock<HashMap<&'static str, &'static TokenDescriptor>> =
    LazyLock::new(|| all().iter().map(|t| (t.mint, t)).collect());

/// Every registered token, in registry order.
pub fn all() -> &'static [TokenDescriptor] {
    TOKEN_LIST
}

/// Look up a token by mint address.
pub fn by_mint(mint: &str) -> Option<&'static TokenDescriptor> {
    BY_MINT.get(mint).copied()
}

/// Look up a token by symbol (case-insensitive).
pub fn by_symbol(symbol: &str) -> Option<&'static TokenDescriptor> {
    all().iter().find(|t| t.symbol.eq_ignore_ascii_case(symbol))
}

/// The native asset descriptor.
pub fn native() -> &'static TokenDescriptor {
    &TOKEN_LIST[0]
}

/// Registry position, used to order partitions.
pub fn position(mint: &str) -> usize {
    all().iter().position(|t| t.mint == mint).unwrap_or(usize::MAX)
}
