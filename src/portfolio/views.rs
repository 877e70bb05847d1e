// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Category-partitioned balance views.
//!
//! Views are immutable once published. Every change, including the swap
//! patch, builds a new value that replaces the old one wholesale.

use std::collections::BTreeMap;

use crate::providers::aggregator::SwapEvent;
use crate::tokens::{registry, TokenBalance, TokenCategory};

/// The three published partitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceViews {
    pub normal: Vec<TokenBalance>,
    pub xstock: Vec<TokenBalance>,
    pub lend: Vec<TokenBalance>,
}

impl BalanceViews {
    /// Merge raw balances into partitions.
    ///
    /// Balances of the same mint are summed. Each partition follows
    /// registry order. Unregistered mints cannot occur here since a
    /// [`TokenBalance`] always references a registered descriptor.
    pub fn merge(balances: &[TokenBalance]) -> Self {
        let mut summed: BTreeMap<usize, TokenBalance> = BTreeMap::new();
        for balance in balances {
            summed
                .entry(registry::position(balance.token.mint))
                .and_modify(|b| b.amount += balance.amount)
                .or_insert(*balance);
        }

        let mut views = Self::default();
        for balance in summed.into_values() {
            views.partition_mut(balance.token.category).push(balance);
        }
        views
    }

    pub fn partition(&self, category: TokenCategory) -> &[TokenBalance] {
        match category {
            TokenCategory::Normal => &self.normal,
            TokenCategory::Xstock => &self.xstock,
            TokenCategory::Lend => &self.lend,
        }
    }

    fn partition_mut(&mut self, category: TokenCategory) -> &mut Vec<TokenBalance> {
        match category {
            TokenCategory::Normal => &mut self.normal,
            TokenCategory::Xstock => &mut self.xstock,
            TokenCategory::Lend => &mut self.lend,
        }
    }

    /// All balances, partition by partition.
    pub fn iter(&self) -> impl Iterator<Item = &TokenBalance> {
        self.normal.iter().chain(&self.xstock).chain(&self.lend)
    }

    pub fn to_list(&self) -> Vec<TokenBalance> {
        self.iter().copied().collect()
    }

    pub fn find(&self, mint: &str) -> Option<&TokenBalance> {
        self.iter().find(|b| b.token.mint == mint)
    }

    pub fn is_empty(&self) -> bool {
        self.normal.is_empty() && self.xstock.is_empty() && self.lend.is_empty()
    }

    /// Views with a settled swap applied.
    ///
    /// Subtracts `input_amount / 10^decimals_in` from the input balance and
    /// adds `output_amount / 10^decimals_out` to the output balance. Returns
    /// `None`, leaving the caller's views untouched, unless both balances
    /// are present.
    pub fn with_swap_applied(&self, event: &SwapEvent) -> Option<Self> {
        let input = self.find(&event.input_mint)?.token;
        let output = self.find(&event.output_mint)?.token;
        let delta_in = input.to_ui(event.input_amount);
        let delta_out = output.to_ui(event.output_amount);

        let mut next = self.clone();
        for balance in next
            .normal
            .iter_mut()
            .chain(next.xstock.iter_mut())
            .chain(next.lend.iter_mut())
        {
            if balance.token.mint == input.mint {
                balance.amount -= delta_in;
            }
            if balance.token.mint == output.mint {
                balance.amount += delta_out;
            }
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::registry::{by_symbol, SOL, USDC};

    fn event(input: &str, raw_in: u64, output: &str, raw_out: u64) -> SwapEvent {
        SwapEvent {
            input_mint: input.to_string(),
            input_amount: raw_in,
            output_mint: output.to_string(),
            output_amount: raw_out,
        }
    }

    #[test]
    fn merge_partitions_in_registry_order() {
        let spy = by_symbol("SPYx").unwrap();
        let jl = by_symbol("jlUSDC").unwrap();
        let views = BalanceViews::merge(&[
            TokenBalance::new(jl, 4.0),
            TokenBalance::new(&USDC, 10.5),
            TokenBalance::new(spy, 0.25),
            TokenBalance::new(&SOL, 2.0),
        ]);

        assert_eq!(
            views.normal,
            vec![TokenBalance::new(&SOL, 2.0), TokenBalance::new(&USDC, 10.5)]
        );
        assert_eq!(views.xstock, vec![TokenBalance::new(spy, 0.25)]);
        assert_eq!(views.lend, vec![TokenBalance::new(jl, 4.0)]);
    }

    #[test]
    fn merge_sums_duplicate_accounts_and_keeps_zero() {
        let views = BalanceViews::merge(&[
            TokenBalance::new(&USDC, 1.5),
            TokenBalance::new(&USDC, 2.0),
            TokenBalance::new(&SOL, 0.0),
        ]);
        assert_eq!(
            views.normal,
            vec![TokenBalance::new(&SOL, 0.0), TokenBalance::new(&USDC, 3.5)]
        );
    }

    #[test]
    fn swap_patch_applies_exact_delta() {
        let views = BalanceViews::merge(&[TokenBalance::new(&SOL, 2.0), TokenBalance::new(&USDC, 10.5)]);
        let patched = views
            .with_swap_applied(&event(USDC.mint, 5_000_000, SOL.mint, 33_000_000))
            .unwrap();

        assert_eq!(patched.find(USDC.mint).unwrap().amount, 5.5);
        assert_eq!(patched.find(SOL.mint).unwrap().amount, 2.0 + 0.033);
        // source views are untouched
        assert_eq!(views.find(USDC.mint).unwrap().amount, 10.5);
    }

    #[test]
    fn swap_patch_requires_both_balances() {
        let views = BalanceViews::merge(&[TokenBalance::new(&USDC, 10.5)]);
        let spy = by_symbol("SPYx").unwrap();
        assert!(views
            .with_swap_applied(&event(USDC.mint, 1_000_000, spy.mint, 1))
            .is_none());
        assert!(views
            .with_swap_applied(&event("unknown", 1, USDC.mint, 1))
            .is_none());
    }
}
