// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction building for Solana.
//!
//! This module provides legacy message compilation, the compact-u16 wire
//! encoding, associated token account derivation and builders for the
//! instructions the wallet issues (token transfers, native transfers and
//! associated account creation).

use sha2::{Digest, Sha256};

use super::client::ChainError;
use super::types::{Pubkey, ASSOCIATED_TOKEN_PROGRAM, SYSTEM_PROGRAM};

/// `TransferChecked` instruction tag in both token programs.
const TRANSFER_CHECKED_TAG: u8 = 12;

/// `Transfer` instruction index in the system program.
const SYSTEM_TRANSFER_TAG: u32 = 2;

// =============================================================================
// Compact-u16
// =============================================================================

/// Decode a compact-u16 value.
///
/// # Returns
/// `(value, bytes_consumed)`
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), ChainError> {
    let mut value: u32 = 0;
    for (i, byte) in data.iter().take(3).enumerate() {
        value |= u32::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return u16::try_from(value)
                .map(|v| (v, i + 1))
                .map_err(|_| ChainError::Parse("compact-u16 overflow".into()));
        }
    }
    Err(ChainError::Parse("truncated compact-u16".into()))
}

/// Encode a compact-u16 value.
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(3);
    let mut rem = value;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if rem == 0 {
            return out;
        }
    }
}

// =============================================================================
// Instructions
// =============================================================================

/// An account referenced by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn writable(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A program invocation before compilation into a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// Token-program `TransferChecked` between two token accounts.
pub fn transfer_checked(
    token_program: Pubkey,
    source: Pubkey,
    mint: Pubkey,
    destination: Pubkey,
    owner: Pubkey,
    amount: u64,
    decimals: u8,
) -> Instruction {
    let mut data = Vec::with_capacity(10);
    data.push(TRANSFER_CHECKED_TAG);
    data.extend_from_slice(&amount.to_le_bytes());
    data.push(decimals);

    Instruction {
        program_id: token_program,
        accounts: vec![
            AccountMeta::writable(source, false),
            AccountMeta::readonly(mint, false),
            AccountMeta::writable(destination, false),
            AccountMeta::readonly(owner, true),
        ],
        data,
    }
}

/// System-program lamport transfer.
pub fn system_transfer(from: Pubkey, to: Pubkey, lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_TAG.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction {
        program_id: SYSTEM_PROGRAM,
        accounts: vec![
            AccountMeta::writable(from, true),
            AccountMeta::writable(to, false),
        ],
        data,
    }
}

/// Associated-token-account `Create` for `owner` and `mint` under
/// `token_program`, paid by `payer`.
pub fn create_associated_token_account(
    payer: Pubkey,
    owner: Pubkey,
    mint: Pubkey,
    token_program: Pubkey,
) -> Result<Instruction, ChainError> {
    let ata = derive_ata(&owner, &mint, &token_program)?;
    Ok(Instruction {
        program_id: ASSOCIATED_TOKEN_PROGRAM,
        accounts: vec![
            AccountMeta::writable(payer, true),
            AccountMeta::writable(ata, false),
            AccountMeta::readonly(owner, false),
            AccountMeta::readonly(mint, false),
            AccountMeta::readonly(SYSTEM_PROGRAM, false),
            AccountMeta::readonly(token_program, false),
        ],
        data: Vec::new(),
    })
}

// =============================================================================
// Address derivation
// =============================================================================

/// Find a program-derived address for `seeds` under `program_id`.
///
/// Tries bump seeds from 255 downwards and returns the first hash that is
/// not a valid ed25519 point.
pub fn find_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Option<(Pubkey, u8)> {
    for bump in (0u8..=255).rev() {
        let mut hasher = Sha256::new();
        for seed in seeds {
            hasher.update(seed);
        }
        hasher.update([bump]);
        hasher.update(program_id.as_bytes());
        hasher.update(b"ProgramDerivedAddress");
        let hash: [u8; 32] = hasher.finalize().into();

        if ed25519_dalek::VerifyingKey::from_bytes(&hash).is_err() {
            return Some((Pubkey::new(hash), bump));
        }
    }
    None
}

/// Derive the associated token account of `owner` for `mint`.
pub fn derive_ata(owner: &Pubkey, mint: &Pubkey, token_program: &Pubkey) -> Result<Pubkey, ChainError> {
    find_program_address(
        &[owner.as_bytes(), token_program.as_bytes(), mint.as_bytes()],
        &ASSOCIATED_TOKEN_PROGRAM,
    )
    .map(|(address, _)| address)
    .ok_or_else(|| ChainError::InvalidAddress(format!("no associated account for {owner}/{mint}")))
}

// =============================================================================
// Message compilation
// =============================================================================

/// Compiled instruction referencing accounts by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

/// A legacy transaction message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: [u8; 32],
    pub instructions: Vec<CompiledInstruction>,
}

/// Compile instructions into a legacy message.
///
/// Account keys are de-duplicated with merged flags, the fee payer comes
/// first, and the rest are ordered signer-writable, signer-readonly,
/// writable, readonly. Program ids are readonly non-signers.
pub fn compile_message(payer: &Pubkey, instructions: &[Instruction], recent_blockhash: &[u8; 32]) -> Message {
    let mut metas: Vec<AccountMeta> = vec![AccountMeta::writable(*payer, true)];
    let mut merge = |meta: AccountMeta| {
        if let Some(existing) = metas.iter_mut().find(|m| m.pubkey == meta.pubkey) {
            existing.is_signer |= meta.is_signer;
            existing.is_writable |= meta.is_writable;
        } else {
            metas.push(meta);
        }
    };
    for ix in instructions {
        for meta in &ix.accounts {
            merge(*meta);
        }
        merge(AccountMeta::readonly(ix.program_id, false));
    }

    // stable sort keeps first-seen order within each class; payer stays first
    let rank = |m: &AccountMeta| match (m.is_signer, m.is_writable) {
        (true, true) => 0,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    };
    let (payer_meta, rest) = metas.split_at_mut(1);
    rest.sort_by_key(rank);
    let payer_meta = payer_meta[0];

    let ordered: Vec<AccountMeta> = std::iter::once(payer_meta).chain(rest.iter().copied()).collect();
    let account_keys: Vec<Pubkey> = ordered.iter().map(|m| m.pubkey).collect();
    let index_of = |key: &Pubkey| -> u8 {
        account_keys
            .iter()
            .position(|k| k == key)
            .map(|i| i as u8)
            .unwrap_or_default()
    };

    let compiled = instructions
        .iter()
        .map(|ix| CompiledInstruction {
            program_id_index: index_of(&ix.program_id),
            accounts: ix.accounts.iter().map(|m| index_of(&m.pubkey)).collect(),
            data: ix.data.clone(),
        })
        .collect();

    Message {
        num_required_signatures: ordered.iter().filter(|m| m.is_signer).count() as u8,
        num_readonly_signed: ordered.iter().filter(|m| m.is_signer && !m.is_writable).count() as u8,
        num_readonly_unsigned: ordered.iter().filter(|m| !m.is_signer && !m.is_writable).count() as u8,
        account_keys,
        recent_blockhash: *recent_blockhash,
        instructions: compiled,
    }
}

impl Message {
    /// Serialize the message in the legacy wire format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = vec![
            self.num_required_signatures,
            self.num_readonly_signed,
            self.num_readonly_unsigned,
        ];

        out.extend(encode_compact_u16(self.account_keys.len() as u16));
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }
        out.extend_from_slice(&self.recent_blockhash);

        out.extend(encode_compact_u16(self.instructions.len() as u16));
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            out.extend(encode_compact_u16(ix.accounts.len() as u16));
            out.extend_from_slice(&ix.accounts);
            out.extend(encode_compact_u16(ix.data.len() as u16));
            out.extend_from_slice(&ix.data);
        }
        out
    }

    /// Full transaction with zeroed signature slots, ready for signing.
    pub fn to_unsigned_transaction(&self) -> Vec<u8> {
        let message = self.serialize();
        let sigs = usize::from(self.num_required_signatures);
        let mut tx = encode_compact_u16(u16::from(self.num_required_signatures));
        tx.reserve(sigs * 64 + message.len());
        tx.resize(tx.len() + sigs * 64, 0);
        tx.extend_from_slice(&message);
        tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::{TOKEN_2022_PROGRAM, TOKEN_PROGRAM};

    fn key(byte: u8) -> Pubkey {
        Pubkey::new([byte; 32])
    }

    #[test]
    fn test_compact_u16() {
        for (value, encoded) in [
            (0u16, vec![0x00]),
            (0x7f, vec![0x7f]),
            (0x80, vec![0x80, 0x01]),
            (0x3fff, vec![0xff, 0x7f]),
            (0x4000, vec![0x80, 0x80, 0x01]),
            (0xffff, vec![0xff, 0xff, 0x03]),
        ] {
            assert_eq!(encode_compact_u16(value), encoded, "encode {value:#x}");
            assert_eq!(
                decode_compact_u16(&encoded).unwrap(),
                (value, encoded.len()),
                "decode {value:#x}"
            );
        }
        assert!(decode_compact_u16(&[]).is_err());
        assert!(decode_compact_u16(&[0x80]).is_err());
    }

    #[test]
    fn test_transfer_checked_layout() {
        let ix = transfer_checked(TOKEN_PROGRAM, key(1), key(2), key(3), key(4), 5_000_000, 6);
        assert_eq!(ix.data[0], 12);
        assert_eq!(&ix.data[1..9], &5_000_000u64.to_le_bytes());
        assert_eq!(ix.data[9], 6);
        assert_eq!(ix.accounts.len(), 4);
        assert!(ix.accounts[0].is_writable && !ix.accounts[0].is_signer);
        assert!(!ix.accounts[1].is_writable);
        assert!(ix.accounts[2].is_writable);
        assert!(ix.accounts[3].is_signer && !ix.accounts[3].is_writable);
    }

    #[test]
    fn test_system_transfer_layout() {
        let ix = system_transfer(key(1), key(2), 42);
        assert_eq!(&ix.data[..4], &[2, 0, 0, 0]);
        assert_eq!(&ix.data[4..], &42u64.to_le_bytes());
    }

    #[test]
    fn test_associated_token_account_is_off_curve() {
        let owner: Pubkey = "5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1".parse().unwrap();
        let mint: Pubkey = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".parse().unwrap();
        let first = derive_ata(&owner, &mint, &TOKEN_PROGRAM).unwrap();
        let again = derive_ata(&owner, &mint, &TOKEN_PROGRAM).unwrap();
        assert_eq!(first, again);
        assert!(ed25519_dalek::VerifyingKey::from_bytes(first.as_bytes()).is_err());

        let ext = derive_ata(&owner, &mint, &TOKEN_2022_PROGRAM).unwrap();
        assert_ne!(first, ext);
    }

    #[test]
    fn test_create_account_uses_given_program() {
        let ix = create_associated_token_account(key(1), key(1), key(2), TOKEN_2022_PROGRAM).unwrap();
        assert_eq!(ix.program_id, ASSOCIATED_TOKEN_PROGRAM);
        assert!(ix.data.is_empty());
        assert_eq!(ix.accounts[5].pubkey, TOKEN_2022_PROGRAM);
        assert_eq!(ix.accounts[4].pubkey, SYSTEM_PROGRAM);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
    }

    #[test]
    fn test_compile_orders_and_dedupes_accounts() {
        let payer = key(9);
        let ix = transfer_checked(TOKEN_PROGRAM, key(1), key(2), key(3), payer, 1, 0);
        let msg = compile_message(&payer, &[ix], &[7u8; 32]);

        // payer(s,w), source(w), dest(w), mint(r), program(r)
        assert_eq!(msg.account_keys, vec![payer, key(1), key(3), key(2), TOKEN_PROGRAM]);
        assert_eq!(msg.num_required_signatures, 1);
        assert_eq!(msg.num_readonly_signed, 0);
        assert_eq!(msg.num_readonly_unsigned, 2);
        assert_eq!(msg.instructions[0].program_id_index, 4);
        assert_eq!(msg.instructions[0].accounts, vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_unsigned_transaction_layout() {
        let payer = key(9);
        let msg = compile_message(&payer, &[system_transfer(payer, key(1), 10)], &[7u8; 32]);
        let tx = msg.to_unsigned_transaction();

        assert_eq!(tx[0], 1);
        assert!(tx[1..65].iter().all(|b| *b == 0));
        assert_eq!(&tx[65..], msg.serialize().as_slice());
        // header + key count + 3 keys + blockhash
        assert_eq!(&tx[65 + 4 + 96..65 + 4 + 128], &[7u8; 32]);
    }
}
