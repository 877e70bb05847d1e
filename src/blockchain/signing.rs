// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet key store and transaction signing.
//!
//! The [`WalletKeyStore`] is the only holder of secret key material. It is
//! deliberately not `Clone`; sessions keep it behind an `Arc` and lend it to
//! signing calls by reference.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand_core::OsRng;
use zeroize::Zeroizing;

use super::transactions::decode_compact_u16;
use super::types::Pubkey;

/// Errors raised while loading keys or signing transactions.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),
}

/// Owns an ed25519 signing key.
pub struct WalletKeyStore {
    signing_key: SigningKey,
}

impl WalletKeyStore {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Load a keypair from an encoded secret.
    ///
    /// # Arguments
    /// * `secret` - One of:
    ///   - base58 64-byte keypair (secret ‖ public); the public half must match
    ///   - base58 32-byte seed
    ///   - JSON byte array of 64 or 32 bytes (CLI key-file format)
    ///
    /// # Returns
    /// * `Ok(WalletKeyStore)` - The loaded key
    /// * `Err(KeyError::InvalidKey)` - If the secret cannot be decoded
    pub fn load(secret: &str) -> Result<Self, KeyError> {
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            return Err(KeyError::InvalidKey("empty secret".to_string()));
        }

        let bytes: Zeroizing<Vec<u8>> = if trimmed.starts_with('[') {
            Zeroizing::new(
                serde_json::from_str::<Vec<u8>>(trimmed)
                    .map_err(|e| KeyError::InvalidKey(format!("invalid key file: {e}")))?,
            )
        } else {
            Zeroizing::new(
                bs58::decode(trimmed)
                    .into_vec()
                    .map_err(|e| KeyError::InvalidKey(format!("invalid base58: {e}")))?,
            )
        };

        Self::from_bytes(&bytes)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        match bytes.len() {
            64 => {
                let mut keypair = Zeroizing::new([0u8; 64]);
                keypair.copy_from_slice(bytes);
                let signing_key = SigningKey::from_keypair_bytes(&keypair)
                    .map_err(|_| KeyError::InvalidKey("public key does not match secret".into()))?;
                Ok(Self { signing_key })
            }
            32 => {
                let mut seed = Zeroizing::new([0u8; 32]);
                seed.copy_from_slice(bytes);
                Ok(Self {
                    signing_key: SigningKey::from_bytes(&seed),
                })
            }
            n => Err(KeyError::InvalidKey(format!(
                "expected 32 or 64 key bytes, got {n}"
            ))),
        }
    }

    /// The wallet address.
    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new(self.verifying_key().to_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Export the secret as a base58 64-byte keypair.
    pub fn export(&self) -> Zeroizing<String> {
        let keypair = Zeroizing::new(self.signing_key.to_keypair_bytes());
        Zeroizing::new(bs58::encode(keypair.as_slice()).into_string())
    }

    /// Sign raw message bytes.
    pub fn sign_message(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Sign a serialized transaction, legacy or versioned.
    ///
    /// Layout:
    /// - legacy: `[sig count (compact-u16)] [sig slots] [message]`
    /// - versioned: the message starts with a `0x80 | version` prefix byte
    ///
    /// Our signature is written into the first slot (the fee payer). Other
    /// slots are left untouched.
    pub fn sign(&self, tx_bytes: &[u8]) -> Result<Vec<u8>, KeyError> {
        if tx_bytes.is_empty() {
            return Err(KeyError::MalformedTransaction("empty transaction".into()));
        }

        let (num_sigs, header_len) = decode_compact_u16(tx_bytes)
            .map_err(|e| KeyError::MalformedTransaction(e.to_string()))?;
        if num_sigs == 0 {
            return Err(KeyError::MalformedTransaction(
                "transaction requires no signatures".into(),
            ));
        }

        let sigs_end = header_len + usize::from(num_sigs) * 64;
        if sigs_end >= tx_bytes.len() {
            return Err(KeyError::MalformedTransaction(format!(
                "need {} bytes for {} signature slots, have {}",
                sigs_end,
                num_sigs,
                tx_bytes.len()
            )));
        }

        let message = &tx_bytes[sigs_end..];
        let signer_offset = message_fee_payer_offset(message)?;
        if message.len() < signer_offset + 32 {
            return Err(KeyError::MalformedTransaction("truncated account keys".into()));
        }
        if message[signer_offset..signer_offset + 32] != self.verifying_key().to_bytes() {
            return Err(KeyError::MalformedTransaction(
                "fee payer is not this wallet".into(),
            ));
        }

        let signature = self.sign_message(message);
        let mut signed = tx_bytes.to_vec();
        signed[header_len..header_len + 64].copy_from_slice(&signature);

        tracing::debug!(
            versioned = message[0] & 0x80 != 0,
            signatures = num_sigs,
            message_len = message.len(),
            "Transaction signed"
        );

        Ok(signed)
    }
}

impl std::fmt::Debug for WalletKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletKeyStore")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

/// Offset of the first account key inside a message.
fn message_fee_payer_offset(message: &[u8]) -> Result<usize, KeyError> {
    // versioned messages carry one prefix byte before the 3-byte header
    let prefix = usize::from(message[0] & 0x80 != 0);
    let header_end = prefix + 3;
    if message.len() <= header_end {
        return Err(KeyError::MalformedTransaction("truncated message header".into()));
    }
    let (_, len_bytes) = decode_compact_u16(&message[header_end..])
        .map_err(|e| KeyError::MalformedTransaction(e.to_string()))?;
    Ok(header_end + len_bytes)
}
