//! Secret encryption using AES-256-GCM
//!
//! Secrets are encrypted at rest with a process-wide 256-bit key and a unique
//! random nonce per secret. The nonce is prefixed to the sealed payload so a
//! ciphertext is a single self-contained blob:
//!
//! ```text
//! [ 12-byte nonce | ciphertext | 16-byte auth tag ]
//! ```
//!
//! ## Key resolution
//!
//! The key is loaded once at startup from `SEALBOX_MASTER_KEY` (base64-encoded
//! 32 bytes). When the variable is unset a fresh random key is generated;
//! secrets encrypted under a generated key are unrecoverable after restart.

use crate::config::CryptoConfig;
use crate::errors::{Error, Result};
use base64::Engine;
use ring::aead::{self, Aad, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Size of AES-256-GCM nonce in bytes
const NONCE_SIZE: usize = 12;

/// Size of AES-256-GCM tag in bytes
const TAG_SIZE: usize = 16;

/// Single-use nonce sequence for AES-GCM
struct SingleNonce {
    nonce: Option<[u8; NONCE_SIZE]>,
}

impl SingleNonce {
    fn new(nonce_bytes: [u8; NONCE_SIZE]) -> Self {
        Self { nonce: Some(nonce_bytes) }
    }
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> std::result::Result<Nonce, ring::error::Unspecified> {
        self.nonce.take().map(Nonce::assume_unique_for_key).ok_or(ring::error::Unspecified)
    }
}

/// Symmetric cipher for secret payloads
///
/// Pure transform over byte slices; holds no references to storage. Cloneable
/// so the same process-wide key can be shared across tasks.
#[derive(Clone)]
pub struct SecretCipher {
    key_bytes: Arc<[u8; 32]>,
    rng: Arc<SystemRandom>,
}

impl SecretCipher {
    /// Create a cipher from configuration, generating a key when none is given
    pub fn from_config(config: &CryptoConfig) -> Result<Self> {
        match &config.master_key_base64 {
            Some(encoded) => {
                let key_bytes =
                    base64::engine::general_purpose::STANDARD.decode(encoded).map_err(|e| {
                        Error::config(format!("Invalid base64 in SEALBOX_MASTER_KEY: {}", e))
                    })?;

                if key_bytes.len() != 32 {
                    return Err(Error::config(format!(
                        "SEALBOX_MASTER_KEY must be 32 bytes (256 bits), got {} bytes",
                        key_bytes.len()
                    )));
                }

                let mut key_array = [0u8; 32];
                key_array.copy_from_slice(&key_bytes);

                debug!("Secret cipher initialized from configured master key");
                Ok(Self::from_key(key_array))
            }
            None => {
                let rng = SystemRandom::new();
                let mut key_array = [0u8; 32];
                rng.fill(&mut key_array)
                    .map_err(|_| Error::internal("Failed to generate master key"))?;

                warn!(
                    "SEALBOX_MASTER_KEY not set; generated an ephemeral key. \
                     Stored secrets will be unreadable after restart. \
                     Generate a persistent key with: openssl rand -base64 32"
                );
                Ok(Self { key_bytes: Arc::new(key_array), rng: Arc::new(rng) })
            }
        }
    }

    /// Create a cipher from raw key bytes
    pub fn from_key(key: [u8; 32]) -> Self {
        Self { key_bytes: Arc::new(key), rng: Arc::new(SystemRandom::new()) }
    }

    /// Encrypt a plaintext payload
    ///
    /// Returns the nonce-prefixed ciphertext with the authentication tag
    /// appended.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        self.rng.fill(&mut nonce_bytes).map_err(|_| {
            error!("Failed to generate random nonce");
            Error::internal("Failed to generate random nonce for encryption")
        })?;

        let unbound_key = UnboundKey::new(&AES_256_GCM, &*self.key_bytes)
            .map_err(|_| Error::internal("Failed to create encryption key"))?;

        let nonce_sequence = SingleNonce::new(nonce_bytes);
        let mut sealing_key = aead::SealingKey::new(unbound_key, nonce_sequence);

        let mut output = Vec::with_capacity(NONCE_SIZE + plaintext.len() + TAG_SIZE);
        output.extend_from_slice(&nonce_bytes);

        let mut in_out = plaintext.to_vec();
        sealing_key.seal_in_place_append_tag(Aad::empty(), &mut in_out).map_err(|_| {
            error!("Encryption failed");
            Error::internal("Failed to encrypt secret payload")
        })?;
        output.extend_from_slice(&in_out);

        Ok(output)
    }

    /// Decrypt a nonce-prefixed ciphertext
    ///
    /// Fails with [`Error::Crypto`] when the blob is too short to carry a
    /// nonce and tag, or when integrity verification fails.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(Error::crypto(format!(
                "Ciphertext too short: {} bytes, need at least {}",
                data.len(),
                NONCE_SIZE + TAG_SIZE
            )));
        }

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(&data[..NONCE_SIZE]);

        let unbound_key = UnboundKey::new(&AES_256_GCM, &*self.key_bytes)
            .map_err(|_| Error::internal("Failed to create decryption key"))?;

        let nonce_sequence = SingleNonce::new(nonce_bytes);
        let mut opening_key = aead::OpeningKey::new(unbound_key, nonce_sequence);

        let mut in_out = data[NONCE_SIZE..].to_vec();
        let plaintext = opening_key.open_in_place(Aad::empty(), &mut in_out).map_err(|_| {
            error!("Decryption failed, ciphertext tampered or wrong key");
            Error::crypto("Ciphertext failed integrity verification")
        })?;

        Ok(plaintext.to_vec())
    }
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher").field("key_bytes", &"[REDACTED]").finish()
    }
}
