//! Inert cipher for wiring and integration tests
//!
//! Reverses the byte order of the input. It is reversible and satisfies the
//! `SymmetricCipher` contract, but provides no confidentiality at all.

use tracing::warn;
use zeroize::Zeroizing;

use super::cipher::{SymmetricCipher, AES_256_KEY_SIZE, AES_BLOCK_SIZE};
use super::{random_bytes, CipherEnvelope, SensitiveBuffer};
use crate::error::{KeywardError, Result};

/// No-op cipher - NOT secure
#[derive(Debug, Default, Clone, Copy)]
pub struct InertCipher;

impl InertCipher {
    pub fn new() -> Self {
        warn!("InertCipher in use - payloads are not encrypted");
        Self
    }

    fn reversed(bytes: &[u8]) -> Vec<u8> {
        bytes.iter().rev().copied().collect()
    }
}

impl SymmetricCipher for InertCipher {
    fn encrypt(&self, buffer: &SensitiveBuffer) -> Result<CipherEnvelope> {
        if buffer.is_empty() || buffer.is_released() {
            return Err(KeywardError::invalid("buffer", "nothing to encrypt"));
        }
        CipherEnvelope::new(Self::reversed(buffer.as_bytes()), self.generate_iv())
    }

    fn decrypt(&self, envelope: &CipherEnvelope) -> Result<SensitiveBuffer> {
        if envelope.ciphertext().is_empty() || envelope.is_released() {
            return Err(KeywardError::invalid("envelope", "nothing to decrypt"));
        }
        if envelope.iv().len() != AES_BLOCK_SIZE {
            return Err(KeywardError::InvalidArgument(format!(
                "Invalid IV length: expected {}, got {}",
                AES_BLOCK_SIZE,
                envelope.iv().len()
            )));
        }
        SensitiveBuffer::new(Self::reversed(envelope.ciphertext()))
    }

    fn generate_key(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(random_bytes(AES_256_KEY_SIZE))
    }

    fn generate_iv(&self) -> Vec<u8> {
        random_bytes(AES_BLOCK_SIZE)
    }

    fn name(&self) -> &'static str {
        "Inert (no encryption)"
    }
}
