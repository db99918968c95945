//! Symmetric cipher trait definitions

use zeroize::Zeroizing;

use super::{CipherEnvelope, SensitiveBuffer};
use crate::error::Result;

/// AES-256 key size in bytes
pub const AES_256_KEY_SIZE: usize = 32;

/// AES block size in bytes, which is also the CBC IV size
pub const AES_BLOCK_SIZE: usize = 16;

/// Trait for block-cipher backends bound to a single data key
///
/// An implementation is constructed with its key and keeps it for its whole
/// lifetime; switching keys means building a new cipher.
pub trait SymmetricCipher: Send + Sync {
    /// Encrypt a cleartext buffer under a fresh IV
    fn encrypt(&self, buffer: &SensitiveBuffer) -> Result<CipherEnvelope>;

    /// Decrypt an envelope using the IV it carries
    fn decrypt(&self, envelope: &CipherEnvelope) -> Result<SensitiveBuffer>;

    /// Mint new key material of the size this algorithm expects.
    ///
    /// Does not touch the key the cipher is bound to.
    fn generate_key(&self) -> Zeroizing<Vec<u8>>;

    /// Mint a new IV of the size this algorithm expects
    fn generate_iv(&self) -> Vec<u8>;

    /// Get a human-readable name for this cipher backend
    fn name(&self) -> &'static str;
}
