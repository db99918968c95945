//! Secure memory handling with automatic zeroization
//!
//! `SensitiveBuffer` holds cleartext and `CipherEnvelope` holds ciphertext
//! plus the IV needed to decrypt it. Both wipe their bytes when dropped and
//! expose `release()` to wipe them earlier.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{KeywardError, Result};

/// Cleartext bytes - automatically zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SensitiveBuffer {
    data: Vec<u8>,
    released: bool,
}

impl SensitiveBuffer {
    /// Take ownership of a non-empty byte vector
    pub fn new(data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(KeywardError::invalid("data", "buffer must not be empty"));
        }
        Ok(Self {
            data,
            released: false,
        })
    }

    /// Copy a non-empty slice into a new buffer
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Self::new(data.to_vec())
    }

    /// Get the cleartext bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a live buffer
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Overwrite the owned bytes with zeros now, keeping the length
    pub fn release(&mut self) {
        self.data.as_mut_slice().zeroize();
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl std::fmt::Debug for SensitiveBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensitiveBuffer")
            .field("len", &self.data.len())
            .field("data", &"[REDACTED]")
            .finish()
    }
}

/// Ciphertext and the IV it was produced with - automatically zeroed when dropped
///
/// The envelope does not know which cipher produced it, so it only rejects
/// empty parts. Each `SymmetricCipher` checks the IV size on decrypt.
///
/// Text format: `{iv_hex}:{ciphertext_hex}`
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct CipherEnvelope {
    ciphertext: Vec<u8>,
    iv: Vec<u8>,
    released: bool,
}

impl CipherEnvelope {
    /// Build an envelope; both parts must be non-empty
    pub fn new(ciphertext: Vec<u8>, iv: Vec<u8>) -> Result<Self> {
        if ciphertext.is_empty() {
            return Err(KeywardError::invalid("ciphertext", "must not be empty"));
        }
        if iv.is_empty() {
            return Err(KeywardError::invalid("iv", "must not be empty"));
        }
        Ok(Self {
            ciphertext,
            iv,
            released: false,
        })
    }

    /// Parse from the format: `{iv_hex}:{ciphertext_hex}`
    pub fn from_string(s: &str) -> Result<Self> {
        let (iv_hex, ciphertext_hex) = s.split_once(':').ok_or_else(|| {
            KeywardError::invalid("envelope", "expected iv:ciphertext")
        })?;

        let iv = hex::decode(iv_hex)
            .map_err(|e| KeywardError::InvalidArgument(format!("Invalid IV hex: {}", e)))?;
        let ciphertext = hex::decode(ciphertext_hex).map_err(|e| {
            KeywardError::InvalidArgument(format!("Invalid ciphertext hex: {}", e))
        })?;

        Self::new(ciphertext, iv)
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Overwrite ciphertext and IV with zeros now, keeping their lengths
    pub fn release(&mut self) {
        self.ciphertext.as_mut_slice().zeroize();
        self.iv.as_mut_slice().zeroize();
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl std::fmt::Display for CipherEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}",
            hex::encode(&self.iv),
            hex::encode(&self.ciphertext)
        )
    }
}

impl std::fmt::Debug for CipherEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherEnvelope")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("iv_len", &self.iv.len())
            .finish()
    }
}

/// Compare two byte slices without short-circuiting on the first difference
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_rejects_empty() {
        assert!(matches!(
            SensitiveBuffer::new(Vec::new()),
            Err(KeywardError::InvalidArgument(_))
        ));
        assert!(SensitiveBuffer::from_slice(&[]).is_err());
    }

    #[test]
    fn test_buffer_release_zeroes_in_place() {
        let mut buffer = SensitiveBuffer::from_slice(b"hello").unwrap();
        assert_eq!(buffer.as_bytes(), b"hello");

        buffer.release();

        assert!(buffer.is_released());
        assert_eq!(buffer.len(), 5);
        assert!(buffer.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_envelope_rejects_empty_parts() {
        assert!(CipherEnvelope::new(Vec::new(), vec![1; 16]).is_err());
        assert!(CipherEnvelope::new(vec![1; 16], Vec::new()).is_err());
        assert!(CipherEnvelope::new(vec![1; 16], vec![2; 16]).is_ok());
    }

    #[test]
    fn test_envelope_release_zeroes_both_parts() {
        let mut envelope = CipherEnvelope::new(vec![0xAB; 32], vec![0xCD; 16]).unwrap();

        envelope.release();

        assert!(envelope.is_released());
        assert!(envelope.ciphertext().iter().all(|b| *b == 0));
        assert!(envelope.iv().iter().all(|b| *b == 0));
        assert_eq!(envelope.iv().len(), 16);
    }

    #[test]
    fn test_envelope_text_form() {
        let envelope = CipherEnvelope::new(vec![0x01, 0x02], vec![0xff]).unwrap();
        assert_eq!(envelope.to_string(), "ff:0102");

        let parsed = CipherEnvelope::from_string("ff:0102").unwrap();
        assert_eq!(parsed.iv(), &[0xff]);
        assert_eq!(parsed.ciphertext(), &[0x01, 0x02]);
    }

    #[test]
    fn test_envelope_invalid_text() {
        assert!(CipherEnvelope::from_string("no-separator").is_err());
        assert!(CipherEnvelope::from_string("zz:0102").is_err());
        assert!(CipherEnvelope::from_string(":0102").is_err());
    }

    #[test]
    fn test_debug_redacted() {
        let buffer = SensitiveBuffer::from_slice(b"top-secret").unwrap();
        let debug = format!("{:?}", buffer);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("top-secret"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
