//! AES-256-CBC encryption
//!
//! Every call to `encrypt` draws a new 16-byte IV; the IV travels with the
//! ciphertext in the returned `CipherEnvelope`. Padding is PKCS#7, so the
//! ciphertext length is always a non-zero multiple of the block size.
//!
//! CBC gives confidentiality only. Callers that need integrity must add it
//! on top.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::cipher::{SymmetricCipher, AES_256_KEY_SIZE, AES_BLOCK_SIZE};
use super::{random_bytes, CipherEnvelope, SensitiveBuffer};
use crate::error::{KeywardError, Result};
use crate::keys::DataProtectionKey;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES-256-CBC cipher bound to one data key - key bytes zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct AesCbcCipher {
    key: [u8; AES_256_KEY_SIZE],
}

impl AesCbcCipher {
    /// Bind a cipher to the raw bytes of an unwrapped data key
    pub fn new(key: &DataProtectionKey) -> Result<Self> {
        if key.is_released() {
            return Err(KeywardError::invalid("key", "key has been released"));
        }
        Self::from_slice(key.as_bytes())
    }

    /// Bind a cipher to raw key bytes (must be exactly 32 bytes)
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != AES_256_KEY_SIZE {
            return Err(KeywardError::InvalidArgument(format!(
                "Invalid key length: expected {}, got {}",
                AES_256_KEY_SIZE,
                slice.len()
            )));
        }
        let mut key = [0u8; AES_256_KEY_SIZE];
        key.copy_from_slice(slice);
        Ok(Self { key })
    }
}

impl SymmetricCipher for AesCbcCipher {
    fn encrypt(&self, buffer: &SensitiveBuffer) -> Result<CipherEnvelope> {
        if buffer.is_empty() || buffer.is_released() {
            return Err(KeywardError::invalid("buffer", "nothing to encrypt"));
        }

        let iv = self.generate_iv();
        let encryptor = Aes256CbcEnc::new_from_slices(&self.key, &iv)
            .map_err(|e| KeywardError::EncryptionError(e.to_string()))?;
        let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(buffer.as_bytes());

        debug!("Encrypted {} bytes into {}", buffer.len(), ciphertext.len());
        CipherEnvelope::new(ciphertext, iv)
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

        let decryptor = Aes256CbcDec::new_from_slices(&self.key, envelope.iv())
            .map_err(|e| KeywardError::DecryptionError(e.to_string()))?;
        // Decrypt in place on a copy that is wiped on every exit path
        let mut buffer = Zeroizing::new(envelope.ciphertext().to_vec());
        let plaintext = decryptor
            .decrypt_padded_mut::<Pkcs7>(&mut buffer)
            .map_err(|e| KeywardError::DecryptionError(e.to_string()))?;

        SensitiveBuffer::from_slice(plaintext).map_err(|_| {
            KeywardError::DecryptionError("Ciphertext decrypted to an empty buffer".to_string())
        })
    }

    fn generate_key(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(random_bytes(AES_256_KEY_SIZE))
    }

    fn generate_iv(&self) -> Vec<u8> {
        random_bytes(AES_BLOCK_SIZE)
    }

    fn name(&self) -> &'static str {
        "AES-256-CBC"
    }
}

impl std::fmt::Debug for AesCbcCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesCbcCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: [u8; 5] = [0x68, 0x65, 0x6C, 0x6C, 0x6F];

    fn test_cipher() -> AesCbcCipher {
        let key = DataProtectionKey::new(vec![0x42; 32], "test-identifier").unwrap();
        AesCbcCipher::new(&key).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_hello() {
        let cipher = test_cipher();
        let buffer = SensitiveBuffer::from_slice(&HELLO).unwrap();

        let envelope = cipher.encrypt(&buffer).unwrap();
        assert_eq!(envelope.iv().len(), 16);
        assert!(!envelope.ciphertext().is_empty());
        assert_eq!(envelope.ciphertext().len() % 16, 0);

        let decrypted = cipher.decrypt(&envelope).unwrap();
        assert_eq!(decrypted.as_bytes(), &HELLO);
    }

    #[test]
    fn test_roundtrip_with_generated_key() {
        let key = DataProtectionKey::create("round-trip").unwrap();
        let cipher = AesCbcCipher::new(&key).unwrap();

        for len in [1usize, 15, 16, 17, 255, 4096] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let buffer = SensitiveBuffer::new(plaintext.clone()).unwrap();

            let envelope = cipher.encrypt(&buffer).unwrap();
            let decrypted = cipher.decrypt(&envelope).unwrap();

            assert_eq!(decrypted.as_bytes(), plaintext.as_slice());
        }
    }

    #[test]
    fn test_fresh_iv_per_encryption() {
        let cipher = test_cipher();
        let buffer = SensitiveBuffer::from_slice(b"same plaintext").unwrap();

        let first = cipher.encrypt(&buffer).unwrap();
        let second = cipher.encrypt(&buffer).unwrap();

        assert_ne!(first.iv(), second.iv());
        assert_ne!(first.ciphertext(), second.ciphertext());
    }

    #[test]
    fn test_decrypt_uses_envelope_iv() {
        let cipher = test_cipher();
        let buffer = SensitiveBuffer::from_slice(b"iv carried in envelope").unwrap();
        let first = cipher.encrypt(&buffer).unwrap();
        // A later encryption must not disturb decryption of an earlier envelope
        let _second = cipher.encrypt(&buffer).unwrap();

        let decrypted = cipher.decrypt(&first).unwrap();
        assert_eq!(decrypted.as_bytes(), b"iv carried in envelope");
    }

    #[test]
    fn test_new_cipher_same_key_decrypts() {
        let key = DataProtectionKey::create("shared").unwrap();
        let envelope = AesCbcCipher::new(&key)
            .unwrap()
            .encrypt(&SensitiveBuffer::from_slice(b"portable").unwrap())
            .unwrap();

        let decrypted = AesCbcCipher::new(&key).unwrap().decrypt(&envelope).unwrap();
        assert_eq!(decrypted.as_bytes(), b"portable");
    }

    #[test]
    fn test_wrong_key_does_not_reproduce_plaintext() {
        let envelope = test_cipher()
            .encrypt(&SensitiveBuffer::from_slice(b"secret data!").unwrap())
            .unwrap();
        let other = AesCbcCipher::from_slice(&[0x24; 32]).unwrap();

        match other.decrypt(&envelope) {
            Ok(plaintext) => assert_ne!(plaintext.as_bytes(), b"secret data!"),
            Err(e) => assert!(matches!(e, KeywardError::DecryptionError(_))),
        }
    }

    #[test]
    fn test_tampered_padding_is_decryption_error() {
        let cipher = test_cipher();
        let envelope = cipher
            .encrypt(&SensitiveBuffer::from_slice(b"exactly16bytes!!").unwrap())
            .unwrap();
        assert_eq!(envelope.ciphertext().len(), 32);

        // Flipping the last byte of the first block turns the 0x10 pad byte into 0x11
        let mut ciphertext = envelope.ciphertext().to_vec();
        ciphertext[15] ^= 0x01;
        let tampered = CipherEnvelope::new(ciphertext, envelope.iv().to_vec()).unwrap();

        assert!(matches!(
            cipher.decrypt(&tampered),
            Err(KeywardError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_encrypt_rejects_released_buffer() {
        let cipher = test_cipher();
        let mut buffer = SensitiveBuffer::from_slice(b"gone").unwrap();
        buffer.release();

        assert!(matches!(
            cipher.encrypt(&buffer),
            Err(KeywardError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_decrypt_rejects_bad_iv_length() {
        let cipher = test_cipher();
        let envelope = CipherEnvelope::new(vec![0; 16], vec![1]).unwrap();
        assert!(matches!(
            cipher.decrypt(&envelope),
            Err(KeywardError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_decrypt_rejects_partial_block() {
        let cipher = test_cipher();
        let envelope = CipherEnvelope::new(vec![0; 15], vec![0; 16]).unwrap();
        assert!(matches!(
            cipher.decrypt(&envelope),
            Err(KeywardError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(AesCbcCipher::from_slice(&[0u8; 16]).is_err());
        let short = DataProtectionKey::new(vec![1; 31], "short").unwrap();
        assert!(AesCbcCipher::new(&short).is_err());
    }

    #[test]
    fn test_generated_material_sizes() {
        let cipher = test_cipher();
        assert_eq!(cipher.generate_key().len(), 32);
        assert_eq!(cipher.generate_iv().len(), 16);
        assert_ne!(cipher.generate_iv(), cipher.generate_iv());
    }

    #[test]
    fn test_envelope_text_roundtrip_decrypts() {
        let cipher = test_cipher();
        let envelope = cipher
            .encrypt(&SensitiveBuffer::from_slice(b"stored as text").unwrap())
            .unwrap();

        let parsed = CipherEnvelope::from_string(&envelope.to_string()).unwrap();
        let decrypted = cipher.decrypt(&parsed).unwrap();
        assert_eq!(decrypted.as_bytes(), b"stored as text");
    }
}
