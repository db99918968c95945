//! Asymmetric key wrapping
//!
//! Wrapped format: `{ephemeral_public(32)}{nonce(12)}{ciphertext || tag(16)}`
//!
//! Wrapping performs an ephemeral X25519 exchange against the recipient's
//! public key, stretches the shared secret with HKDF-SHA256 and seals the
//! payload with AES-256-GCM. The pair's identifier is bound as AAD, so a
//! blob wrapped for one pair fails to open under any other.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::crypto::random_array;
use crate::error::{KeywardError, Result};

/// X25519 key size in bytes
pub const X25519_KEY_SIZE: usize = 32;

const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const WRAP_INFO: &[u8] = b"keyward-key-wrap-v1";

/// Bytes of SHA-256(public key) kept in the identifier
const IDENTIFIER_BYTES: usize = 20;

/// Trait for asymmetric key pairs that protect data keys at rest
pub trait WrappingKeyPair: Send + Sync {
    /// Normalized identifier of this key pair
    fn identifier(&self) -> &str;

    /// Wrap bytes with the public half
    fn wrap_key(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Unwrap bytes with the private half
    fn unwrap_key(&self, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>>;
}

/// Normalize an identifier for comparison: spaces removed, ASCII lowercase
pub fn normalize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// X25519 key pair holding its private half
pub struct X25519KeyPair {
    secret: StaticSecret,
    public: PublicKey,
    identifier: String,
}

impl X25519KeyPair {
    /// Generate a new key pair from the OS CSPRNG
    pub fn generate() -> Self {
        Self::from_secret_bytes(random_array::<X25519_KEY_SIZE>())
    }

    /// Rebuild a key pair from its 32 private bytes
    pub fn from_secret_bytes(bytes: [u8; X25519_KEY_SIZE]) -> Self {
        let secret = StaticSecret::from(bytes);
        let public = PublicKey::from(&secret);
        let identifier = fingerprint(&public);
        Self {
            secret,
            public,
            identifier,
        }
    }

    /// Create from a slice (must be exactly 32 bytes)
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let bytes: [u8; X25519_KEY_SIZE] = slice.try_into().map_err(|_| {
            KeywardError::InvalidArgument(format!(
                "Invalid private key length: expected {}, got {}",
                X25519_KEY_SIZE,
                slice.len()
            ))
        })?;
        Ok(Self::from_secret_bytes(bytes))
    }

    /// Private key bytes, for export to a platform key store
    pub fn secret_bytes(&self) -> Zeroizing<[u8; X25519_KEY_SIZE]> {
        Zeroizing::new(self.secret.to_bytes())
    }

    pub fn public_bytes(&self) -> [u8; X25519_KEY_SIZE] {
        self.public.to_bytes()
    }

    fn derive_wrap_key(
        shared: &[u8],
        ephemeral_public: &[u8],
        recipient_public: &[u8],
    ) -> Result<Zeroizing<[u8; 32]>> {
        let mut salt = Vec::with_capacity(2 * X25519_KEY_SIZE);
        salt.extend_from_slice(ephemeral_public);
        salt.extend_from_slice(recipient_public);

        let hkdf = Hkdf::<Sha256>::new(Some(&salt), shared);
        let mut key = Zeroizing::new([0u8; 32]);
        hkdf.expand(WRAP_INFO, &mut key[..])
            .map_err(|e| KeywardError::EncryptionError(format!("HKDF expand failed: {}", e)))?;
        Ok(key)
    }
}

impl WrappingKeyPair for X25519KeyPair {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn wrap_key(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        if plaintext.is_empty() {
            return Err(KeywardError::invalid("plaintext", "nothing to wrap"));
        }

        let ephemeral = EphemeralSecret::random_from_rng(OsRng);
        let ephemeral_public = PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&self.public);

        let wrap_key = Self::derive_wrap_key(
            shared.as_bytes(),
            ephemeral_public.as_bytes(),
            self.public.as_bytes(),
        )?;
        let cipher = Aes256Gcm::new_from_slice(&wrap_key[..])
            .map_err(|e| KeywardError::EncryptionError(e.to_string()))?;

        let nonce_bytes = random_array::<NONCE_SIZE>();
        let sealed = cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: self.identifier.as_bytes(),
                },
            )
            .map_err(|e| KeywardError::EncryptionError(e.to_string()))?;

        let mut wrapped = Vec::with_capacity(X25519_KEY_SIZE + NONCE_SIZE + sealed.len());
        wrapped.extend_from_slice(ephemeral_public.as_bytes());
        wrapped.extend_from_slice(&nonce_bytes);
        wrapped.extend_from_slice(&sealed);
        Ok(wrapped)
    }

    fn unwrap_key(&self, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if wrapped.len() < X25519_KEY_SIZE + NONCE_SIZE + TAG_SIZE {
            return Err(KeywardError::DataCorruption(format!(
                "Wrapped key too short: {} bytes",
                wrapped.len()
            )));
        }

        let (ephemeral_bytes, rest) = wrapped.split_at(X25519_KEY_SIZE);
        let (nonce_bytes, sealed) = rest.split_at(NONCE_SIZE);

        let mut ephemeral = [0u8; X25519_KEY_SIZE];
        ephemeral.copy_from_slice(ephemeral_bytes);
        let ephemeral_public = PublicKey::from(ephemeral);
        let shared = self.secret.diffie_hellman(&ephemeral_public);

        let wrap_key = Self::derive_wrap_key(
            shared.as_bytes(),
            ephemeral_public.as_bytes(),
            self.public.as_bytes(),
        )?;
        let cipher = Aes256Gcm::new_from_slice(&wrap_key[..])
            .map_err(|e| KeywardError::DecryptionError(e.to_string()))?;

        cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: sealed,
                    aad: self.identifier.as_bytes(),
                },
            )
            .map(Zeroizing::new)
            .map_err(|e| KeywardError::DecryptionError(e.to_string()))
    }
}

impl std::fmt::Debug for X25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X25519KeyPair")
            .field("identifier", &self.identifier)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Thumbprint-style identifier: lowercase hex of the first 20 bytes of SHA-256(public)
fn fingerprint(public: &PublicKey) -> String {
    let digest = Sha256::digest(public.as_bytes());
    hex::encode(&digest[..IDENTIFIER_BYTES])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let pair = X25519KeyPair::generate();
        let key = [0x5a; 32];

        let wrapped = pair.wrap_key(&key).unwrap();
        assert_ne!(&wrapped[..], &key[..]);
        assert_eq!(wrapped.len(), 32 + 12 + 32 + 16);

        let unwrapped = pair.unwrap_key(&wrapped).unwrap();
        assert_eq!(unwrapped.as_slice(), &key);
    }

    #[test]
    fn test_wrap_is_randomized() {
        let pair = X25519KeyPair::generate();
        assert_ne!(pair.wrap_key(b"same").unwrap(), pair.wrap_key(b"same").unwrap());
    }

    #[test]
    fn test_other_pair_cannot_unwrap() {
        let pair = X25519KeyPair::generate();
        let other = X25519KeyPair::generate();
        let wrapped = pair.wrap_key(b"data key").unwrap();

        assert!(matches!(
            other.unwrap_key(&wrapped),
            Err(KeywardError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_tampered_blob_fails() {
        let pair = X25519KeyPair::generate();
        let mut wrapped = pair.wrap_key(b"data key").unwrap();
        let last = wrapped.len() - 1;
        wrapped[last] ^= 0xff;
        assert!(pair.unwrap_key(&wrapped).is_err());
    }

    #[test]
    fn test_short_blob_is_corruption() {
        let pair = X25519KeyPair::generate();
        assert!(matches!(
            pair.unwrap_key(&[0u8; 10]),
            Err(KeywardError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_identifier_is_stable_for_secret() {
        let pair = X25519KeyPair::generate();
        let restored = X25519KeyPair::from_slice(&pair.secret_bytes()[..]).unwrap();

        assert_eq!(pair.identifier(), restored.identifier());
        assert_eq!(pair.identifier().len(), 40);
        assert_eq!(pair.public_bytes(), restored.public_bytes());

        let wrapped = pair.wrap_key(b"portable").unwrap();
        assert_eq!(restored.unwrap_key(&wrapped).unwrap().as_slice(), b"portable");
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("AB cd EF"), "abcdef");
        assert_eq!(normalize_identifier(" a1 B2 "), "a1b2");
    }

    #[test]
    fn test_from_invalid_slice() {
        assert!(X25519KeyPair::from_slice(&[1u8; 16]).is_err());
    }
}
