//! Cryptographic primitives for data protection
//!
//! This module provides:
//! - AES-256-CBC encryption behind the `SymmetricCipher` trait
//! - An inert cipher for wiring tests
//! - Salted SHA-512 password hashing
//! - Secure memory handling with zeroize

mod aes_cbc;
mod cipher;
mod inert;
mod password;
mod random;
mod secure_memory;

pub use aes_cbc::AesCbcCipher;
pub use cipher::{SymmetricCipher, AES_256_KEY_SIZE, AES_BLOCK_SIZE};
pub use inert::InertCipher;
pub use password::{
    PasswordHasher, PasswordRecord, DEFAULT_MAX_SALT_BYTES, DEFAULT_MIN_SALT_BYTES,
};
pub use random::{random_array, random_bytes, random_salt, MAX_SALT_BYTES};
pub use secure_memory::{constant_time_eq, CipherEnvelope, SensitiveBuffer};
