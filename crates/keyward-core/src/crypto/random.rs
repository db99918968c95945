//! CSPRNG helpers shared by key generation, IV generation and salting

use rand::rngs::OsRng;
use rand::{Rng, RngCore};

use crate::error::{KeywardError, Result};

/// Fill a fresh buffer of `len` bytes from the operating system CSPRNG
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Fill a fixed-size array from the operating system CSPRNG
pub fn random_array<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Largest salt length accepted for either bound
pub const MAX_SALT_BYTES: usize = 1024;

pub(crate) fn check_salt_bounds(min_bytes: usize, max_bytes: usize) -> Result<()> {
    if min_bytes == 0 {
        return Err(KeywardError::invalid("min_salt_bytes", "must be greater than zero"));
    }
    if max_bytes == 0 {
        return Err(KeywardError::invalid("max_salt_bytes", "must be greater than zero"));
    }
    if min_bytes > max_bytes {
        return Err(KeywardError::invalid(
            "min_salt_bytes",
            "must not exceed max_salt_bytes",
        ));
    }
    if max_bytes > MAX_SALT_BYTES {
        return Err(KeywardError::out_of_range(
            "max_salt_bytes",
            &format!("must not exceed {}", MAX_SALT_BYTES),
        ));
    }
    Ok(())
}

/// Generate a salt whose length is drawn uniformly from `min_bytes..=max_bytes`.
///
/// Every byte of the salt is non-zero; zero bytes are redrawn.
pub fn random_salt(min_bytes: usize, max_bytes: usize) -> Result<Vec<u8>> {
    check_salt_bounds(min_bytes, max_bytes)?;

    let len = OsRng.gen_range(min_bytes..=max_bytes);
    let mut salt = random_bytes(len);
    for byte in salt.iter_mut() {
        while *byte == 0 {
            *byte = OsRng.gen();
        }
    }
    Ok(salt)
}
