//! scrypt key derivation for stored credentials

use scrypt::{Params, scrypt};

use crate::error::AuthError;

/// Salt length in bytes
pub const SALT_LEN: usize = 32;
/// Derived hash length in bytes
pub const HASH_LEN: usize = 64;

/// log2 of the scrypt work factor (N = 16384)
pub const LOG_N: u8 = 14;
/// scrypt block size (r)
pub const BLOCK_SIZE: u32 = 8;
/// scrypt parallelism (p)
pub const PARALLELISM: u32 = 1;

/// Derive a credential hash from a secret and salt.
///
/// Deterministic for a given `(secret, salt)`. Empty secrets and empty salts
/// are valid input. Expect tens of milliseconds per call in optimized builds;
/// async callers should run this on a blocking thread.
pub fn derive(secret: &[u8], salt: &[u8]) -> Result<[u8; HASH_LEN], AuthError> {
    derive_with_params(secret, salt, LOG_N, BLOCK_SIZE, PARALLELISM)
}

/// Derive with explicit scrypt cost parameters.
///
/// Fails only when the parameter combination is rejected by scrypt
/// (zero block size or parallelism, or a work factor too large for `r`).
pub fn derive_with_params(
    secret: &[u8],
    salt: &[u8],
    log_n: u8,
    block_size: u32,
    parallelism: u32,
) -> Result<[u8; HASH_LEN], AuthError> {
    let params = Params::new(log_n, block_size, parallelism, HASH_LEN)
        .map_err(|e| AuthError::Derivation(e.to_string()))?;

    let mut output = [0u8; HASH_LEN];
    scrypt(secret, salt, &params, &mut output)
        .map_err(|e| AuthError::Derivation(e.to_string()))?;

    Ok(output)
}
