//! Constant-time credential verification

use base64::{Engine, engine::general_purpose::STANDARD};
use subtle::{Choice, ConstantTimeEq};
use tracing::warn;

use crate::credential::CredentialRecord;
use crate::error::AuthError;
use crate::kdf::{self, HASH_LEN, SALT_LEN};

/// Salt used when the stored one cannot be decoded, so the failure path
/// still pays for a full derivation.
const FALLBACK_SALT: [u8; SALT_LEN] = [0x5a; SALT_LEN];

/// Check a presented secret against a stored credential.
///
/// Returns `true` only on an exact hash match. Undecodable salt or hash,
/// a wrong-length salt or hash, and derivation failures all return `false`
/// after the same amount of work as a genuine mismatch. The underlying
/// [`AuthError`] is logged and never returned.
pub fn verify(record: &CredentialRecord, presented: &str) -> bool {
    let (salt, salt_ok) = match decode_salt(&record.salt) {
        Ok(salt) => (salt, Choice::from(1)),
        Err(e) => {
            warn!(user_id = record.id, error = %e, "Stored salt is malformed");
            (FALLBACK_SALT, Choice::from(0))
        }
    };

    let stored = decode_field(&record.hash).unwrap_or_else(|e| {
        warn!(user_id = record.id, error = %e, "Stored hash is malformed");
        Vec::new()
    });

    let candidate = match kdf::derive(presented.as_bytes(), &salt) {
        Ok(hash) => hash,
        Err(e) => {
            warn!(error = %e, "Key derivation failed during verification");
            return false;
        }
    };

    (hash_matches(&candidate, &stored) & salt_ok).into()
}

fn decode_field(encoded: &str) -> Result<Vec<u8>, AuthError> {
    Ok(STANDARD.decode(encoded)?)
}

fn decode_salt(encoded: &str) -> Result<[u8; SALT_LEN], AuthError> {
    let bytes = decode_field(encoded)?;
    <[u8; SALT_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
        AuthError::Derivation(format!("salt is {} bytes, expected {}", bytes.len(), SALT_LEN))
    })
}

/// Compare a derived hash with stored bytes of any length.
///
/// The stored bytes are copied into a fixed-size buffer and the length check
/// is folded into the result, so the work done never depends on the stored
/// length or on where the first differing byte sits.
pub(crate) fn hash_matches(candidate: &[u8; HASH_LEN], stored: &[u8]) -> Choice {
    let mut padded = [0u8; HASH_LEN];
    let n = stored.len().min(HASH_LEN);
    padded[..n].copy_from_slice(&stored[..n]);

    let same_len = (stored.len() as u64).ct_eq(&(HASH_LEN as u64));
    candidate[..].ct_eq(&padded[..]) & same_len
}
