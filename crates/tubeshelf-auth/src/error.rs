//! Authentication error types

use thiserror::Error;

/// Errors raised by the authentication core
///
/// `VerificationFailed` and `Invalid` are the only denials a caller should
/// ever surface to a client, and their messages carry no detail about which
/// check failed. `InvalidInput` reports a malformed identity, name or secret
/// before any lookup happens.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Credential decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Key derivation error: {0}")]
    Derivation(String),

    #[error("Authentication denied")]
    VerificationFailed,

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Access denied")]
    Invalid,

    #[error("Invalid credential input: {0}")]
    InvalidInput(String),

    #[error("Credential store error: {0}")]
    Store(#[from] tubeshelf_db::DbError),
}

impl AuthError {
    /// Whether this error is an ordinary denial rather than a server fault
    pub fn is_denial(&self) -> bool {
        matches!(self, AuthError::VerificationFailed | AuthError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denials_carry_no_detail() {
        assert_eq!(AuthError::VerificationFailed.to_string(), "Authentication denied");
        assert_eq!(AuthError::Invalid.to_string(), "Access denied");
        assert!(AuthError::VerificationFailed.is_denial());
        assert!(AuthError::Invalid.is_denial());
        assert!(!AuthError::Signing("missing key".to_string()).is_denial());
        assert!(!AuthError::InvalidInput("empty username".to_string()).is_denial());
    }
}
