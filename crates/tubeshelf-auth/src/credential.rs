//! Credential records and credential creation

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;
use rand::rngs::OsRng;
use tubeshelf_db::{NewUser, User};

use crate::error::AuthError;
use crate::kdf::{self, HASH_LEN, SALT_LEN};

/// Stored credential as seen by the verifier
///
/// `salt` and `hash` stay in their base64 storage encoding; the verifier
/// decodes them itself so that a corrupt row fails closed.
#[derive(Clone)]
pub struct CredentialRecord {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub salt: String,
    pub hash: String,
    pub role: String,
}

impl CredentialRecord {
    /// Stand-in record verified when the identity is unknown, so a miss
    /// costs the same derivation as a wrong password.
    pub(crate) fn decoy() -> Self {
        Self {
            id: 0,
            username: String::new(),
            name: String::new(),
            salt: STANDARD.encode([0x5au8; SALT_LEN]),
            hash: STANDARD.encode([0u8; HASH_LEN]),
            role: String::new(),
        }
    }
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("name", &self.name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl From<User> for CredentialRecord {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            salt: user.salt,
            hash: user.password_hash,
            role: user.role,
        }
    }
}

/// Maximum username length in bytes
pub const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum display name length in characters
pub const MAX_NAME_LENGTH: usize = 128;
/// Maximum secret length in bytes; longer input is not worth deriving
pub const MAX_SECRET_LENGTH: usize = 256;

/// Validate username format and length
///
/// Applied on creation and on login, so every stored identity can log in.
pub fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::InvalidInput("Username cannot be empty".to_string()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    // Only allow alphanumeric characters, underscores, and hyphens
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(AuthError::InvalidInput(
            "Username can only contain alphanumeric characters, underscores, and hyphens"
                .to_string(),
        ));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), AuthError> {
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "Name exceeds maximum length of {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_secret(secret: &str) -> Result<(), AuthError> {
    if secret.len() > MAX_SECRET_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "Password exceeds maximum length of {} characters",
            MAX_SECRET_LENGTH
        )));
    }
    Ok(())
}

/// Creation request after untrusted fields have been dropped
///
/// Only the identity, display name and plaintext secret survive; salt, hash
/// and role are always produced here, never taken from the caller.
#[derive(Clone)]
pub struct NewCredential {
    pub username: String,
    pub name: String,
    secret: String,
}

impl NewCredential {
    /// Build a validated creation request
    pub fn new(
        username: impl Into<String>,
        name: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let credential = Self {
            username: username.into(),
            name: name.into(),
            secret: secret.into(),
        };

        validate_username(&credential.username)?;
        validate_name(&credential.name)?;
        validate_secret(&credential.secret)?;

        Ok(credential)
    }

    /// Generate a fresh salt, derive the hash and produce the row to persist.
    ///
    /// The plaintext secret is consumed here and does not reach the row.
    pub fn seal(self) -> Result<NewUser, AuthError> {
        self.seal_with_role("")
    }

    pub(crate) fn seal_with_role(self, role: &str) -> Result<NewUser, AuthError> {
        let salt = generate_salt();
        let hash = kdf::derive(self.secret.as_bytes(), &salt)?;

        Ok(NewUser {
            username: self.username,
            name: self.name,
            salt: STANDARD.encode(salt),
            password_hash: STANDARD.encode(hash),
            role: role.to_string(),
        })
    }
}

impl std::fmt::Debug for NewCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewCredential")
            .field("username", &self.username)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Fill a salt from the operating system CSPRNG
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}
