//! Tubeshelf Authentication
//!
//! This crate holds the security-sensitive core of Tubeshelf: scrypt
//! credential storage, constant-time credential verification, and
//! HS512-signed bearer tokens carrying identity and role claims.
//!
//! Nothing in here knows about HTTP. Callers map [`AuthError`] onto
//! whatever denial their transport needs.

pub mod bootstrap;
pub mod credential;
pub mod error;
pub mod kdf;
pub mod service;
pub mod store;
pub mod token;
pub mod verifier;

pub use bootstrap::{ADMIN_ROLE, bootstrap_admin};
pub use credential::{
    CredentialRecord, MAX_NAME_LENGTH, MAX_SECRET_LENGTH, MAX_USERNAME_LENGTH, NewCredential,
    validate_name, validate_secret, validate_username,
};
pub use error::AuthError;
pub use kdf::{HASH_LEN, SALT_LEN, derive};
pub use service::AuthService;
pub use store::CredentialStore;
pub use token::{
    AuthConfig, Claims, IdentityContext, Token, TokenAuthenticator, TokenIssuer, bearer_token,
};
pub use verifier::verify;
