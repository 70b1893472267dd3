//! Bearer token issuance and validation

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credential::CredentialRecord;
use crate::error::AuthError;

/// The only algorithm tokens are signed or accepted with
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS512;

/// `nbf` stamped on every token: 2015-10-10T12:00:00Z.
///
/// Tokens therefore never expire on their own unless a lifetime is
/// configured through [`AuthConfig::with_token_ttl`].
pub const FIXED_NOT_BEFORE: i64 = 1_444_478_400;

/// Signing configuration, built once at startup
#[derive(Clone)]
pub struct AuthConfig {
    secret: Vec<u8>,
    token_ttl_secs: Option<i64>,
}

impl AuthConfig {
    /// Create a configuration from the process-wide signing secret.
    ///
    /// An empty secret is a startup error, never silently accepted.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(AuthError::Signing("signing secret is empty".to_string()));
        }
        Ok(Self {
            secret: secret.to_vec(),
            token_ttl_secs: None,
        })
    }

    /// Stamp an `exp` claim this many seconds after issuance and require it
    /// on validation.
    pub fn with_token_ttl(mut self, secs: u32) -> Self {
        self.token_ttl_secs = Some(i64::from(secs));
        self
    }

    pub fn token_ttl_secs(&self) -> Option<i64> {
        self.token_ttl_secs
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_len", &self.secret.len())
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

/// Token claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Numeric user ID
    pub id: u64,
    /// Display name
    pub name: String,
    pub username: String,
    pub role: String,
    /// Not valid before (Unix timestamp)
    pub nbf: i64,
    /// Expiration time (Unix timestamp), only when a lifetime is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Caller identity resolved from a validated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub role: String,
}

impl From<Claims> for IdentityContext {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            name: claims.name,
            username: claims.username,
            role: claims.role,
        }
    }
}

impl TryFrom<&CredentialRecord> for IdentityContext {
    type Error = AuthError;

    fn try_from(record: &CredentialRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: u64::try_from(record.id).map_err(|_| AuthError::Invalid)?,
            name: record.name.clone(),
            username: record.username.clone(),
            role: record.role.clone(),
        })
    }
}

/// Signed token in its compact serialized form
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0.into_bytes()
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(..)")
    }
}

/// Mints signed tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    token_ttl_secs: Option<i64>,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            token_ttl_secs: config.token_ttl_secs,
        }
    }

    /// Sign a token for an identity.
    ///
    /// Issuance is silent: nothing is logged or recorded.
    pub fn issue(&self, identity: &IdentityContext) -> Result<Token, AuthError> {
        let claims = Claims {
            id: identity.id,
            name: identity.name.clone(),
            username: identity.username.clone(),
            role: identity.role.clone(),
            nbf: FIXED_NOT_BEFORE,
            exp: self
                .token_ttl_secs
                .map(|ttl| Utc::now().timestamp() + ttl),
        };

        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map(Token)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

/// Validates inbound tokens
#[derive(Clone)]
pub struct TokenAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenAuthenticator {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        // Pin the allow-list; the token header never chooses the algorithm
        validation.algorithms = vec![TOKEN_ALGORITHM];
        validation.validate_nbf = true;
        validation.validate_exp = true;
        if config.token_ttl_secs.is_some() {
            validation.set_required_spec_claims(&["exp", "nbf"]);
        } else {
            validation.set_required_spec_claims(&["nbf"]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(&config.secret),
            validation,
        }
    }

    /// Validate a token and resolve the caller's identity.
    ///
    /// Every failure collapses to [`AuthError::Invalid`].
    pub fn authenticate(&self, token: impl AsRef<[u8]>) -> Result<IdentityContext, AuthError> {
        let token = std::str::from_utf8(token.as_ref()).map_err(|_| AuthError::Invalid)?;

        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                AuthError::Invalid
            })?;

        Ok(token_data.claims.into())
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header.trim().split_once(' ').ok_or(AuthError::Invalid)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Invalid);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Invalid);
    }
    Ok(token)
}
